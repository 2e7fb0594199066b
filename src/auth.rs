//! One-time-code login and bearer tokens.
//!
//! Login exchanges a TOTP code for a short-lived signed bearer token; every
//! protected route then verifies that token. Token subjects are random per
//! login, there are no user accounts behind them.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};
use uuid::Uuid;

use crate::config::TOKEN_LIFETIME_MINUTES;
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub struct Authenticator {
    totp: TOTP,
    token_secret: String,
}

impl Authenticator {
    /// `otp_secret` is the base32 TOTP secret shared with the authenticator
    /// app; `token_secret` signs the issued bearer tokens.
    pub fn new(otp_secret: &str, token_secret: &str) -> Result<Self> {
        let secret = Secret::Encoded(otp_secret.to_string())
            .to_bytes()
            .map_err(|e| Error::MissingConfig(format!("OTP_SECRET is not base32: {e:?}")))?;
        let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, secret)
            .map_err(|e| Error::MissingConfig(format!("OTP_SECRET is unusable: {e}")))?;
        Ok(Self {
            totp,
            token_secret: token_secret.to_string(),
        })
    }

    /// Check a one-time code against the current TOTP window.
    pub fn verify_code(&self, code: &str) -> Result<bool> {
        self.totp
            .check_current(code)
            .map_err(|e| Error::AuthenticationFailed(format!("clock error: {e}")))
    }

    /// Issue a bearer token with a fresh random subject.
    pub fn issue_token(&self) -> Result<String> {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (Utc::now() + chrono::Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.token_secret.as_bytes()),
        )
        .map_err(|e| Error::AuthenticationFailed(format!("token signing failed: {e}")))
    }

    /// Verify a bearer token's signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.token_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| Error::AuthenticationFailed(format!("invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 160-bit base32 secret, the usual authenticator-app length.
    const OTP_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn authenticator() -> Authenticator {
        Authenticator::new(OTP_SECRET, "token-signing-secret").unwrap()
    }

    #[test]
    fn current_code_verifies_and_wrong_code_does_not() {
        let auth = authenticator();
        let code = auth.totp.generate_current().unwrap();
        assert!(auth.verify_code(&code).unwrap());
        assert!(!auth.verify_code("000000").unwrap() || code == "000000");
    }

    #[test]
    fn issued_tokens_verify_and_carry_a_subject() {
        let auth = authenticator();
        let token = auth.issue_token().unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert!(Uuid::parse_str(&claims.sub).is_ok());
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let auth = authenticator();
        let other = Authenticator::new(OTP_SECRET, "different-secret").unwrap();
        let token = other.issue_token().unwrap();
        assert!(matches!(
            auth.verify_token(&token),
            Err(Error::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let auth = authenticator();
        assert!(matches!(
            auth.verify_token("not.a.token"),
            Err(Error::AuthenticationFailed(_))
        ));
    }
}
