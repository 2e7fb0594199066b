//! End-to-end token flow: code in, token out, header verified.

use homeboard::auth::Authenticator;
use homeboard::error::Error;
use homeboard::server::token_from_header;

const OTP_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

fn authenticator() -> Authenticator {
    Authenticator::new(OTP_SECRET, "token-signing-secret").unwrap()
}

#[test]
fn issued_token_passes_the_header_check() {
    let auth = authenticator();
    let token = auth.issue_token().unwrap();
    let header = format!("Bearer {token}");
    token_from_header(&auth, Some(&header)).unwrap();
}

#[test]
fn missing_header_fails_authentication() {
    assert!(matches!(
        token_from_header(&authenticator(), None),
        Err(Error::AuthenticationFailed(_))
    ));
}

#[test]
fn non_bearer_header_fails_authentication() {
    let auth = authenticator();
    let token = auth.issue_token().unwrap();
    // Right token, wrong scheme.
    assert!(matches!(
        token_from_header(&auth, Some(&format!("Basic {token}"))),
        Err(Error::AuthenticationFailed(_))
    ));
}

#[test]
fn tampered_token_fails_authentication() {
    let auth = authenticator();
    let mut token = auth.issue_token().unwrap();
    token.push('x');
    assert!(matches!(
        token_from_header(&auth, Some(&format!("Bearer {token}"))),
        Err(Error::AuthenticationFailed(_))
    ));
}

#[test]
fn bad_otp_secret_is_a_config_error() {
    assert!(matches!(
        Authenticator::new("not base32!!", "secret"),
        Err(Error::MissingConfig(_))
    ));
}
