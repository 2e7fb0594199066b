//! Upstream failure behavior over a real socket: kline requests degrade to
//! an empty result, while account requests surface the upstream status.

use homeboard::config::ExchangeCredentials;
use homeboard::error::Error;
use homeboard::exchange::{ExchangeApi, KucoinClient, MexcClient};
use homeboard::models::{DateRange, Interval};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SERVER_ERROR: &str =
    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// Serve the given raw response to every connection, returning the base URL.
async fn spawn_stub_server(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

fn creds(base_url: String) -> ExchangeCredentials {
    ExchangeCredentials {
        api_key: "key".into(),
        api_secret: "secret".into(),
        passphrase: Some("phrase".into()),
        base_url,
    }
}

fn day_range() -> DateRange {
    DateRange::new(0, 86_400).unwrap()
}

#[tokio::test]
async fn kucoin_klines_degrade_to_empty_on_server_error() {
    let base = spawn_stub_server(SERVER_ERROR).await;
    let client = KucoinClient::new(creds(base)).unwrap();
    let klines = client
        .klines("BTC-USDT", Interval::OneHour, day_range())
        .await
        .unwrap();
    assert!(klines.is_empty());
}

#[tokio::test]
async fn mexc_klines_degrade_to_empty_on_server_error() {
    let base = spawn_stub_server(SERVER_ERROR).await;
    let client = MexcClient::new(creds(base)).unwrap();
    let klines = client
        .klines("BTCUSDT", Interval::OneHour, day_range())
        .await
        .unwrap();
    assert!(klines.is_empty());
}

#[tokio::test]
async fn mexc_klines_degrade_to_empty_on_not_found() {
    let base = spawn_stub_server(NOT_FOUND).await;
    let client = MexcClient::new(creds(base)).unwrap();
    let klines = client
        .klines("NOSUCHUSDT", Interval::OneHour, day_range())
        .await
        .unwrap();
    assert!(klines.is_empty());
}

#[tokio::test]
async fn kucoin_account_surfaces_the_upstream_status() {
    let base = spawn_stub_server(SERVER_ERROR).await;
    let client = KucoinClient::new(creds(base)).unwrap();
    assert!(matches!(
        client.account_summary().await,
        Err(Error::UpstreamUnavailable(_))
    ));
}

#[tokio::test]
async fn mexc_account_surfaces_the_upstream_status() {
    let base = spawn_stub_server(SERVER_ERROR).await;
    let client = MexcClient::new(creds(base)).unwrap();
    assert!(matches!(
        client.account_summary().await,
        Err(Error::UpstreamUnavailable(_))
    ));
}
