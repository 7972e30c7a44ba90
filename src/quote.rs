//! Stock quote gateway
//!
//! `QuoteGateway` is the narrow contract the engine depends on; `StooqGateway`
//! is the production implementation reading a CSV quote row over HTTP.
//! `spawn_quote` runs a lookup off the command path and posts the outcome to
//! the originating room exactly once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::{QuoteConfig, QuoteFailurePolicy};
use crate::error::QuoteError;
use crate::message::Notice;
use crate::room::RoomHandle;

/// Zero-based index of the close price in a quote row
const CLOSE_FIELD: usize = 6;

/// Latest price lookup for a ticker symbol
#[async_trait]
pub trait QuoteGateway: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Result<f64, QuoteError>;
}

/// Quote source returning `Symbol,Date,Time,Open,High,Low,Close,Volume` CSV
pub struct StooqGateway {
    client: Client,
    endpoint: String,
}

impl StooqGateway {
    pub fn new(config: &QuoteConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl QuoteGateway for StooqGateway {
    async fn fetch_quote(&self, ticker: &str) -> Result<f64, QuoteError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("s", ticker), ("f", "sd2t2ohlcv"), ("h", ""), ("e", "csv")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuoteError::UpstreamUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_close_price(&body)
    }
}

/// Extract the close price from a CSV quote body
///
/// The data row is the last non-empty line; a leading header line is ignored.
pub fn parse_close_price(body: &str) -> Result<f64, QuoteError> {
    let row = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| QuoteError::UpstreamFormat("empty response".to_string()))?;

    let field = row
        .split(',')
        .nth(CLOSE_FIELD)
        .map(str::trim)
        .ok_or_else(|| QuoteError::UpstreamFormat(format!("missing close field in '{}'", row)))?;

    field
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| QuoteError::UpstreamFormat(format!("non-numeric close '{}'", field)))
}

/// Look a ticker up in the background and post the result to `room`
pub fn spawn_quote(
    gateway: Arc<dyn QuoteGateway>,
    room: RoomHandle,
    ticker: String,
    on_failure: QuoteFailurePolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let notice = match gateway.fetch_quote(&ticker).await {
            Ok(price) => Notice::Quote {
                ticker: ticker.clone(),
                price,
            },
            Err(e) => {
                warn!("Quote lookup for {} in room {} failed: {}", ticker, room.name(), e);
                match on_failure {
                    QuoteFailurePolicy::Room => Notice::QuoteFailed {
                        ticker: ticker.clone(),
                    },
                    QuoteFailurePolicy::Log => return,
                }
            }
        };

        if let Err(e) = room.enqueue(notice, None) {
            warn!("Dropping quote for {}: {}", ticker, e);
        }
    })
}

/// Gateway returning a fixed outcome and recording every ticker requested
#[cfg(test)]
pub(crate) struct ScriptedGateway {
    price: Option<f64>,
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedGateway {
    pub fn ok(price: f64) -> Self {
        Self {
            price: Some(price),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            price: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl QuoteGateway for ScriptedGateway {
    async fn fetch_quote(&self, ticker: &str) -> Result<f64, QuoteError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.price
            .ok_or_else(|| QuoteError::UpstreamUnavailable("scripted failure".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;
    use crate::connection::{Connection, Outbound};
    use crate::room::Room;
    use crate::types::ConnectionId;

    #[test]
    fn test_parse_row_with_header() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\r\n\
                    AAPL.US,2024-05-03,22:00:08,186.65,187,182.66,183.38,163224109\r\n";
        assert_eq!(parse_close_price(body).unwrap(), 183.38);
    }

    #[test]
    fn test_parse_bare_row() {
        let body = "AAPL.US,2024-05-03,22:00:08,186.65,187,182.66,123.45,1";
        assert_eq!(parse_close_price(body).unwrap(), 123.45);
    }

    #[test]
    fn test_unknown_ticker_is_format_error() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    NOPE.US,N/D,N/D,N/D,N/D,N/D,N/D,N/D\n";
        assert!(matches!(
            parse_close_price(body),
            Err(QuoteError::UpstreamFormat(_))
        ));
    }

    #[test]
    fn test_short_row_is_format_error() {
        assert!(matches!(
            parse_close_price("AAPL.US,2024-05-03"),
            Err(QuoteError::UpstreamFormat(_))
        ));
        assert!(matches!(
            parse_close_price(""),
            Err(QuoteError::UpstreamFormat(_))
        ));
    }

    fn listener(room: &RoomHandle) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(8);
        room.join(Connection::new(ConnectionId::new(), "alice", tx))
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn test_spawn_quote_posts_result() {
        let room = Room::spawn("market");
        let mut rx = listener(&room);
        let gateway = Arc::new(ScriptedGateway::ok(123.45));

        spawn_quote(gateway.clone(), room, "AAPL".to_string(), QuoteFailurePolicy::Room)
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Outbound::Text("AAPL quote is $123.45 per share".to_string()))
        );
        assert_eq!(gateway.calls(), vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn test_spawn_quote_failure_notice() {
        let room = Room::spawn("market");
        let mut rx = listener(&room);

        spawn_quote(
            Arc::new(ScriptedGateway::failing()),
            room.clone(),
            "AAPL".to_string(),
            QuoteFailurePolicy::Room,
        )
        .await
        .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Outbound::Text("Unable to fetch quote for AAPL".to_string()))
        );

        // The room keeps working
        room.enqueue("still here", None).unwrap();
        assert_eq!(
            rx.recv().await,
            Some(Outbound::Text("still here".to_string()))
        );
    }

    #[tokio::test]
    async fn test_spawn_quote_failure_log_only() {
        let room = Room::spawn("market");
        let mut rx = listener(&room);

        spawn_quote(
            Arc::new(ScriptedGateway::failing()),
            room.clone(),
            "AAPL".to_string(),
            QuoteFailurePolicy::Log,
        )
        .await
        .unwrap();

        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_spawn_quote_into_deleted_room_completes() {
        let room = Room::spawn("market");
        let mut rx = listener(&room);
        room.terminate();

        spawn_quote(
            Arc::new(ScriptedGateway::ok(10.0)),
            room.clone(),
            "AAPL".to_string(),
            QuoteFailurePolicy::Room,
        )
        .await
        .unwrap();

        let received = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(!matches!(received, Ok(Some(Outbound::Text(_)))));
    }
}
