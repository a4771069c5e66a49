//! Data API REST client

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use url::Url;

use super::models::RawTrade;
use super::traits::{PageResponse, TradeSource};
use crate::config::FeedConfig;
use crate::error::{Error, Result};

pub struct TradesApi {
    http: HttpClient,
    url: Url,
}

impl TradesApi {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            url: config.trades_url.clone(),
        })
    }
}

#[async_trait]
impl TradeSource for TradesApi {
    async fn fetch_trades(&self, offset: u32, limit: u32) -> Result<PageResponse> {
        let resp = match self
            .http
            .get(self.url.clone())
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Ok(PageResponse::Transient(format!("request failed: {}", e)));
            }
            Err(e) => return Err(Error::Fetch(e.to_string())),
        };

        let status = resp.status();
        if is_transient(status) {
            return Ok(PageResponse::Transient(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!("HTTP {}: {}", status, body)));
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Ok(PageResponse::Transient(format!("reading body timed out: {}", e)));
            }
            Err(e) => return Err(Error::Fetch(e.to_string())),
        };

        parse_page(&body).map(PageResponse::Trades)
    }
}

/// Rate limiting and server-side errors are worth retrying; anything
/// else means the request itself is wrong.
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Parses a response body, which must be a JSON array of trade objects.
pub fn parse_page(body: &str) -> Result<Vec<RawTrade>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::Fetch(format!("response is not JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::Fetch(format!(
                "expected a JSON array of trades, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<RawTrade>(item)
                .map_err(|e| Error::Fetch(format!("trade #{} is malformed: {}", i, e)))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient(StatusCode::BAD_GATEWAY));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::NOT_FOUND));
        assert!(!is_transient(StatusCode::OK));
    }

    #[test]
    fn test_parse_page() {
        let trades = parse_page(
            r#"[{"name":"alice","proxyWallet":"0x1","eventSlug":"e","price":0.5,"size":2,"timestamp":1}]"#,
        )
        .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].name.clone().flatten().as_deref(), Some("alice"));

        assert!(parse_page("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_rejects_bad_shapes() {
        for body in [
            r#"{"error":"bad request"}"#,
            "not json",
            "[1, 2, 3]",
            r#"[{"name": 5}]"#,
        ] {
            assert!(matches!(parse_page(body), Err(Error::Fetch(_))), "{} should be rejected", body);
        }
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(TradesApi::new(&FeedConfig::default()).is_ok());
    }
}
