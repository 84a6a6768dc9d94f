//! HTTP endpoint lookup
//!
//! `POST {player_api}?bjId={id}` with form `bid={id}&player_type=html5`
//! answers with:
//!
//! ```text
//! {"CHANNEL": {"RESULT": 1, "CHDOMAIN": "chat.example", "CHPT": "8000", "CHATNO": "42"}}
//! ```
//!
//! `RESULT` is `-6` for login-gated broadcasts and `0` when offline. The
//! socket listens on `CHPT + 1`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Endpoint, EndpointResolver};
use crate::error::ResolveError;

/// Default lookup URL; the streamer id is added as the `bjId` query parameter
pub const DEFAULT_PLAYER_API: &str = "https://live.sooplive.co.kr/afreeca/player_live_api.php";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0";

const RESULT_AUTH_REQUIRED: i64 = -6;
const RESULT_NOT_LIVE: i64 = 0;

/// Resolver backed by the public player API
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    api_url: String,
}

impl HttpResolver {
    /// Create a resolver against the public API with a 5 second timeout
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_url(DEFAULT_PLAYER_API, Duration::from_secs(5))
    }

    /// Create a resolver against a custom lookup URL
    pub fn with_url(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl EndpointResolver for HttpResolver {
    async fn resolve(&self, streamer_id: &str) -> Result<Endpoint, ResolveError> {
        let body: Value = self
            .client
            .post(&self.api_url)
            .query(&[("bjId", streamer_id)])
            .form(&[("bid", streamer_id), ("player_type", "html5")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let endpoint = parse_channel(&body)?;
        tracing::debug!(
            streamer = streamer_id,
            socket = %endpoint.socket_url,
            room = %endpoint.room_id,
            "Resolved chat endpoint"
        );
        Ok(endpoint)
    }
}

/// Interpret the `CHANNEL` object of a lookup response
pub fn parse_channel(body: &Value) -> Result<Endpoint, ResolveError> {
    let channel = body.get("CHANNEL").unwrap_or(&Value::Null);

    match channel.get("RESULT").and_then(as_int) {
        Some(RESULT_AUTH_REQUIRED) => return Err(ResolveError::AuthRequired),
        Some(RESULT_NOT_LIVE) => return Err(ResolveError::NotLive),
        _ => {}
    }

    let domain = channel
        .get("CHDOMAIN")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .ok_or(ResolveError::EndpointUnavailable)?;

    let port = channel.get("CHPT").and_then(as_int).unwrap_or(0) + 1;

    let room_id = match channel.get("CHATNO") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    Ok(Endpoint {
        socket_url: format!("wss://{}:{}/Websocket", domain, port),
        room_id,
    })
}

/// Numbers arrive either as JSON numbers or as decimal strings
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
