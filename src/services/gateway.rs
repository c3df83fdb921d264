//! HTTP/JSON-RPC gateway to the local daemons
//!
//! Stateless: every call builds its request, performs one attempt with its
//! own timeout and returns the decoded result. There is nothing to share
//! between calls beyond the connection pool inside the reqwest client.

use std::time::Duration;

use serde_json::{json, Value};

use crate::core::TelemetrySnapshot;
use crate::error::{ConsoleError, ConsoleResult};
use crate::traits::RpcGateway;

/// Timeout for the node's plain HTTP status endpoint.
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for wallet JSON-RPC calls, which can hit the wallet's own store.
const WALLET_TIMEOUT: Duration = Duration::from_secs(4);

/// Production gateway over HTTP against 127.0.0.1.
pub struct HttpRpcGateway {
    client: reqwest::Client,
}

impl HttpRpcGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn classify(endpoint: &str, err: reqwest::Error) -> ConsoleError {
        if err.is_decode() {
            ConsoleError::decode(endpoint, err)
        } else {
            ConsoleError::network(endpoint, err)
        }
    }
}

impl Default for HttpRpcGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RpcGateway for HttpRpcGateway {
    async fn node_status(&self, port: u16) -> ConsoleResult<TelemetrySnapshot> {
        let url = format!("http://127.0.0.1:{port}/get_info");
        let response = self
            .client
            .get(&url)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(|e| ConsoleError::network(&url, e))?;

        let body: Value = response.json().await.map_err(|e| Self::classify(&url, e))?;
        Ok(TelemetrySnapshot::from_get_info(&body))
    }

    async fn call_wallet(&self, port: u16, method: &str, params: Value) -> ConsoleResult<Value> {
        let url = format!("http://127.0.0.1:{port}/json_rpc");
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": "0",
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&url)
            .timeout(WALLET_TIMEOUT)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| ConsoleError::network(&url, e))?;

        let mut body: Value = response.json().await.map_err(|e| Self::classify(&url, e))?;

        // Some daemon builds reply with a bare object instead of a JSON-RPC
        // envelope; hand the caller whichever is there.
        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Ok(body),
        }
    }
}
