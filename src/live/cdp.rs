// src/live/cdp.rs
//
// Minimal Chrome DevTools Protocol client: one websocket, sequential
// id-matched request/response, protocol events skipped. dinopilot's tick
// loop is strictly sequential, so there is no need for an out-of-band
// message pump.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Wrap a future with a timeout, returning an anyhow error on expiration.
async fn with_timeout<T>(
    duration: Duration,
    label: &str,
    fut: impl std::future::Future<Output = T>,
) -> Result<T> {
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| anyhow!("CDP {label} timed out after {duration:?}"))
}

pub struct CdpClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    call_timeout: Duration,
}

impl CdpClient {
    /// Connect to a target's websocket debugger URL.
    pub async fn connect(ws_url: &str, call_timeout: Duration) -> Result<Self> {
        let (ws, _response) = with_timeout(call_timeout, "connect", connect_async(ws_url))
            .await?
            .with_context(|| format!("websocket connect to {ws_url}"))?;
        Ok(Self {
            ws,
            next_id: 0,
            call_timeout,
        })
    }

    /// Issue one protocol call and wait for its response, skipping any
    /// interleaved protocol events.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let request = json!({ "id": id, "method": method, "params": params });
        with_timeout(self.call_timeout, method, self.ws.send(Message::Text(request.to_string())))
            .await?
            .with_context(|| format!("sending {method}"))?;

        loop {
            let message = with_timeout(self.call_timeout, method, self.ws.next())
                .await?
                .ok_or_else(|| anyhow!("websocket closed while awaiting {method}"))?
                .with_context(|| format!("receiving response to {method}"))?;

            let text = match message {
                Message::Text(text) => text,
                // Pings are answered by tungstenite internally.
                _ => continue,
            };

            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("malformed protocol message for {method}"))?;

            if value.get("id").and_then(Value::as_u64) != Some(id) {
                // Protocol event or stale response.
                continue;
            }

            if let Some(error) = value.get("error") {
                bail!("{method} failed: {error}");
            }

            return Ok(value.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    /// Close the websocket. Failures are reported, the caller decides
    /// whether to swallow them.
    pub async fn close(&mut self) -> Result<()> {
        with_timeout(self.call_timeout, "close", self.ws.close(None))
            .await?
            .context("closing websocket")?;
        Ok(())
    }
}
