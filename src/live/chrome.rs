// src/live/chrome.rs
//
// Attaches to the Chrome dinosaur game over the DevTools protocol.
//
// The browser itself is launched and owned by the operator
// (`chrome --remote-debugging-port=9222` with the dino page open); this
// module discovers the page target over the DevTools HTTP endpoint, opens
// its websocket, and exposes the game through GameInterface: one
// Runtime.evaluate round-trip per snapshot and Input.dispatchKeyEvent for
// the Space presses.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::BrowserConfig;
use crate::types::GameSnapshot;

use super::cdp::CdpClient;
use super::{BoxFuture, GameInterface};

/// Expression evaluated once per tick. Emits the full game snapshot with
/// field names matching the serde schema in src/types.rs, or null while the
/// runner instance is not ready.
const SNAPSHOT_JS: &str = r#"
(() => {
    const runner = window.Runner && window.Runner.instance_;
    if (!runner || !runner.tRex) {
        return null;
    }
    const tRex = runner.tRex;
    let obstacles = [];
    try {
        const raw = (runner.horizon && runner.horizon.obstacles) || [];
        obstacles = raw.map((o) => ({
            type: (o.typeConfig && o.typeConfig.type) || "unknown",
            x: o.xPos,
            y: o.yPos,
            width: o.width,
            height: o.height,
        }));
    } catch (e) {
        obstacles = [];
    }
    const digits =
        runner.distanceMeter && runner.distanceMeter.digits
            ? runner.distanceMeter.digits.join("")
            : "0";
    return {
        player: {
            x: tRex.xPos,
            y: tRex.yPos,
            width: tRex.config.WIDTH,
            height: tRex.config.HEIGHT,
            jumping: !!tRex.jumping,
        },
        obstacles,
        speed: runner.currentSpeed || 0,
        canvas: {
            width: runner.dimensions.WIDTH,
            height: runner.dimensions.HEIGHT,
        },
        score: parseInt(digits, 10) || 0,
        game_over: !!runner.crashed,
    };
})()
"#;

/// One entry of the DevTools /json/list target listing.
#[derive(Debug, Clone, Deserialize)]
struct PageTarget {
    #[serde(rename = "type")]
    target_type: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    ws_url: Option<String>,
}

/// Pick the game page among the open targets: prefer a page whose URL
/// matches the configured hint, otherwise take the first page target.
async fn discover_page(cfg: &BrowserConfig) -> Result<String> {
    let listing_url = format!("{}/json/list", cfg.devtools_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.call_timeout_ms))
        .build()
        .context("building devtools http client")?;

    let targets: Vec<PageTarget> = client
        .get(&listing_url)
        .send()
        .await
        .with_context(|| format!("querying {listing_url}"))?
        .json()
        .await
        .context("parsing devtools target listing")?;

    let chosen = targets
        .iter()
        .find(|t| t.target_type == "page" && t.url.contains(&cfg.page_url_hint))
        .or_else(|| targets.iter().find(|t| t.target_type == "page"));

    match chosen.and_then(|t| t.ws_url.clone()) {
        Some(ws_url) => Ok(ws_url),
        None => bail!(
            "no debuggable page target at {} (is Chrome running with --remote-debugging-port?)",
            cfg.devtools_url
        ),
    }
}

/// The dino game reached over CDP.
pub struct DinoGame {
    cdp: CdpClient,
}

impl DinoGame {
    /// Discover the game page and attach to it.
    pub async fn connect(cfg: &BrowserConfig) -> Result<Self> {
        let ws_url = discover_page(cfg).await?;
        let call_timeout = Duration::from_millis(cfg.call_timeout_ms);
        let mut cdp = CdpClient::connect(&ws_url, call_timeout).await?;
        cdp.call("Runtime.enable", json!({})).await?;
        Ok(Self { cdp })
    }

    /// Wait until `Runner.instance_` exists on the page. A deadline miss is
    /// the unrecoverable startup failure: propagated, not retried.
    pub async fn wait_ready(&mut self, cfg: &BrowserConfig) -> Result<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(cfg.ready_timeout_ms);
        loop {
            let ready = self
                .evaluate("!!(window.Runner && window.Runner.instance_)")
                .await?;
            if ready.as_bool() == Some(true) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                bail!(
                    "game never became ready within {}ms (no Runner.instance_ on the page)",
                    cfg.ready_timeout_ms
                );
            }
            tokio::time::sleep(Duration::from_millis(cfg.ready_poll_ms)).await;
        }
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let result = self
            .cdp
            .call(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn press_space(&mut self) -> Result<()> {
        for event_type in ["rawKeyDown", "keyUp"] {
            self.cdp
                .call(
                    "Input.dispatchKeyEvent",
                    json!({
                        "type": event_type,
                        "key": " ",
                        "code": "Space",
                        "windowsVirtualKeyCode": 32,
                        "nativeVirtualKeyCode": 32,
                    }),
                )
                .await?;
        }
        Ok(())
    }
}

impl GameInterface for DinoGame {
    fn snapshot(&mut self) -> BoxFuture<'_, Result<Option<GameSnapshot>>> {
        Box::pin(async move {
            let value = self.evaluate(SNAPSHOT_JS).await?;
            if value.is_null() {
                return Ok(None);
            }
            let snapshot: GameSnapshot =
                serde_json::from_value(value).context("malformed game snapshot from page")?;
            Ok(Some(snapshot))
        })
    }

    fn press_jump(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.press_space())
    }

    fn press_restart(&mut self) -> BoxFuture<'_, Result<()>> {
        // The runner restarts on the same key as jumping.
        Box::pin(self.press_space())
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.cdp.close())
    }
}
