//! Discord gateway session.
//!
//! Identifies with the `GUILDS` intent, keeps the heartbeat going and turns
//! `READY` and `INTERACTION_CREATE` dispatches into [`GatewayEvent`]s. Any
//! protocol trouble ends the session with an error.

use crate::discord::rest::DiscordRest;
use crate::discord::types::Interaction;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// `GUILDS` intent; slash command interactions need nothing more.
const GATEWAY_INTENTS: u64 = 1;

const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_RECONNECT: u64 = 7;
const OP_INVALID_SESSION: u64 = 9;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

/// Event surfaced to the bot runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Session established.
    Ready { user_name: Option<String> },
    /// Slash command invocation.
    Interaction(Interaction),
}

#[derive(Debug, Deserialize)]
struct GatewayFrame {
    op: u64,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: serde_json::Value,
}

fn dispatch_event(frame: &GatewayFrame) -> Option<GatewayEvent> {
    match frame.t.as_deref()? {
        "READY" => Some(GatewayEvent::Ready {
            user_name: frame
                .d
                .get("user")
                .and_then(|u| u.get("username"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
        }),
        "INTERACTION_CREATE" => Interaction::from_dispatch(&frame.d).map(GatewayEvent::Interaction),
        _ => None,
    }
}

/// Tracks whether the last heartbeat was acknowledged.
#[derive(Debug, Default)]
struct HeartbeatState {
    awaiting_ack: bool,
}

impl HeartbeatState {
    /// Mark a heartbeat as sent. Returns `false` if the previous one was
    /// never acknowledged, meaning the connection is dead.
    fn beat(&mut self) -> bool {
        if self.awaiting_ack {
            return false;
        }
        self.awaiting_ack = true;
        true
    }

    fn ack(&mut self) {
        self.awaiting_ack = false;
    }
}

/// One Discord gateway connection.
///
/// [`GatewaySession::run`] returns when the connection drops; the caller
/// decides whether to reconnect.
pub struct GatewaySession {
    rest: Arc<DiscordRest>,
}

impl GatewaySession {
    /// Session authenticating with the bot token held by `rest`.
    pub fn new(rest: Arc<DiscordRest>) -> Self {
        Self { rest }
    }

    /// Connect, identify and forward events until the connection ends.
    pub async fn run(&self, events: mpsc::Sender<GatewayEvent>) -> anyhow::Result<()> {
        if self.rest.bot_token().trim().is_empty() {
            anyhow::bail!("discord bot token is empty");
        }

        let gateway_resp: serde_json::Value = self
            .rest
            .http()
            .get(format!("{}/gateway/bot", self.rest.api_base()))
            .header("Authorization", format!("Bot {}", self.rest.bot_token()))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let gateway_url = gateway_resp
            .get("url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(DEFAULT_GATEWAY_URL);
        let ws_url = format!("{gateway_url}/?v=10&encoding=json");

        let (stream, _) = tokio_tungstenite::connect_async(&ws_url).await?;
        let (mut write, mut read) = stream.split();

        let hello = read
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("no hello"))??;
        let hello: GatewayFrame = match hello {
            Message::Text(text) => serde_json::from_str(&text)?,
            _ => anyhow::bail!("unexpected discord hello payload"),
        };
        if hello.op != OP_HELLO {
            anyhow::bail!("expected hello (op 10), got op {}", hello.op);
        }
        let heartbeat_interval_ms = hello
            .d
            .get("heartbeat_interval")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(41_250);

        let identify = json!({
            "op": OP_IDENTIFY,
            "d": {
                "token": self.rest.bot_token(),
                "intents": GATEWAY_INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "paperwatch",
                    "device": "paperwatch"
                }
            }
        });
        write.send(Message::Text(identify.to_string())).await?;

        let period = Duration::from_millis(heartbeat_interval_ms);
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut last_seq: Option<u64> = None;
        let mut heartbeat_state = HeartbeatState::default();

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !heartbeat_state.beat() {
                        anyhow::bail!("discord heartbeat not acknowledged");
                    }
                    let beat = json!({"op": OP_HEARTBEAT, "d": last_seq});
                    if write.send(Message::Text(beat.to_string())).await.is_err() {
                        anyhow::bail!("discord heartbeat failed");
                    }
                }
                maybe_msg = read.next() => {
                    let raw = match maybe_msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(frame))) => {
                            anyhow::bail!("discord websocket closed: {frame:?}");
                        }
                        None => anyhow::bail!("discord websocket closed"),
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => anyhow::bail!("discord websocket error: {err}"),
                    };

                    let frame: GatewayFrame = match serde_json::from_str(&raw) {
                        Ok(f) => f,
                        Err(_) => continue,
                    };
                    if frame.s.is_some() {
                        last_seq = frame.s;
                    }

                    match frame.op {
                        OP_DISPATCH => {
                            let Some(event) = dispatch_event(&frame) else {
                                continue;
                            };
                            if events.send(event).await.is_err() {
                                anyhow::bail!("gateway event receiver dropped");
                            }
                        }
                        OP_HEARTBEAT => {
                            let beat = json!({"op": OP_HEARTBEAT, "d": last_seq});
                            write.send(Message::Text(beat.to_string())).await?;
                        }
                        OP_HEARTBEAT_ACK => heartbeat_state.ack(),
                        OP_RECONNECT => anyhow::bail!("discord requested reconnect"),
                        OP_INVALID_SESSION => anyhow::bail!("discord invalidated the session"),
                        _ => {}
                    }
                }
            }
        }
    }
}
