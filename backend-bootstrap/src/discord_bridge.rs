use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use backend_application::commands::chat_commands::{run_chat_command, ChatCommand};
use backend_application::AppState;
use backend_domain::InboundMessage;
use backend_infrastructure::DiscordReplier;

type GatewaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECONNECT_DELAY_SECONDS: u64 = 5;
const MIN_HEARTBEAT_MILLIS: u64 = 1000;

// GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT
const GATEWAY_INTENTS: u64 = 1 | (1 << 9) | (1 << 15);

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;

#[derive(Debug, Deserialize)]
struct GatewayFrame {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

struct BridgeDeps {
    state: AppState,
    replier: Arc<DiscordReplier>,
    queue: mpsc::Sender<InboundMessage>,
}

/// Connects to the Discord gateway and feeds guild messages into the ingestion
/// queue. Reconnects with a fixed delay whenever the session ends.
pub fn spawn_discord_bridge(
    state: AppState,
    replier: Arc<DiscordReplier>,
    queue: mpsc::Sender<InboundMessage>,
) {
    let Some(token) = state
        .config
        .discord_token
        .clone()
        .filter(|token| !token.trim().is_empty())
    else {
        info!("discord bridge disabled: no discord_token configured");
        return;
    };

    tokio::spawn(async move {
        let mut cache = GatewayCache::new(state.config.discord_guild_ids.clone());
        let deps = BridgeDeps {
            state,
            replier,
            queue,
        };
        loop {
            if let Err(err) = run_session(&deps, &token, &mut cache).await {
                warn!("discord gateway session ended: {:#}", err);
            }
            sleep(Duration::from_secs(RECONNECT_DELAY_SECONDS)).await;
        }
    });
}

async fn run_session(deps: &BridgeDeps, token: &str, cache: &mut GatewayCache) -> Result<()> {
    let url = deps.state.config.discord_gateway_url.as_str();
    let (socket, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut sink, mut stream) = socket.split();

    let hello = next_frame(&mut stream).await?;
    if hello.op != OP_HELLO {
        bail!("expected gateway hello, got op {}", hello.op);
    }
    let heartbeat_millis = hello
        .d
        .get("heartbeat_interval")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("gateway hello without heartbeat_interval"))?;

    sink.send(Message::Text(identify_payload(token).to_string().into()))
        .await?;
    info!(
        "discord gateway connected: heartbeat every {}ms",
        heartbeat_millis
    );

    let mut heartbeat = interval(Duration::from_millis(
        heartbeat_millis.max(MIN_HEARTBEAT_MILLIS),
    ));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sequence: Option<u64> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                sink.send(Message::Text(heartbeat_payload(sequence).to_string().into()))
                    .await?;
            }
            next = stream.next() => {
                let frame = match next {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<GatewayFrame>(text.as_ref()) {
                            Ok(frame) => frame,
                            Err(err) => {
                                debug!("skipping undecodable gateway frame: {}", err);
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        sink.send(Message::Pong(bytes)).await?;
                        continue;
                    }
                    Some(Ok(Message::Close(frame))) => bail!("gateway closed by peer: {:?}", frame),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => bail!("gateway stream error: {}", err),
                    None => bail!("gateway stream ended"),
                };

                if frame.s.is_some() {
                    sequence = frame.s;
                }
                match frame.op {
                    OP_DISPATCH => {
                        let event = frame.t.as_deref().unwrap_or("");
                        if let Some(message) = cache.apply_dispatch(event, &frame.d) {
                            route_message(deps, message)?;
                        }
                    }
                    OP_HEARTBEAT => {
                        sink.send(Message::Text(heartbeat_payload(sequence).to_string().into()))
                            .await?;
                    }
                    OP_RECONNECT => bail!("gateway requested reconnect"),
                    OP_INVALID_SESSION => bail!("gateway invalidated the session"),
                    _ => {}
                }
            }
        }
    }
}

async fn next_frame(stream: &mut SplitStream<GatewaySocket>) -> Result<GatewayFrame> {
    while let Some(next) = stream.next().await {
        if let Message::Text(text) = next? {
            return Ok(serde_json::from_str(text.as_ref())?);
        }
    }
    Err(anyhow!("gateway stream ended before hello"))
}

/// Commands are answered in place; everything else goes to the ingestion worker.
fn route_message(deps: &BridgeDeps, message: InboundMessage) -> Result<()> {
    if let Some(command) = ChatCommand::parse(&message.text) {
        let state = deps.state.clone();
        let replier = deps.replier.clone();
        tokio::spawn(async move {
            let answer = run_chat_command(&state, command).await;
            if let Err(err) = replier.send(&message.channel_id, &answer).await {
                warn!("failed to answer {:?} command: {:#}", command, err);
            }
        });
        return Ok(());
    }

    match deps.queue.try_send(message) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(message)) => {
            warn!(
                "ingest queue full, dropping message {}",
                message.message_id
            );
            Ok(())
        }
        Err(TrySendError::Closed(_)) => bail!("ingestion worker is gone"),
    }
}

fn identify_payload(token: &str) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": GATEWAY_INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "eventory",
                "device": "eventory",
            },
        },
    })
}

fn heartbeat_payload(sequence: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": sequence })
}

/// Names the gateway tells us about, so messages can carry channel and guild names.
#[derive(Debug, Default)]
struct GatewayCache {
    bot_user_id: Option<String>,
    allowed_guilds: Vec<String>,
    guild_names: HashMap<String, String>,
    channel_names: HashMap<String, String>,
}

impl GatewayCache {
    fn new(allowed_guilds: Vec<String>) -> Self {
        Self {
            allowed_guilds,
            ..Self::default()
        }
    }

    fn apply_dispatch(&mut self, event: &str, data: &Value) -> Option<InboundMessage> {
        match event {
            "READY" => {
                self.bot_user_id = str_field(data.get("user"), "id");
                info!(
                    "discord bridge ready as {}",
                    str_field(data.get("user"), "username").unwrap_or_default()
                );
                None
            }
            "GUILD_CREATE" | "GUILD_UPDATE" => {
                let guild_id = str_field(Some(data), "id")?;
                if let Some(name) = str_field(Some(data), "name") {
                    self.guild_names.insert(guild_id, name);
                }
                for key in ["channels", "threads"] {
                    if let Some(Value::Array(channels)) = data.get(key) {
                        for channel in channels {
                            self.remember_channel(channel);
                        }
                    }
                }
                None
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" | "THREAD_CREATE" | "THREAD_UPDATE" => {
                self.remember_channel(data);
                None
            }
            "MESSAGE_CREATE" => self.inbound_message(data),
            _ => None,
        }
    }

    fn remember_channel(&mut self, channel: &Value) {
        if let (Some(id), Some(name)) = (
            str_field(Some(channel), "id"),
            str_field(Some(channel), "name"),
        ) {
            self.channel_names.insert(id, name);
        }
    }

    fn inbound_message(&self, data: &Value) -> Option<InboundMessage> {
        let author = data.get("author");
        if author
            .and_then(|a| a.get("bot"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return None;
        }
        let author_id = str_field(author, "id").unwrap_or_default();
        if self.bot_user_id.as_deref() == Some(author_id.as_str()) {
            return None;
        }

        let guild_id = str_field(Some(data), "guild_id");
        if !self.allowed_guilds.is_empty()
            && !guild_id
                .as_ref()
                .map(|id| self.allowed_guilds.contains(id))
                .unwrap_or(false)
        {
            return None;
        }

        let text = str_field(Some(data), "content").unwrap_or_default();
        if text.trim().is_empty() {
            return None;
        }
        let message_id = str_field(Some(data), "id")?;
        let channel_id = str_field(Some(data), "channel_id")?;

        Some(InboundMessage {
            permalink: permalink(guild_id.as_deref(), &channel_id, &message_id),
            channel_name: self
                .channel_names
                .get(&channel_id)
                .cloned()
                .unwrap_or_default(),
            guild_name: guild_id
                .as_ref()
                .and_then(|id| self.guild_names.get(id))
                .cloned()
                .unwrap_or_default(),
            author_name: str_field(author, "global_name")
                .or_else(|| str_field(author, "username"))
                .unwrap_or_default(),
            message_id,
            text,
            channel_id,
            guild_id,
            author_id,
        })
    }
}

fn str_field(value: Option<&Value>, key: &str) -> Option<String> {
    value?
        .get(key)?
        .as_str()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn permalink(guild_id: Option<&str>, channel_id: &str, message_id: &str) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id.unwrap_or("@me"),
        channel_id,
        message_id
    )
}
