//! Discord wire types used by the relay.

use serde::{Deserialize, Serialize};

/// Interaction response flag that hides the reply from everyone but the invoker.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// Interaction type for slash command invocations.
pub const APPLICATION_COMMAND_INTERACTION: u64 = 2;

/// Callback type for "reply with a message".
pub const CHANNEL_MESSAGE_WITH_SOURCE: u64 = 4;

/// Rich embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// ISO 8601 timestamp shown in the embed footer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: Some(title.into()),
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp_now(mut self) -> Self {
        self.timestamp = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}

/// Message body sent to a channel or as an interaction reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    Text(String),
    Embed(Embed),
}

/// Reply to a slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub message: ChatMessage,
    /// Visible only to the invoking user.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(message: ChatMessage) -> Self {
        Self {
            message,
            ephemeral: false,
        }
    }

    pub fn private(text: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::Text(text.into()),
            ephemeral: true,
        }
    }
}

/// JSON body for `POST /channels/{id}/messages` and interaction callbacks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl From<&ChatMessage> for MessagePayload {
    fn from(message: &ChatMessage) -> Self {
        match message {
            ChatMessage::Text(text) => Self {
                content: Some(text.clone()),
                ..Default::default()
            },
            ChatMessage::Embed(embed) => Self {
                embeds: vec![embed.clone()],
                ..Default::default()
            },
        }
    }
}

impl From<&Reply> for MessagePayload {
    fn from(reply: &Reply) -> Self {
        let mut payload = Self::from(&reply.message);
        if reply.ephemeral {
            payload.flags = Some(EPHEMERAL_FLAG);
        }
        payload
    }
}

/// Interaction callback envelope.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    pub kind: u64,
    pub data: MessagePayload,
}

/// Zero-argument chat-input command definition for registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    /// `1` = CHAT_INPUT.
    #[serde(rename = "type")]
    pub kind: u64,
}

/// Slash command invocation received over the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub id: String,
    pub token: String,
    pub command_name: String,
    pub user_id: Option<String>,
}

impl Interaction {
    /// Parse an `INTERACTION_CREATE` dispatch payload.
    ///
    /// Returns `None` for anything other than an application command.
    pub fn from_dispatch(data: &serde_json::Value) -> Option<Self> {
        let kind = data.get("type").and_then(serde_json::Value::as_u64)?;
        if kind != APPLICATION_COMMAND_INTERACTION {
            return None;
        }
        let id = data.get("id").and_then(serde_json::Value::as_str)?;
        let token = data.get("token").and_then(serde_json::Value::as_str)?;
        let command_name = data
            .get("data")
            .and_then(|d| d.get("name"))
            .and_then(serde_json::Value::as_str)?;
        let user_id = data
            .get("member")
            .and_then(|m| m.get("user"))
            .or_else(|| data.get("user"))
            .and_then(|u| u.get("id"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);

        Some(Self {
            id: id.to_owned(),
            token: token.to_owned(),
            command_name: command_name.to_owned(),
            user_id,
        })
    }
}
