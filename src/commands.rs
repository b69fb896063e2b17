//! Slash command definitions and replies.
//!
//! All three commands read only from persisted state.

use crate::discord::traits::CommandPlatform;
use crate::discord::types::{ChatMessage, CommandDefinition, Interaction, Reply};
use crate::embeds::{
    GENERIC_COMMAND_ERROR, current_build_text, history_embed, status_embed,
};
use crate::error::{RelayError, Result};
use crate::state::StateStore;
use std::sync::Arc;
use tracing::{error, info};

/// `CHAT_INPUT` application command type.
const CHAT_INPUT: u64 = 1;

/// Supported slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Latest version, build, changes and download link.
    Status,
    /// One-line current version and build.
    CurrentBuild,
    /// Up to three recent builds.
    History,
}

impl Command {
    /// Every command, in registration order.
    pub const ALL: [Command; 3] = [Command::Status, Command::CurrentBuild, Command::History];

    /// Slash command name as registered with Discord.
    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::CurrentBuild => "currentbuild",
            Self::History => "history",
        }
    }

    /// Description shown in the Discord command picker.
    pub fn description(self) -> &'static str {
        match self {
            Self::Status => "Show the latest known Paper version, build and changes",
            Self::CurrentBuild => "Show the current Paper version and build number",
            Self::History => "Show the most recent Paper builds",
        }
    }

    /// Look up a command by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Registration payload for this command.
    pub fn definition(self) -> CommandDefinition {
        CommandDefinition {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            kind: CHAT_INPUT,
        }
    }
}

/// Definitions for every supported command, in registration order.
pub fn definitions() -> Vec<CommandDefinition> {
    Command::ALL.into_iter().map(Command::definition).collect()
}

/// Answers slash commands from persisted state.
pub struct CommandResponder {
    store: Arc<StateStore>,
}

impl CommandResponder {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    fn build_reply(&self, name: &str) -> Result<Reply> {
        let command = Command::from_name(name)
            .ok_or_else(|| RelayError::Command(format!("unknown command `{name}`")))?;
        let state = self.store.snapshot();
        let message = match command {
            Command::Status => ChatMessage::Embed(status_embed(&state)),
            Command::CurrentBuild => ChatMessage::Text(current_build_text(&state)),
            Command::History => ChatMessage::Embed(history_embed(&state)),
        };
        Ok(Reply::public(message))
    }

    /// Reply for `name`. Failures become a private generic error reply, so
    /// every invocation gets exactly one answer.
    pub fn respond(&self, name: &str) -> Reply {
        match self.build_reply(name) {
            Ok(reply) => reply,
            Err(e) => {
                error!(command = %name, "failed to build command reply: {e}");
                Reply::private(GENERIC_COMMAND_ERROR)
            }
        }
    }

    /// Build and deliver the reply to `interaction`.
    pub async fn handle(&self, platform: &dyn CommandPlatform, interaction: &Interaction) {
        info!(
            command = %interaction.command_name,
            user = interaction.user_id.as_deref().unwrap_or("unknown"),
            "command invoked"
        );
        let reply = self.respond(&interaction.command_name);
        if let Err(e) = platform.reply(interaction, &reply).await {
            error!(command = %interaction.command_name, "failed to send command reply: {e}");
        }
    }
}
