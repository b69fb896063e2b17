use crate::discord::types::{ChatMessage, CommandDefinition, Interaction, Reply};
use crate::error::Result;
use async_trait::async_trait;

/// Outbound announcements to the configured channel.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Post a message to the announcement channel.
    async fn send(&self, message: ChatMessage) -> Result<()>;
}

/// Slash command plumbing on the chat platform.
#[async_trait]
pub trait CommandPlatform: Send + Sync {
    /// Replace the registered command set (idempotent upsert).
    async fn register_commands(&self, commands: &[CommandDefinition]) -> Result<()>;

    /// Answer an interaction. Must be called exactly once per interaction.
    async fn reply(&self, interaction: &Interaction, reply: &Reply) -> Result<()>;
}
