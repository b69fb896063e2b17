use crate::discord::traits::{ChatNotifier, CommandPlatform};
use crate::discord::types::{
    CHANNEL_MESSAGE_WITH_SOURCE, ChatMessage, CommandDefinition, Interaction,
    InteractionCallback, MessagePayload, Reply,
};
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Discord REST API client scoped to one application and guild.
pub struct DiscordRest {
    bot_token: String,
    application_id: String,
    guild_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl DiscordRest {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        application_id: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        let mut api_base = api_base.into();
        while api_base.ends_with('/') {
            api_base.pop();
        }
        Self {
            bot_token: bot_token.into(),
            application_id: application_id.into(),
            guild_id: guild_id.into(),
            api_base,
            client,
        }
    }

    pub(crate) fn bot_token(&self) -> &str {
        &self.bot_token
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<()> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Discord(format!(
                "{what} failed ({status}): {body}"
            )));
        }
        Ok(())
    }

    /// Post `message` to `channel_id`.
    pub async fn send_message(&self, channel_id: &str, message: &ChatMessage) -> Result<()> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(&MessagePayload::from(message))
            .send()
            .await
            .map_err(|e| RelayError::Discord(format!("channel message send failed: {e}")))?;
        Self::check(response, "channel message send").await
    }
}

#[async_trait]
impl CommandPlatform for DiscordRest {
    async fn register_commands(&self, commands: &[CommandDefinition]) -> Result<()> {
        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.api_base, self.application_id, self.guild_id
        );
        let response = self
            .client
            .put(&url)
            .header("Authorization", self.authorization())
            .json(commands)
            .send()
            .await
            .map_err(|e| RelayError::Registration(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Registration(format!(
                "command registration failed ({status}): {body}"
            )));
        }
        Ok(())
    }

    async fn reply(&self, interaction: &Interaction, reply: &Reply) -> Result<()> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.api_base, interaction.id, interaction.token
        );
        let body = InteractionCallback {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: MessagePayload::from(reply),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Command(format!("interaction reply failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Command(format!(
                "interaction reply rejected ({status}): {body}"
            )));
        }
        Ok(())
    }
}

/// [`ChatNotifier`] bound to the announcement channel.
pub struct ChannelNotifier {
    rest: Arc<DiscordRest>,
    channel_id: String,
}

impl ChannelNotifier {
    pub fn new(rest: Arc<DiscordRest>, channel_id: impl Into<String>) -> Self {
        Self {
            rest,
            channel_id: channel_id.into(),
        }
    }
}

#[async_trait]
impl ChatNotifier for ChannelNotifier {
    async fn send(&self, message: ChatMessage) -> Result<()> {
        self.rest.send_message(&self.channel_id, &message).await
    }
}
