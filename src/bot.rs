//! Bot runtime: wires gateway events to the startup sequence and the
//! command responder.

use crate::commands::{CommandResponder, definitions};
use crate::config::{INITIAL_POLL_DELAY, POLL_INTERVAL, RelayConfig};
use crate::detector::UpdateDetector;
use crate::discord::gateway::{GatewayEvent, GatewaySession};
use crate::discord::rest::{ChannelNotifier, DiscordRest};
use crate::discord::traits::{ChatNotifier, CommandPlatform};
use crate::discord::types::ChatMessage;
use crate::embeds::restart_embed;
use crate::error::Result;
use crate::http::{UpstreamClient, build_client};
use crate::poller::BuildPoller;
use crate::scheduler::PollScheduler;
use crate::state::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pause before re-opening a dropped gateway session.
const GATEWAY_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// The running notifier: startup sequence, command handling and poll loop.
pub struct Relay {
    store: Arc<StateStore>,
    notifier: Arc<dyn ChatNotifier>,
    platform: Arc<dyn CommandPlatform>,
    detector: Arc<UpdateDetector>,
    responder: CommandResponder,
    poll_timing: (Duration, Duration),
    poll_loop: Option<JoinHandle<()>>,
}

impl Relay {
    /// Create a relay with the production poll timing.
    pub fn new(
        store: Arc<StateStore>,
        notifier: Arc<dyn ChatNotifier>,
        platform: Arc<dyn CommandPlatform>,
        detector: Arc<UpdateDetector>,
    ) -> Self {
        Self {
            responder: CommandResponder::new(Arc::clone(&store)),
            store,
            notifier,
            platform,
            detector,
            poll_timing: (INITIAL_POLL_DELAY, POLL_INTERVAL),
            poll_loop: None,
        }
    }

    /// Assemble the production relay from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<(Self, Arc<DiscordRest>)> {
        let client = build_client()?;
        let store = Arc::new(StateStore::open(&config.state_path));
        let rest = Arc::new(DiscordRest::new(
            client.clone(),
            &config.discord_api_url,
            &config.discord_token,
            &config.application_id,
            &config.guild_id,
        ));
        let notifier: Arc<dyn ChatNotifier> =
            Arc::new(ChannelNotifier::new(Arc::clone(&rest), &config.channel_id));
        let poller = BuildPoller::new(UpstreamClient::with_client(client), &config.paper_api_url);
        let detector = Arc::new(UpdateDetector::new(
            Arc::new(poller),
            Arc::clone(&store),
            Arc::clone(&notifier),
        ));
        let platform: Arc<dyn CommandPlatform> = rest.clone();

        Ok((Self::new(store, notifier, platform, detector), rest))
    }

    /// Override the poll loop timing.
    pub fn with_poll_timing(mut self, initial_delay: Duration, period: Duration) -> Self {
        self.poll_timing = (initial_delay, period);
        self
    }

    /// Returns `true` once the poll loop has been started.
    pub fn is_polling(&self) -> bool {
        self.poll_loop.is_some()
    }

    async fn register_commands(&self) {
        match self.platform.register_commands(&definitions()).await {
            Ok(()) => info!("slash commands registered"),
            Err(e) => error!("failed to register slash commands: {e}"),
        }
    }

    /// Startup sequence for a READY event.
    ///
    /// Commands are registered on every READY. The restart announcement and
    /// the poll loop only happen on the first one.
    pub async fn on_ready(&mut self) {
        self.register_commands().await;

        if self.poll_loop.is_some() {
            return;
        }

        let announcement = ChatMessage::Embed(restart_embed(&self.store.snapshot()));
        if let Err(e) = self.notifier.send(announcement).await {
            error!("failed to send restart announcement: {e}");
        }

        let (initial_delay, period) = self.poll_timing;
        let handle = PollScheduler::new(Arc::clone(&self.detector))
            .with_timing(initial_delay, period)
            .run();
        self.poll_loop = Some(handle);
    }

    /// Route one gateway event.
    pub async fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready { user_name } => {
                info!(
                    user = user_name.as_deref().unwrap_or("unknown"),
                    "connected to discord"
                );
                self.on_ready().await;
            }
            GatewayEvent::Interaction(interaction) => {
                self.responder
                    .handle(self.platform.as_ref(), &interaction)
                    .await;
            }
        }
    }

    /// Keep a gateway session open and process its events until the process
    /// exits. Dropped sessions are re-opened after a fixed pause.
    pub async fn run(mut self, rest: Arc<DiscordRest>) {
        let (event_tx, mut event_rx) = mpsc::channel::<GatewayEvent>(64);
        let session = GatewaySession::new(rest);

        let gateway = tokio::spawn(async move {
            loop {
                if let Err(e) = session.run(event_tx.clone()).await {
                    warn!("discord gateway session ended: {e}");
                }
                if event_tx.is_closed() {
                    break;
                }
                tokio::time::sleep(GATEWAY_RECONNECT_DELAY).await;
            }
        });

        while let Some(event) = event_rx.recv().await {
            self.handle_event(event).await;
        }

        gateway.abort();
        if let Some(handle) = self.poll_loop.take() {
            handle.abort();
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if let Some(handle) = self.poll_loop.take() {
            handle.abort();
        }
    }
}
