//! Update detection: one poll cycle.
//!
//! A cycle fetches the latest build, compares it with the persisted
//! `(lastVersion, lastBuild)`, and on a change records it, writes the state
//! file, and announces the build. Cycles never overlap: a cycle that starts
//! while another is running is skipped.

use crate::discord::traits::ChatNotifier;
use crate::discord::types::ChatMessage;
use crate::embeds::{POLL_FAILURE_WARNING, new_build_embed};
use crate::poller::BuildSource;
use crate::state::{BuildRecord, StateStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Upstream matches the last known build.
    Unchanged,
    /// A new build was recorded and announced.
    Updated(BuildRecord),
    /// Fetching failed; a warning was posted.
    Failed,
    /// Another cycle was still running.
    Skipped,
}

/// Compares upstream against persisted state and announces new builds.
pub struct UpdateDetector {
    source: Arc<dyn BuildSource>,
    store: Arc<StateStore>,
    notifier: Arc<dyn ChatNotifier>,
    in_progress: Mutex<()>,
}

impl UpdateDetector {
    /// Create a detector over the given collaborators.
    pub fn new(
        source: Arc<dyn BuildSource>,
        store: Arc<StateStore>,
        notifier: Arc<dyn ChatNotifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            in_progress: Mutex::new(()),
        }
    }

    /// Run one poll cycle. Never panics or propagates errors.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.in_progress.try_lock() else {
            debug!("poll cycle already in progress, skipping");
            return CycleOutcome::Skipped;
        };

        let record = match self.source.fetch_latest_build().await {
            Ok(record) => record,
            Err(e) => {
                error!("failed to fetch latest build: {e}");
                let warning = ChatMessage::Text(POLL_FAILURE_WARNING.to_owned());
                if let Err(e) = self.notifier.send(warning).await {
                    error!("failed to post poll failure warning: {e}");
                }
                return CycleOutcome::Failed;
            }
        };

        let Some(updated) = self.store.apply_if_new(&record) else {
            info!(version = %record.version, build = %record.build, "no updates");
            return CycleOutcome::Unchanged;
        };

        info!(version = %record.version, build = %record.build, "new build detected");

        if let Err(e) = self.store.persist(&updated) {
            error!("failed to persist state: {e}");
        }

        let announcement = ChatMessage::Embed(new_build_embed(&record));
        if let Err(e) = self.notifier.send(announcement).await {
            error!("failed to announce new build: {e}");
        }

        CycleOutcome::Updated(record)
    }
}
