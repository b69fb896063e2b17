//! paperwatch: announces new PaperMC builds to a Discord channel.
//!
//! The relay polls the PaperMC API every five minutes, remembers the last
//! announced build (plus a short history) in a JSON file, and posts an embed
//! to one channel when a new build appears. Three slash commands report the
//! persisted state on demand.
//!
//! # Architecture
//!
//! - **State** ([`state`]): persisted last version/build and capped history
//! - **Upstream** ([`http`], [`poller`]): three sequential GETs per poll
//! - **Detection** ([`detector`]): diff, persist, announce
//! - **Commands** ([`commands`]): replies built from state only
//! - **Scheduling** ([`scheduler`], [`bot`]): startup sequence and poll loop
//! - **Discord** ([`discord`], [`embeds`]): REST, gateway, message rendering
//! - **Liveness** ([`liveness`]): `GET /` for uptime monitors

pub mod bot;
pub mod commands;
pub mod config;
pub mod detector;
pub mod discord;
pub mod embeds;
pub mod error;
pub mod http;
pub mod liveness;
pub mod poller;
pub mod scheduler;
pub mod state;

pub use bot::Relay;
pub use config::RelayConfig;
pub use detector::{CycleOutcome, UpdateDetector};
pub use error::{RelayError, Result};
pub use poller::{BuildPoller, BuildSource};
pub use state::{BuildId, BuildRecord, PersistedState, StateStore};
