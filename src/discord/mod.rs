//! Discord collaborator: REST calls, a minimal gateway session, and the
//! traits the rest of the crate talks to.

pub mod gateway;
pub mod rest;
pub mod traits;
pub mod types;

pub use gateway::{GatewayEvent, GatewaySession};
pub use rest::{ChannelNotifier, DiscordRest};
pub use traits::{ChatNotifier, CommandPlatform};
pub use types::{ChatMessage, CommandDefinition, Embed, Interaction, Reply};
