// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no presence logic.
//
// Naming convention: Base* for trait names (e.g., BaseSessionGateway)

use anyhow::Result;
use async_trait::async_trait;
use mumble::{ChannelId, Session};

// =============================================================================
// Session Gateway Trait (Infrastructure - chat server primitives)
// =============================================================================

#[async_trait]
pub trait BaseSessionGateway: Send + Sync {
    /// Send a private text message to one connected user
    async fn send_to_user(&self, session: Session, text: &str) -> Result<()>;

    /// Resolve a channel path below the root, one name per level
    async fn find_channel(&self, path: &[String]) -> Option<ChannelId>;

    /// Move the bot's own user into a channel
    async fn move_self(&self, channel: ChannelId) -> Result<()>;
}
