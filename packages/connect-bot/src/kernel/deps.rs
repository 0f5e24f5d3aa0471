//! Bot dependencies for effects (using traits for testability)

use anyhow::Result;
use async_trait::async_trait;
use mumble::{ChannelId, Client, Session};
use std::sync::Arc;

use crate::kernel::BaseSessionGateway;

// =============================================================================
// Mumble Client Adapter (implements BaseSessionGateway trait)
// =============================================================================

/// Wrapper around mumble::Client that implements BaseSessionGateway trait
pub struct MumbleGateway(pub Client);

impl MumbleGateway {
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseSessionGateway for MumbleGateway {
    async fn send_to_user(&self, session: Session, text: &str) -> Result<()> {
        self.0
            .send_to_user(session, text)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn find_channel(&self, path: &[String]) -> Option<ChannelId> {
        self.0.find_channel(path)
    }

    async fn move_self(&self, channel: ChannelId) -> Result<()> {
        self.0
            .move_self(channel)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// BotDeps
// =============================================================================

/// Dependencies accessible to presence effects
#[derive(Clone)]
pub struct BotDeps {
    pub gateway: Arc<dyn BaseSessionGateway>,
}

impl BotDeps {
    pub fn new(gateway: Arc<dyn BaseSessionGateway>) -> Self {
        Self { gateway }
    }
}
