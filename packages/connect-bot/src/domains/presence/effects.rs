use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::commands::PresenceCommand;
use crate::kernel::BotDeps;
use crate::runtime::{Effect, EffectContext};

/// Pause after entering the target channel so the server's own view of the
/// move arrives before we react to anything else.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Presence effect - moves the bot and delivers connect strings
///
/// Delivery failures are logged and absorbed; nothing is retried.
pub struct PresenceEffect;

#[async_trait]
impl Effect<PresenceCommand, BotDeps> for PresenceEffect {
    async fn execute(&self, cmd: PresenceCommand, ctx: EffectContext<BotDeps>) -> Result<()> {
        let gateway = &ctx.deps().gateway;

        match cmd {
            PresenceCommand::EnterTargetChannel { path } => {
                if !path.is_empty() {
                    match gateway.find_channel(&path).await {
                        Some(channel) => {
                            info!(path = ?path, channel, "moving to target channel");
                            if let Err(e) = gateway.move_self(channel).await {
                                warn!(error = %e, "failed to move to target channel");
                            }
                        }
                        None => warn!(path = ?path, "target channel not found, staying put"),
                    }
                }

                tokio::time::sleep(SETTLE_DELAY).await;
                debug!("settled");
                Ok(())
            }

            PresenceCommand::Reply { to, name, text } => {
                if let Err(e) = gateway.send_to_user(to, &text).await {
                    warn!(user = %name, error = %e, "failed to confirm connect string");
                }
                Ok(())
            }

            PresenceCommand::Greet { to, name, text } => {
                match gateway.send_to_user(to, &text).await {
                    Ok(()) => debug!(user = %name, "connect string delivered"),
                    Err(e) => warn!(user = %name, error = %e, "failed to send connect string"),
                }
                Ok(())
            }
        }
    }
}
