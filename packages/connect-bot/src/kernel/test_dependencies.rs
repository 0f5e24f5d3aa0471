// TestDependencies - mock implementations for testing
//
// Provides a mock session gateway that can be injected into BotDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use mumble::{ChannelId, Session};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BaseSessionGateway, BotDeps};

// =============================================================================
// Mock Session Gateway
// =============================================================================

/// One gateway call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FindChannel(Vec<String>),
    MoveSelf(ChannelId),
    SendToUser { to: Session, text: String },
}

#[derive(Clone, Default)]
pub struct MockGateway {
    channels: Arc<Mutex<HashMap<Vec<String>, ChannelId>>>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    fail_sends: Arc<Mutex<bool>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `path` resolve to `channel`
    pub fn with_channel(self, path: &[&str], channel: ChannelId) -> Self {
        let key = path.iter().map(|s| s.to_string()).collect();
        self.channels.lock().unwrap().insert(key, channel);
        self
    }

    /// Make every send_to_user call fail
    pub fn failing_sends(self) -> Self {
        *self.fail_sends.lock().unwrap() = true;
        self
    }

    /// Wrap this mock in BotDeps
    pub fn deps(&self) -> Arc<BotDeps> {
        Arc::new(BotDeps::new(Arc::new(self.clone())))
    }

    /// Get every call made so far
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get all (recipient, text) pairs that were sent
    pub fn sent(&self) -> Vec<(Session, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                GatewayCall::SendToUser { to, text } => Some((*to, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Get every channel the bot was moved into
    pub fn moves(&self) -> Vec<ChannelId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                GatewayCall::MoveSelf(channel) => Some(*channel),
                _ => None,
            })
            .collect()
    }

    /// Get the texts sent to one session
    pub fn sent_to(&self, session: Session) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == session)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl BaseSessionGateway for MockGateway {
    async fn send_to_user(&self, session: Session, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(GatewayCall::SendToUser {
            to: session,
            text: text.to_string(),
        });
        if *self.fail_sends.lock().unwrap() {
            anyhow::bail!("mock send failure");
        }
        Ok(())
    }

    async fn find_channel(&self, path: &[String]) -> Option<ChannelId> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::FindChannel(path.to_vec()));
        self.channels.lock().unwrap().get(path).copied()
    }

    async fn move_self(&self, channel: ChannelId) -> Result<()> {
        self.calls.lock().unwrap().push(GatewayCall::MoveSelf(channel));
        Ok(())
    }
}
