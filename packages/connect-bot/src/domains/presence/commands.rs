use mumble::Session;

/// Presence commands - IO requested by the presence machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceCommand {
    /// Move into the configured channel (if any), then wait for the move to
    /// settle before handling further events.
    EnterTargetChannel { path: Vec<String> },

    /// Confirm a received connect string to whoever sent it.
    Reply { to: Session, name: String, text: String },

    /// Hand the current connect string to someone who just arrived.
    Greet { to: Session, name: String, text: String },
}
