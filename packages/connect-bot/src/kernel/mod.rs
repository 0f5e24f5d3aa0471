//! Kernel module - session infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{BotDeps, MumbleGateway};
pub use traits::BaseSessionGateway;
