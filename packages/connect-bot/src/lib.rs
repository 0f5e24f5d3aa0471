// Connect Bot - Core
//
// Sits in a Mumble channel holding a "connect string" and privately sends it
// to everyone who joins. Users arm it by messaging the bot a text containing
// "connect"; it falls back to the configured default when left alone.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod runtime;

pub use config::*;
