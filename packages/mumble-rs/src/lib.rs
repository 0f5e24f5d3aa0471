//! # mumble
//!
//! A small, text-only client for the Mumble control channel.
//!
//! It does exactly what a chat bot needs and nothing more: dial over TLS,
//! authenticate, keep a live roster of channels and users, deliver an
//! ordered stream of [`Event`]s, and send text messages or move itself
//! between channels. There is no audio and no UDP.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use mumble::{ClientConfig, Event, TlsOptions};
//!
//! let (client, mut events) = mumble::connect(ClientConfig {
//!     address: "localhost:64738".into(),
//!     username: "bot".into(),
//!     password: None,
//!     tls: TlsOptions { insecure: true, ..Default::default() },
//! })
//! .await?;
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         Event::TextMessage { sender: Some(user), message } => {
//!             client.send_to_user(user.session, &format!("echo: {}", message))?;
//!         }
//!         Event::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Ordering
//!
//! Roster updates are applied before the corresponding event is emitted, so
//! an event's `own_channel` view already reflects the change it describes.

pub mod client;
pub mod codec;
pub mod error;
pub mod event;
pub mod proto;
pub mod roster;
pub mod tls;

pub use client::{connect, parse_address, Client, ClientConfig, EventStream, DEFAULT_PORT};
pub use error::{MumbleError, Result};
pub use event::{Event, UserChange};
pub use roster::{Channel, ChannelId, ChannelView, Roster, Session, User, ROOT_CHANNEL};
pub use tls::TlsOptions;
