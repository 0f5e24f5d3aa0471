//! Session establishment and the background reader/writer/keepalive tasks.

use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::{SinkExt, Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use rustls::pki_types::ServerName;

use crate::codec::ControlCodec;
use crate::error::{MumbleError, Result};
use crate::event::{Event, UserChange};
use crate::proto::{self, ControlMessage, CLIENT_VERSION};
use crate::roster::{ChannelId, ChannelView, Roster, Session};
use crate::tls::{self, TlsOptions};

/// Port used when the address does not name one.
pub const DEFAULT_PORT: u16 = 64738;

/// How often a keepalive ping is sent. Servers drop clients after 30s of
/// silence.
pub const PING_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub struct ClientConfig {
    /// `host:port`, `host`, or `[v6]:port`
    pub address: String,
    pub username: String,
    pub password: Option<SecretString>,
    pub tls: TlsOptions,
}

enum Outgoing {
    Message(ControlMessage),
    Close,
}

/// Handle to a live session. Cheap to clone; all clones share the session.
#[derive(Clone)]
pub struct Client {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    roster: Arc<RwLock<Roster>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("own_session", &self.own_session())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Send a private text message to one user.
    pub fn send_to_user(&self, session: Session, text: &str) -> Result<()> {
        self.send(ControlMessage::TextMessage(proto::TextMessage {
            actor: None,
            session: vec![session],
            channel_id: Vec::new(),
            tree_id: Vec::new(),
            message: text.to_string(),
        }))
    }

    /// Ask the server to move us into `channel`.
    ///
    /// The move is confirmed asynchronously by a `UserState` for our own
    /// session, which arrives as a regular `UserChanged` event.
    pub fn move_self(&self, channel: ChannelId) -> Result<()> {
        let session = self.own_session().ok_or(MumbleError::Closed)?;
        self.send(ControlMessage::UserState(proto::UserState {
            session: Some(session),
            channel_id: Some(channel),
            ..Default::default()
        }))
    }

    pub fn find_channel<S: AsRef<str>>(&self, path: &[S]) -> Option<ChannelId> {
        self.read_roster(|roster| roster.find_channel(path))
    }

    pub fn own_session(&self) -> Option<Session> {
        self.read_roster(|roster| roster.own_session())
    }

    pub fn own_channel(&self) -> Option<ChannelView> {
        self.read_roster(|roster| roster.own_channel())
    }

    pub fn occupants(&self, channel: ChannelId) -> usize {
        self.read_roster(|roster| roster.occupants(channel))
    }

    /// Copy of the roster as it stands now.
    pub fn snapshot(&self) -> Roster {
        self.read_roster(Roster::clone)
    }

    /// Close the session. The event stream ends with `Disconnected`.
    pub fn disconnect(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }

    fn send(&self, message: ControlMessage) -> Result<()> {
        self.outgoing
            .send(Outgoing::Message(message))
            .map_err(|_| MumbleError::Closed)
    }

    fn read_roster<T>(&self, f: impl FnOnce(&Roster) -> T) -> T {
        match self.roster.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

/// Ordered stream of session events. Ends after `Event::Disconnected`.
pub struct EventStream {
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().events.poll_recv(cx)
    }
}

/// Split `host:port`, falling back to [`DEFAULT_PORT`] when no port is given.
pub fn parse_address(address: &str) -> Result<(String, u16)> {
    let invalid = || MumbleError::InvalidAddress(address.to_string());

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None if tail.is_empty() => DEFAULT_PORT,
            None => return Err(invalid()),
        };
        return Ok((host.to_string(), port));
    }

    match address.split_once(':') {
        // More than one colon: a bare IPv6 literal
        Some((_, rest)) if rest.contains(':') => Ok((address.to_string(), DEFAULT_PORT)),
        Some((host, port)) => {
            let port = port.parse().map_err(|_| invalid())?;
            Ok((host.to_string(), port))
        }
        None if address.is_empty() => Err(invalid()),
        None => Ok((address.to_string(), DEFAULT_PORT)),
    }
}

/// Dial, authenticate and wait for the server to finish synchronizing.
///
/// Returns once `ServerSync` arrives, with a fully populated roster. The
/// first item on the returned stream is `Event::Connected`.
pub async fn connect(config: ClientConfig) -> Result<(Client, EventStream)> {
    let tls_config = tls::client_config(&config.tls)?;
    let (host, port) = parse_address(&config.address)?;
    let server_name = ServerName::try_from(host.clone())
        .map_err(|_| MumbleError::InvalidAddress(config.address.clone()))?;

    debug!(%host, port, "dialing mumble server");
    let tcp = TcpStream::connect((host.as_str(), port)).await?;
    tcp.set_nodelay(true)?;
    let tls_stream = TlsConnector::from(Arc::new(tls_config))
        .connect(server_name, tcp)
        .await?;

    let mut framed = Framed::new(tls_stream, ControlCodec);

    framed
        .send(ControlMessage::Version(proto::Version {
            version: Some(CLIENT_VERSION),
            release: Some(concat!("mumble-rs ", env!("CARGO_PKG_VERSION")).to_string()),
            os: Some(std::env::consts::OS.to_string()),
            os_version: None,
        }))
        .await?;
    framed
        .send(ControlMessage::Authenticate(proto::Authenticate {
            username: Some(config.username.clone()),
            password: config
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string()),
            tokens: Vec::new(),
            celt_versions: Vec::new(),
            opus: Some(true),
        }))
        .await?;

    let mut roster = Roster::new();
    loop {
        match framed.next().await {
            None => return Err(MumbleError::Closed),
            Some(Err(e)) => return Err(e),
            Some(Ok(ControlMessage::ServerSync(sync))) => {
                let session = sync.session.ok_or_else(|| {
                    MumbleError::Protocol("ServerSync without session".to_string())
                })?;
                roster.set_own_session(session);
                break;
            }
            Some(Ok(ControlMessage::Reject(reject))) => {
                return Err(MumbleError::Rejected {
                    reason: reject.reason.unwrap_or_default(),
                });
            }
            Some(Ok(message)) => {
                apply_silently(&mut roster, &message);
            }
        }
    }

    info!(
        username = %config.username,
        session = ?roster.own_session(),
        "mumble session synchronized"
    );

    let roster = Arc::new(RwLock::new(roster));
    let (sink, stream) = framed.split();
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let _ = event_tx.send(Event::Connected);

    tokio::spawn(write_loop(sink, outgoing_rx));
    tokio::spawn(ping_loop(outgoing_tx.clone()));
    tokio::spawn(read_loop(
        stream,
        roster.clone(),
        event_tx,
        outgoing_tx.clone(),
    ));

    Ok((
        Client {
            outgoing: outgoing_tx,
            roster,
        },
        EventStream { events: event_rx },
    ))
}

/// Roster bookkeeping during the initial sync, before events are delivered.
fn apply_silently(roster: &mut Roster, message: &ControlMessage) {
    match message {
        ControlMessage::ChannelState(state) => roster.apply_channel_state(state),
        ControlMessage::ChannelRemove(remove) => {
            roster.remove_channel(remove.channel_id);
        }
        ControlMessage::UserState(state) => {
            roster.apply_user_state(state);
        }
        ControlMessage::UserRemove(remove) => {
            roster.remove_user(remove.session);
        }
        _ => {}
    }
}

type ControlSink = futures::stream::SplitSink<
    Framed<tokio_rustls::client::TlsStream<TcpStream>, ControlCodec>,
    ControlMessage,
>;
type ControlStream =
    futures::stream::SplitStream<Framed<tokio_rustls::client::TlsStream<TcpStream>, ControlCodec>>;

async fn write_loop(mut sink: ControlSink, mut outgoing: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(item) = outgoing.recv().await {
        match item {
            Outgoing::Message(message) => {
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "failed to write to mumble server");
                    break;
                }
            }
            Outgoing::Close => {
                debug!("closing mumble session");
                break;
            }
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "error while closing mumble session");
    }
}

async fn ping_loop(outgoing: mpsc::UnboundedSender<Outgoing>) {
    let mut interval = tokio::time::interval(PING_INTERVAL);
    interval.tick().await;
    loop {
        interval.tick().await;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let ping = ControlMessage::Ping(proto::Ping {
            timestamp: Some(timestamp),
        });
        if outgoing.send(Outgoing::Message(ping)).is_err() {
            break;
        }
    }
}

async fn read_loop(
    mut stream: ControlStream,
    roster: Arc<RwLock<Roster>>,
    events: mpsc::UnboundedSender<Event>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
) {
    let reason = loop {
        let message = match stream.next().await {
            None => break "server closed the connection".to_string(),
            Some(Err(e)) => break e.to_string(),
            Some(Ok(message)) => message,
        };

        if let ControlMessage::Reject(reject) = &message {
            break format!("rejected: {}", reject.reason.clone().unwrap_or_default());
        }

        let event = {
            let mut roster = match roster.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            translate(&mut roster, message)
        };

        if let Some(event) = event {
            if events.send(event).is_err() {
                break "event stream dropped".to_string();
            }
        }
    };

    info!(%reason, "mumble session ended");
    let _ = outgoing.send(Outgoing::Close);
    let _ = events.send(Event::Disconnected { reason });
}

/// Apply a message to the roster and produce the event it implies, if any.
fn translate(roster: &mut Roster, message: ControlMessage) -> Option<Event> {
    match message {
        ControlMessage::UserState(state) => {
            let (user, change) = roster.apply_user_state(&state)?;
            Some(Event::UserChanged {
                user,
                change,
                own_channel: roster.own_channel(),
            })
        }
        ControlMessage::UserRemove(remove) => {
            let user = roster.remove_user(remove.session)?;
            Some(Event::UserChanged {
                user,
                change: UserChange::DISCONNECTED,
                own_channel: roster.own_channel(),
            })
        }
        ControlMessage::TextMessage(text) => {
            let sender = text.actor.and_then(|actor| roster.user(actor).cloned());
            Some(Event::TextMessage {
                sender,
                message: text.message,
            })
        }
        ControlMessage::ChannelState(state) => {
            roster.apply_channel_state(&state);
            None
        }
        ControlMessage::ChannelRemove(remove) => {
            roster.remove_channel(remove.channel_id);
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{ChannelState, UserRemove, UserState};

    fn synced_roster() -> Roster {
        let mut roster = Roster::new();
        roster.apply_channel_state(&ChannelState {
            channel_id: Some(0),
            parent: None,
            name: Some("Root".to_string()),
        });
        roster.apply_channel_state(&ChannelState {
            channel_id: Some(1),
            parent: Some(0),
            name: Some("Games".to_string()),
        });
        roster.apply_user_state(&UserState {
            session: Some(1),
            name: Some("_ConnectBot".to_string()),
            channel_id: Some(1),
            ..Default::default()
        });
        roster.set_own_session(1);
        roster
    }

    #[test]
    fn parses_host_and_port() {
        assert_eq!(
            parse_address("voice.example.org:1234").unwrap(),
            ("voice.example.org".to_string(), 1234)
        );
        assert_eq!(
            parse_address("localhost").unwrap(),
            ("localhost".to_string(), DEFAULT_PORT)
        );
        assert_eq!(
            parse_address("[::1]:5000").unwrap(),
            ("::1".to_string(), 5000)
        );
        assert_eq!(parse_address("[::1]").unwrap(), ("::1".to_string(), DEFAULT_PORT));
        assert_eq!(parse_address("::1").unwrap(), ("::1".to_string(), DEFAULT_PORT));
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(parse_address("").is_err());
        assert!(parse_address("host:port").is_err());
        assert!(parse_address("[::1:80").is_err());
    }

    #[test]
    fn arrival_event_carries_post_change_occupancy() {
        let mut roster = synced_roster();
        let event = translate(
            &mut roster,
            ControlMessage::UserState(UserState {
                session: Some(5),
                name: Some("Alice".to_string()),
                channel_id: Some(1),
                ..Default::default()
            }),
        )
        .unwrap();

        match event {
            Event::UserChanged {
                user,
                change,
                own_channel,
            } => {
                assert_eq!(user.name, "Alice");
                assert!(change.has(UserChange::CONNECTED));
                assert!(change.has(UserChange::CHANNEL));
                let own = own_channel.unwrap();
                assert_eq!(own.id, 1);
                assert_eq!(own.user_count, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn removal_event_excludes_departed_user() {
        let mut roster = synced_roster();
        translate(
            &mut roster,
            ControlMessage::UserState(UserState {
                session: Some(5),
                name: Some("Alice".to_string()),
                channel_id: Some(1),
                ..Default::default()
            }),
        );

        let event = translate(
            &mut roster,
            ControlMessage::UserRemove(UserRemove {
                session: 5,
                ..Default::default()
            }),
        )
        .unwrap();

        match event {
            Event::UserChanged {
                user,
                change,
                own_channel,
            } => {
                assert_eq!(user.session, 5);
                assert_eq!(change, UserChange::DISCONNECTED);
                assert_eq!(own_channel.unwrap().user_count, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn removal_of_unknown_session_is_silent() {
        let mut roster = synced_roster();
        let event = translate(
            &mut roster,
            ControlMessage::UserRemove(UserRemove {
                session: 99,
                ..Default::default()
            }),
        );
        assert!(event.is_none());
    }

    #[test]
    fn text_message_resolves_sender() {
        let mut roster = synced_roster();
        roster.apply_user_state(&UserState {
            session: Some(5),
            name: Some("Alice".to_string()),
            channel_id: Some(1),
            ..Default::default()
        });

        let event = translate(
            &mut roster,
            ControlMessage::TextMessage(proto::TextMessage {
                actor: Some(5),
                session: vec![1],
                channel_id: Vec::new(),
                tree_id: Vec::new(),
                message: "please connect me".to_string(),
            }),
        );

        match event {
            Some(Event::TextMessage { sender, message }) => {
                assert_eq!(sender.unwrap().name, "Alice");
                assert_eq!(message, "please connect me");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn server_text_message_has_no_sender() {
        let mut roster = synced_roster();
        let event = translate(
            &mut roster,
            ControlMessage::TextMessage(proto::TextMessage {
                actor: None,
                session: Vec::new(),
                channel_id: vec![1],
                tree_id: Vec::new(),
                message: "maintenance at noon".to_string(),
            }),
        );
        assert!(matches!(
            event,
            Some(Event::TextMessage { sender: None, .. })
        ));
    }

    #[test]
    fn channel_updates_produce_no_events() {
        let mut roster = synced_roster();
        let event = translate(
            &mut roster,
            ControlMessage::ChannelState(ChannelState {
                channel_id: Some(2),
                parent: Some(1),
                name: Some("Lobby".to_string()),
            }),
        );
        assert!(event.is_none());
        assert_eq!(roster.find_channel(&["Games", "Lobby"]), Some(2));
    }
}
