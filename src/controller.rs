//! Connection lifecycle and reconnection state machine.
//!
//! [`ConnectionController`] owns the socket, runs the authentication
//! handshake, dispatches server commands to the [`Renderer`], and schedules
//! bounded automatic reconnects. It is driven by a single owner: call
//! [`next_event`](ConnectionController::next_event) to wait for the next
//! socket frame, socket close, or due retry, then apply it with
//! [`handle_event`](ConnectionController::handle_event).
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::new();
//! let mut controller = ConnectionController::websocket(config, Box::new(MyRenderer));
//! controller.connect("localhost", "Alice", None).await?;
//!
//! loop {
//!     tokio::select! {
//!         line = input.next_line() => router.submit(&line?, &mut controller).await,
//!         event = controller.next_event() => controller.handle_event(event).await,
//!     }
//! }
//! ```
//!
//! # Reconnection
//!
//! When the socket closes, a retry is scheduled after
//! [`ClientConfig::reconnect_delay`] unless the user disconnected, the
//! server refused our credentials, or there is no target address. Each
//! retry counts as one attempt; once attempts exceed
//! [`ClientConfig::max_reconnect_attempts`] the controller reports the loss
//! and waits for a manual [`connect`](ConnectionController::connect).

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{ConsoleError, Result};
use crate::identity::{self, ClientIdStore, MemoryClientIdStore};
use crate::names::{NameResolver, NameTable};
use crate::protocol::{
    decode_frame, encode_frame, ClientCommand, NetworkVersion, ServerCommand, CLIENT_TAGS,
    GAME_NAME, INVALID_PASSWORD,
};
use crate::render::{resolve_parts, ConnectionStatus, PlayerContext, Renderer};
use crate::session::{ReconnectState, Session};
use crate::transport::{Connector, Transport};

/// Port appended to addresses that do not name one.
pub const DEFAULT_SERVER_PORT: u16 = 38281;

/// Default cap on consecutive automatic reconnects.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Default wait between a close and the next automatic reconnect.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default limit for opening a socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shown when an open socket fails and when automatic reconnects run out.
pub const CONNECTION_LOST_MESSAGE: &str = "Archipelago server connection lost. The connection \
     closed unexpectedly. Please try to reconnect, or restart the client.";

/// Shown when the room needs a password and none was given.
pub const PASSWORD_REQUIRED_MESSAGE: &str = "A password is required to connect to the server. \
     Please use /connect [server] [player] [password]";

/// Shown when the given password was wrong.
pub const PASSWORD_REJECTED_MESSAGE: &str = "The password you provided was rejected by the server.";

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`ConnectionController`].
///
/// # Example
///
/// ```
/// use archipelago_console::controller::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_max_reconnect_attempts(3)
///     .with_reconnect_delay(Duration::from_secs(1));
/// assert_eq!(config.default_port, 38281);
/// assert_eq!(config.max_reconnect_attempts, 3);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Port used when an address does not name one. Defaults to **38281**.
    pub default_port: u16,
    /// Automatic reconnects allowed before giving up. Defaults to **10**.
    pub max_reconnect_attempts: u32,
    /// Wait between a close and the next reconnect. Defaults to **5 seconds**.
    pub reconnect_delay: Duration,
    /// Limit for opening a socket. Defaults to **10 seconds**.
    pub connect_timeout: Duration,
    /// Game name sent in `Connect`.
    pub game: String,
    /// Tags sent in `Connect`.
    pub tags: Vec<String>,
    pub protocol_version: NetworkVersion,
    /// Lines kept for input recall. Defaults to **10**.
    pub history_capacity: usize,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            default_port: DEFAULT_SERVER_PORT,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            game: GAME_NAME.to_string(),
            tags: CLIENT_TAGS.iter().map(ToString::to_string).collect(),
            protocol_version: NetworkVersion::CURRENT,
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Address handling ────────────────────────────────────────────────

/// Normalize a user-supplied server address.
///
/// Strips a leading `/connect ` and appends `:<default_port>` when the
/// address does not end in `:<digits>`. Returns `None` for an empty address.
///
/// ```
/// use archipelago_console::controller::normalize_address;
///
/// assert_eq!(normalize_address("example.com", 38281).as_deref(), Some("example.com:38281"));
/// assert_eq!(normalize_address("/connect localhost:1234", 38281).as_deref(), Some("localhost:1234"));
/// assert_eq!(normalize_address("  ", 38281), None);
/// ```
pub fn normalize_address(address: &str, default_port: u16) -> Option<String> {
    let address = address.trim();
    let address = address.strip_prefix("/connect ").unwrap_or(address).trim();
    if address.is_empty() {
        return None;
    }
    if has_port(address) {
        Some(address.to_string())
    } else {
        Some(format!("{address}:{default_port}"))
    }
}

fn has_port(address: &str) -> bool {
    address.rsplit_once(':').is_some_and(|(_, port)| {
        !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Socket URL for a normalized address; `ws://` unless a scheme is given.
pub fn server_url(address: &str) -> String {
    if address.starts_with("ws://") || address.starts_with("wss://") {
        address.to_string()
    } else {
        format!("ws://{address}")
    }
}

// ── Events ──────────────────────────────────────────────────────────

/// Something the controller has to react to.
#[derive(Debug)]
pub enum ControllerEvent {
    /// A text frame arrived on the socket.
    Frame(String),
    /// The server closed the socket.
    Closed,
    /// The socket failed.
    SocketError(ConsoleError),
    /// The scheduled reconnect is due.
    RetryDue,
}

// ── Controller ──────────────────────────────────────────────────────

/// Owns the socket and the session, and decides when to reconnect.
pub struct ConnectionController {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    renderer: Box<dyn Renderer>,
    names: Box<dyn NameResolver>,
    id_store: Box<dyn ClientIdStore>,
    client_id: Option<String>,
    socket: Option<Box<dyn Transport>>,
    /// Normalized address of the current connection target.
    target: Option<String>,
    session: Session,
    reconnect: ReconnectState,
    status: ConnectionStatus,
}

impl ConnectionController {
    /// Create a disconnected controller.
    ///
    /// Names resolve through a fresh [`NameTable`] and the client id is kept
    /// in memory until [`with_id_store`](Self::with_id_store) says otherwise.
    pub fn new(
        config: ClientConfig,
        connector: Box<dyn Connector>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            connector,
            renderer,
            names: Box::new(NameTable::new()),
            id_store: Box::new(MemoryClientIdStore::new()),
            client_id: None,
            socket: None,
            target: None,
            session: Session::default(),
            reconnect: ReconnectState::default(),
            status: ConnectionStatus::Disconnected,
        }
    }

    /// Create a controller that opens WebSocket connections.
    #[cfg(feature = "transport-websocket")]
    pub fn websocket(config: ClientConfig, renderer: Box<dyn Renderer>) -> Self {
        let connector = crate::transports::WebSocketConnector::new(config.connect_timeout);
        Self::new(config, Box::new(connector), renderer)
    }

    #[must_use]
    pub fn with_name_resolver(mut self, names: Box<dyn NameResolver>) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_id_store(mut self, store: Box<dyn ClientIdStore>) -> Self {
        self.id_store = store;
        self.client_id = None;
        self
    }

    // ── Public API ──────────────────────────────────────────────────

    /// Connect to `address` as `player_name`.
    ///
    /// Closes any open socket first and starts a fresh reconnection budget.
    /// A socket that fails to open is handled like one that closed, so the
    /// usual automatic retries apply. Opening waits for the [`Connector`],
    /// bounded by [`ClientConfig::connect_timeout`] for the WebSocket one.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidAddress`] if `address` is empty. The
    /// previous socket is closed and automatic reconnection has no target.
    pub async fn connect(
        &mut self,
        address: &str,
        player_name: &str,
        password: Option<&str>,
    ) -> Result<()> {
        self.cancel_retry();
        self.close_socket().await;

        let Some(target) = normalize_address(address, self.config.default_port) else {
            self.target = None;
            self.set_status(ConnectionStatus::Disconnected);
            return Err(ConsoleError::InvalidAddress(address.to_string()));
        };

        self.reconnect.suppressed = false;
        self.reconnect.attempts = 0;
        self.session.player_name = player_name.to_string();
        self.session.password = password.map(str::to_string);
        self.target = Some(target);
        self.open_socket().await;
        Ok(())
    }

    /// Send chat text. Does nothing unless the socket is open.
    pub async fn send(&mut self, text: &str) {
        if self.socket.is_none() {
            debug!("not connected, dropping chat message");
            return;
        }
        self.transmit(&[ClientCommand::Say {
            text: text.to_string(),
        }])
        .await;
    }

    /// Close the socket.
    ///
    /// A user-initiated disconnect also cancels any pending retry and blocks
    /// automatic reconnection until the next [`connect`](Self::connect).
    /// Otherwise the close is treated like a dropped connection.
    pub async fn disconnect(&mut self, user_initiated: bool) {
        if user_initiated {
            self.reconnect.suppressed = true;
            self.cancel_retry();
        }
        if self.close_socket().await {
            self.handle_close();
        } else {
            self.set_status(ConnectionStatus::Disconnected);
        }
    }

    /// Show a line of text through the renderer.
    pub fn display(&mut self, text: &str) {
        self.renderer.display(text);
    }

    /// Wait for the next socket frame, socket close, or due retry.
    ///
    /// # Cancel Safety
    ///
    /// This method is cancel-safe as long as the [`Transport`] is: it only
    /// awaits `Transport::recv` and a timer recreated from the stored
    /// deadline. It waits forever when there is neither a socket nor a
    /// pending retry.
    pub async fn next_event(&mut self) -> ControllerEvent {
        let retry_at = self.reconnect.retry_at;
        let retry = async move {
            match retry_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        match self.socket.as_mut() {
            Some(socket) => tokio::select! {
                incoming = socket.recv() => match incoming {
                    Some(Ok(text)) => ControllerEvent::Frame(text),
                    Some(Err(e)) => ControllerEvent::SocketError(e),
                    None => ControllerEvent::Closed,
                },
                () = retry => ControllerEvent::RetryDue,
            },
            None => {
                retry.await;
                ControllerEvent::RetryDue
            }
        }
    }

    /// Apply an event returned by [`next_event`](Self::next_event).
    ///
    /// A due retry awaits the [`Connector`] inline, which can take up to
    /// [`ClientConfig::connect_timeout`]. Front ends that must stay
    /// responsive meanwhile should race this future against their own
    /// shutdown signal. Dropping it mid-open leaves no socket and no retry
    /// scheduled until the next [`connect`](Self::connect).
    pub async fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Frame(text) => self.handle_frame(&text).await,
            ControllerEvent::Closed => {
                debug!("socket closed by server");
                self.close_socket().await;
                self.handle_close();
            }
            ControllerEvent::SocketError(e) => self.handle_socket_error(e).await,
            ControllerEvent::RetryDue => self.handle_retry().await,
        }
    }

    /// Wait for the next event and apply it.
    ///
    /// Not cancel-safe; use [`next_event`](Self::next_event) inside `select!`.
    pub async fn process_next(&mut self) {
        let event = self.next_event().await;
        self.handle_event(event).await;
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn reconnect_state(&self) -> &ReconnectState {
        &self.reconnect
    }

    /// Returns `true` while a socket is open.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub fn has_pending_retry(&self) -> bool {
        self.reconnect.is_pending()
    }

    /// Normalized address of the current connection target.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn names(&self) -> &dyn NameResolver {
        self.names.as_ref()
    }

    // ── Socket lifecycle ────────────────────────────────────────────

    async fn open_socket(&mut self) {
        let Some(target) = self.target.clone() else {
            return;
        };
        // Never two sockets at once.
        self.close_socket().await;
        self.session.auth_error = false;
        self.set_status(ConnectionStatus::Connecting);

        let url = server_url(&target);
        match self.connector.connect(&url).await {
            Ok(socket) => {
                info!(url = %url, "socket open");
                self.socket = Some(socket);
                self.renderer
                    .display(&format!("Connected to Archipelago server at {target}"));
            }
            Err(e) => {
                warn!(url = %url, "failed to open socket: {e}");
                self.handle_close();
            }
        }
    }

    /// Close and drop the socket. Returns `false` if none was open.
    async fn close_socket(&mut self) -> bool {
        let Some(mut socket) = self.socket.take() else {
            return false;
        };
        if let Err(e) = socket.close().await {
            debug!("error while closing socket: {e}");
        }
        true
    }

    /// React to the socket going away, scheduling a retry when allowed.
    fn handle_close(&mut self) {
        self.set_status(ConnectionStatus::Disconnected);

        if self.reconnect.suppressed {
            debug!("reconnect suppressed by user disconnect");
            return;
        }
        if self.session.auth_error {
            debug!("not reconnecting after authentication failure");
            return;
        }
        if self.target.as_deref().is_none_or(str::is_empty) {
            debug!("no target address, not reconnecting");
            return;
        }

        self.cancel_retry();
        self.reconnect.retry_at = Some(Instant::now() + self.config.reconnect_delay);
        debug!(delay = ?self.config.reconnect_delay, "reconnect scheduled");
    }

    async fn handle_socket_error(&mut self, e: ConsoleError) {
        error!("socket error: {e}");
        if self.socket.is_none() {
            return;
        }
        self.renderer.display(CONNECTION_LOST_MESSAGE);
        self.close_socket().await;
        self.handle_close();
    }

    async fn handle_retry(&mut self) {
        self.reconnect.retry_at = None;

        // A manual connect may have won the race.
        if self.socket.is_some() {
            debug!("retry skipped, socket already open");
            return;
        }
        if self.reconnect.suppressed || self.session.auth_error {
            debug!("retry skipped, reconnection suppressed");
            return;
        }

        self.reconnect.attempts = self.reconnect.attempts.saturating_add(1);
        let attempt = self.reconnect.attempts;
        let max = self.config.max_reconnect_attempts;
        if attempt > max {
            warn!("giving up after {max} reconnect attempts");
            self.renderer.display(CONNECTION_LOST_MESSAGE);
            return;
        }

        info!(attempt, max, "reconnecting");
        self.renderer.display(&format!(
            "Connection to AP server lost. Attempting to reconnect ({attempt} of {max})"
        ));
        self.open_socket().await;
    }

    fn cancel_retry(&mut self) {
        if self.reconnect.retry_at.take().is_some() {
            debug!("pending reconnect cancelled");
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            debug!(from = ?self.status, to = ?status, "status changed");
            self.status = status;
            self.renderer.set_status(status);
        }
    }

    /// Encode and send `commands`. A failed send is handled as a socket error.
    async fn transmit(&mut self, commands: &[ClientCommand]) {
        let Some(socket) = self.socket.as_mut() else {
            debug!("no open socket, dropping outbound frame");
            return;
        };
        let frame = match encode_frame(commands) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode outbound frame: {e}");
                return;
            }
        };
        if let Err(e) = socket.send(frame).await {
            self.handle_socket_error(e).await;
        }
    }

    // ── Inbound dispatch ────────────────────────────────────────────

    async fn handle_frame(&mut self, text: &str) {
        let commands = match decode_frame(text) {
            Ok(commands) => commands,
            Err(e) => {
                warn!("failed to decode server frame: {e} (raw: {text})");
                self.renderer
                    .display(&format!("Received a malformed message from the server: {e}"));
                return;
            }
        };
        for command in commands {
            // A failed send mid-frame closes the socket; the rest is stale.
            if self.socket.is_none() {
                debug!("socket lost mid-frame, dropping remaining commands");
                break;
            }
            self.dispatch(command).await;
        }
    }

    async fn dispatch(&mut self, command: ServerCommand) {
        debug!(cmd = command.name(), "server command");
        match command {
            ServerCommand::RoomInfo {
                password,
                seed_name,
                version,
            } => {
                debug!(password, ?seed_name, ?version, "room info");
                self.authenticate().await;
            }
            ServerCommand::Connected {
                team,
                slot,
                players,
            } => {
                if self.socket.is_none() {
                    return;
                }
                info!(team, slot, players = players.len(), "authenticated");
                self.reconnect.attempts = 0;
                self.session.players = players;
                self.session.team = Some(team);
                self.session.slot = Some(slot);
                self.session.address = self.target.clone();
                self.set_status(ConnectionStatus::Connected);
                self.transmit(&[ClientCommand::GetDataPackage]).await;
            }
            ServerCommand::ConnectionRefused { errors } => self.handle_refused(&errors).await,
            ServerCommand::Print { text } => self.renderer.display(&text),
            ServerCommand::PrintJson { data } => {
                let context = PlayerContext {
                    players: &self.session.players,
                    own_slot: self.session.slot,
                };
                let parts = resolve_parts(&data, self.names.as_ref(), context);
                self.renderer.display_formatted(&parts);
            }
            ServerCommand::DataPackage { data } => self.names.resolve_names(&data),
            ServerCommand::ReceivedItems {}
            | ServerCommand::LocationInfo {}
            | ServerCommand::RoomUpdate {}
            | ServerCommand::Bounced {}
            | ServerCommand::Unknown => {}
        }
    }

    async fn authenticate(&mut self) {
        let uuid = self.client_id();
        let connect = ClientCommand::Connect {
            game: self.config.game.clone(),
            name: self.session.player_name.clone(),
            uuid,
            tags: self.config.tags.clone(),
            password: self.session.password.clone(),
            version: self.config.protocol_version,
            items_handling: 0,
        };
        self.transmit(&[connect]).await;
    }

    async fn handle_refused(&mut self, errors: &[String]) {
        self.set_status(ConnectionStatus::Disconnected);
        if self.socket.is_none() {
            return;
        }

        warn!(?errors, "connection refused");
        let message = if errors.iter().any(|e| e == INVALID_PASSWORD) {
            if self.session.password.is_none() {
                PASSWORD_REQUIRED_MESSAGE.to_string()
            } else {
                PASSWORD_REJECTED_MESSAGE.to_string()
            }
        } else {
            format!("Error while connecting to AP server: {}.", errors.join(", "))
        };
        self.renderer.display(&message);

        self.session.auth_error = true;
        self.close_socket().await;
        self.handle_close();
    }

    /// The persistent client id, loaded on first use.
    fn client_id(&mut self) -> String {
        if let Some(id) = &self.client_id {
            return id.clone();
        }
        let id = identity::load_or_create(self.id_store.as_mut());
        self.client_id = Some(id.clone());
        id
    }
}

impl std::fmt::Debug for ConnectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionController")
            .field("status", &self.status)
            .field("target", &self.target)
            .field("open", &self.socket.is_some())
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn appends_default_port() {
        assert_eq!(
            normalize_address("example.com", DEFAULT_SERVER_PORT).as_deref(),
            Some("example.com:38281")
        );
        assert_eq!(
            normalize_address("archipelago.gg:52311", DEFAULT_SERVER_PORT).as_deref(),
            Some("archipelago.gg:52311")
        );
    }

    #[test]
    fn strips_connect_prefix() {
        assert_eq!(
            normalize_address("/connect localhost", 1234).as_deref(),
            Some("localhost:1234")
        );
    }

    #[test]
    fn trailing_colon_is_not_a_port() {
        assert_eq!(
            normalize_address("localhost:", 38281).as_deref(),
            Some("localhost::38281")
        );
    }

    #[test]
    fn empty_address_is_rejected() {
        assert_eq!(normalize_address("", 38281), None);
        assert_eq!(normalize_address("/connect ", 38281), None);
    }

    #[test]
    fn server_url_keeps_explicit_scheme() {
        assert_eq!(server_url("example.com:38281"), "ws://example.com:38281");
        assert_eq!(server_url("wss://example.com:443"), "wss://example.com:443");
    }

    #[test]
    fn secure_url_without_port_gets_default() {
        let address = normalize_address("wss://example.com", 38281).unwrap();
        assert_eq!(server_url(&address), "wss://example.com:38281");
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.default_port, 38281);
        assert_eq!(config.max_reconnect_attempts, 10);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.game, "Archipelago");
        assert_eq!(config.tags, vec!["TextOnly", "IgnoreGame", "Spectator"]);
        assert_eq!(config.protocol_version, NetworkVersion::new(0, 2, 4));
        assert_eq!(config.history_capacity, 10);
    }

    #[test]
    fn history_capacity_is_clamped_to_one() {
        assert_eq!(ClientConfig::new().with_history_capacity(0).history_capacity, 1);
    }
}
