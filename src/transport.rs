//! Socket abstraction for the Archipelago console client.
//!
//! The [`Transport`] trait is a bidirectional text channel: every call to
//! [`send`](Transport::send) writes one JSON frame and every call to
//! [`recv`](Transport::recv) yields one. The [`Connector`] trait opens a new
//! transport for a URL, which the controller needs because it reopens the
//! socket on its own when reconnecting.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use archipelago_console::error::ConsoleError;
//! use archipelago_console::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, frame: String) -> Result<(), ConsoleError> {
//!         // Write the JSON frame to the wire
//!         Ok(())
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, ConsoleError>> {
//!         // Return None when the server closed the connection cleanly
//!         None
//!     }
//!
//!     async fn close(&mut self) -> Result<(), ConsoleError> {
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::ConsoleError;

/// A bidirectional text frame transport.
///
/// # Object Safety
///
/// This trait is object-safe. The controller stores the live socket as a
/// `Box<dyn Transport>` so that a [`Connector`] can hand out any backend.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe. The controller's
/// `next_event` awaits it inside `tokio::select!` alongside the retry timer,
/// and front ends race `next_event` against user input. Dropping an
/// unfinished `recv` future must not lose a frame.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one JSON text frame to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::TransportSend`] if the frame could not be
    /// written, or [`ConsoleError::TransportClosed`] after [`close`](Transport::close).
    async fn send(&mut self, frame: String) -> Result<(), ConsoleError>;

    /// Receive the next JSON text frame from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete frame was received
    /// - `Some(Err(e))`: the socket failed
    /// - `None`: the server closed the connection
    async fn recv(&mut self) -> Option<Result<String, ConsoleError>>;

    /// Close the connection gracefully.
    ///
    /// Must be idempotent. Implementations should release resources even if
    /// the close handshake fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    async fn close(&mut self) -> Result<(), ConsoleError>;
}

/// Opens new [`Transport`]s.
#[async_trait]
pub trait Connector: Send + 'static {
    /// Open a connection to `url` (always a `ws://` or `wss://` URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached. The controller
    /// treats this exactly like a socket that closed right after opening.
    async fn connect(&mut self, url: &str) -> Result<Box<dyn Transport>, ConsoleError>;
}
