//! # Archipelago Console
//!
//! Text client for [Archipelago](https://archipelago.gg) multiworld servers.
//!
//! The crate provides the core of a text console: a connection controller
//! with bounded automatic reconnection, a slash-command router, and an input
//! recall history. Presentation is left to the front end through the
//! [`Renderer`] and [`UiControl`] traits.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement [`Transport`] and [`Connector`] for any backend
//! - **WebSocket built-in**: the default `transport-websocket` feature provides
//!   [`WebSocketConnector`](transports::WebSocketConnector)
//! - **Single owner**: drive the controller with
//!   [`next_event`](ConnectionController::next_event) and
//!   [`handle_event`](ConnectionController::handle_event), no background tasks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use archipelago_console::{ClientConfig, CommandRouter, ConnectionController};
//!
//! let config = ClientConfig::new();
//! let mut router = CommandRouter::new(Box::new(my_ui), config.history_capacity);
//! let mut controller = ConnectionController::websocket(config, Box::new(my_renderer));
//!
//! router.submit("/connect archipelago.gg:38281 Alice", &mut controller).await;
//! loop {
//!     let event = controller.next_event().await;
//!     controller.handle_event(event).await;
//! }
//! ```

pub mod controller;
pub mod error;
pub mod history;
pub mod identity;
pub mod names;
pub mod protocol;
pub mod render;
pub mod router;
pub mod session;
pub mod transport;
pub mod transports;

pub use controller::{ClientConfig, ConnectionController, ControllerEvent};
pub use error::ConsoleError;
pub use history::CommandHistory;
pub use identity::{ClientIdStore, FileClientIdStore, MemoryClientIdStore};
pub use names::{NameResolver, NameTable};
pub use protocol::{ClientCommand, ServerCommand};
pub use render::{ConnectionStatus, Renderer, ResolvedPart, UiControl};
pub use router::CommandRouter;
pub use session::{ReconnectState, Session};
pub use transport::{Connector, Transport};

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
