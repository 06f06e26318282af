#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for the console integration tests.
//!
//! Provides a scripted [`MockTransport`] handed out by a [`MockConnector`],
//! recording doubles for the renderer and UI, and helpers for building
//! server frames.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use archipelago_console::identity::MemoryClientIdStore;
use archipelago_console::render::{to_plain_text, ConnectionStatus, ResolvedPart};
use archipelago_console::{
    ClientConfig, ConnectionController, ConsoleError, Connector, Renderer, Transport, UiControl,
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client id every test controller starts with.
pub const TEST_CLIENT_ID: &str = "1234567890";

/// One scripted `recv` result.
pub type Incoming = Option<Result<String, ConsoleError>>;

// ── Connection log ──────────────────────────────────────────────────

/// Shared record of everything the mock sockets saw.
#[derive(Clone, Default)]
pub struct ConnectorLog {
    /// URLs passed to `Connector::connect`, in order.
    pub urls: Arc<StdMutex<Vec<String>>>,
    /// Frames sent over any socket, in order.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Sockets currently open.
    pub live: Arc<AtomicUsize>,
    /// Value of `live` at each `connect` call.
    pub live_at_open: Arc<StdMutex<Vec<usize>>>,
    /// Sockets that have been closed or dropped.
    pub closes: Arc<AtomicUsize>,
}

impl ConnectorLog {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap())
            .collect()
    }

    /// The `cmd` of every command sent, flattened across frames.
    pub fn sent_cmds(&self) -> Vec<String> {
        self.sent_json()
            .iter()
            .flat_map(|frame| frame.as_array().unwrap().clone())
            .map(|command| command["cmd"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn live_at_open(&self) -> Vec<usize> {
        self.live_at_open.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted socket.
///
/// `recv` returns the scripted items in order, then stays pending forever.
/// Sends are recorded in the shared [`ConnectorLog`], or fail when the
/// socket was scripted as broken.
pub struct MockTransport {
    incoming: VecDeque<Incoming>,
    fail_sends: bool,
    open: bool,
    log: ConnectorLog,
}

impl MockTransport {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.log.live.fetch_sub(1, Ordering::SeqCst);
            self.log.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, frame: String) -> Result<(), ConsoleError> {
        if !self.open {
            return Err(ConsoleError::TransportClosed);
        }
        if self.fail_sends {
            return Err(ConsoleError::TransportSend("broken pipe".into()));
        }
        self.log.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, ConsoleError>> {
        match self.incoming.pop_front() {
            Some(item) => item,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ConsoleError> {
        self.release();
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.release();
    }
}

// ── MockConnector ───────────────────────────────────────────────────

/// Hands out one scripted socket per `connect`, then refuses.
#[derive(Default)]
pub struct MockConnector {
    scripts: VecDeque<(Vec<Incoming>, bool)>,
    log: ConnectorLog,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a socket that will deliver `incoming`.
    pub fn socket(mut self, incoming: Vec<Incoming>) -> Self {
        self.scripts.push_back((incoming, false));
        self
    }

    /// Queue a socket whose sends all fail.
    pub fn broken_socket(mut self, incoming: Vec<Incoming>) -> Self {
        self.scripts.push_back((incoming, true));
        self
    }

    pub fn log(&self) -> ConnectorLog {
        self.log.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&mut self, url: &str) -> Result<Box<dyn Transport>, ConsoleError> {
        self.log.urls.lock().unwrap().push(url.to_string());
        self.log
            .live_at_open
            .lock()
            .unwrap()
            .push(self.log.live.load(Ordering::SeqCst));

        let Some((incoming, fail_sends)) = self.scripts.pop_front() else {
            return Err(ConsoleError::TransportReceive("connection refused".into()));
        };
        self.log.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            incoming: VecDeque::from(incoming),
            fail_sends,
            open: true,
            log: self.log.clone(),
        }))
    }
}

// ── Recording doubles ───────────────────────────────────────────────

/// Shared view of what a [`RecordingRenderer`] was asked to show.
#[derive(Clone, Default)]
pub struct RenderLog {
    /// Every displayed line; formatted lines are flattened to plain text.
    pub lines: Arc<StdMutex<Vec<String>>>,
    pub formatted: Arc<StdMutex<Vec<Vec<ResolvedPart>>>>,
    pub statuses: Arc<StdMutex<Vec<ConnectionStatus>>>,
}

impl RenderLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn formatted(&self) -> Vec<Vec<ResolvedPart>> {
        self.formatted.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    /// How many times exactly `line` was displayed.
    pub fn count(&self, line: &str) -> usize {
        self.lines().iter().filter(|l| l.as_str() == line).count()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.count(line) > 0
    }

    pub fn last(&self) -> Option<String> {
        self.lines().last().cloned()
    }
}

pub struct RecordingRenderer {
    log: RenderLog,
}

impl RecordingRenderer {
    pub fn new() -> (Self, RenderLog) {
        let log = RenderLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Renderer for RecordingRenderer {
    fn display(&mut self, text: &str) {
        self.log.lines.lock().unwrap().push(text.to_string());
    }

    fn display_formatted(&mut self, parts: &[ResolvedPart]) {
        self.log.lines.lock().unwrap().push(to_plain_text(parts));
        self.log.formatted.lock().unwrap().push(parts.to_vec());
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.log.statuses.lock().unwrap().push(status);
    }
}

/// Shared view of the calls a [`RecordingUi`] received.
#[derive(Clone, Default)]
pub struct UiLog {
    pub font_sizes: Arc<StdMutex<Vec<u32>>>,
    pub toggles: Arc<AtomicUsize>,
}

impl UiLog {
    pub fn font_sizes(&self) -> Vec<u32> {
        self.font_sizes.lock().unwrap().clone()
    }

    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }
}

pub struct RecordingUi {
    log: UiLog,
}

impl RecordingUi {
    pub fn new() -> (Self, UiLog) {
        let log = UiLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl UiControl for RecordingUi {
    fn set_font_size(&mut self, px: u32) {
        self.log.font_sizes.lock().unwrap().push(px);
    }

    fn toggle_visibility(&mut self) {
        self.log.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Controller helper ───────────────────────────────────────────────

/// Build a controller over `connector` with a recording renderer and a
/// fixed client id.
pub fn controller_with(
    connector: MockConnector,
    config: ClientConfig,
) -> (ConnectionController, ConnectorLog, RenderLog) {
    let log = connector.log();
    let (renderer, render_log) = RecordingRenderer::new();
    let controller = ConnectionController::new(config, Box::new(connector), Box::new(renderer))
        .with_id_store(Box::new(MemoryClientIdStore::with_id(TEST_CLIENT_ID)));
    (controller, log, render_log)
}

// ── Frame helpers ───────────────────────────────────────────────────

pub fn frame(value: Value) -> Incoming {
    Some(Ok(value.to_string()))
}

/// The server closed the socket.
pub fn closed() -> Incoming {
    None
}

pub fn socket_error() -> Incoming {
    Some(Err(ConsoleError::TransportReceive("connection reset".into())))
}

pub fn room_info(password: bool) -> Incoming {
    frame(json!([{
        "cmd": "RoomInfo",
        "password": password,
        "seed_name": "12345",
        "version": {"major": 0, "minor": 4, "build": 6, "class": "Version"},
        "tags": ["AP"],
    }]))
}

pub fn connected(slot: i64) -> Incoming {
    frame(json!([{
        "cmd": "Connected",
        "team": 0,
        "slot": slot,
        "players": [
            {"team": 0, "slot": 1, "alias": "Alice", "name": "Alice"},
            {"team": 0, "slot": 2, "alias": "Bobby", "name": "Bob"},
        ],
        "missing_locations": [],
        "checked_locations": [],
    }]))
}

pub fn refused(errors: &[&str]) -> Incoming {
    frame(json!([{"cmd": "ConnectionRefused", "errors": errors}]))
}

pub fn print(text: &str) -> Incoming {
    frame(json!([{"cmd": "Print", "text": text}]))
}
