//! Integration tests for `CommandRouter` driving a mock-backed controller.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]

mod common;

use archipelago_console::router::{
    CONNECT_USAGE_MESSAGE, FONT_SIZE_INVALID_MESSAGE, FONT_SIZE_USAGE_MESSAGE, HELP_LINES,
    UNKNOWN_COMMAND_MESSAGE,
};
use archipelago_console::{ClientConfig, CommandRouter, ConnectionController};
use serde_json::json;

use common::{controller_with, ConnectorLog, MockConnector, RecordingUi, RenderLog, UiLog};

struct Harness {
    router: CommandRouter,
    controller: ConnectionController,
    sockets: ConnectorLog,
    render: RenderLog,
    ui: UiLog,
}

impl Harness {
    fn new(connector: MockConnector) -> Self {
        let config = ClientConfig::new().with_history_capacity(3);
        let (ui, ui_log) = RecordingUi::new();
        let router = CommandRouter::new(Box::new(ui), config.history_capacity);
        let (controller, sockets, render) = controller_with(connector, config);
        Self {
            router,
            controller,
            sockets,
            render,
            ui: ui_log,
        }
    }

    async fn submit(&mut self, line: &str) {
        self.router.submit(line, &mut self.controller).await;
    }
}

#[tokio::test(start_paused = true)]
async fn connect_requires_address_and_player() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("/connect").await;
    h.submit("/connect localhost").await;

    assert_eq!(h.render.count(CONNECT_USAGE_MESSAGE), 2);
    assert!(h.sockets.urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn connect_passes_credentials_to_controller() {
    let mut h = Harness::new(MockConnector::new().socket(vec![]));

    h.submit("/connect archipelago.gg:52311 Alice hunter2").await;

    assert_eq!(h.sockets.urls(), vec!["ws://archipelago.gg:52311"]);
    assert_eq!(h.controller.session().player_name, "Alice");
    assert_eq!(h.controller.session().password.as_deref(), Some("hunter2"));
    assert!(h.controller.is_open());
}

#[tokio::test(start_paused = true)]
async fn fontsize_without_argument_never_calls_setter() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("/fontsize").await;

    assert_eq!(h.render.last().as_deref(), Some(FONT_SIZE_USAGE_MESSAGE));
    assert!(h.ui.font_sizes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fontsize_rejects_invalid_values() {
    let mut h = Harness::new(MockConnector::new());

    for line in ["/fontsize 0", "/fontsize -3", "/fontsize huge"] {
        h.submit(line).await;
    }

    assert_eq!(h.render.count(FONT_SIZE_INVALID_MESSAGE), 3);
    assert!(h.ui.font_sizes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fontsize_and_ui_reach_the_ui_collaborator() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("/fontsize 20").await;
    h.submit("/ui").await;
    h.submit("/ui").await;

    assert_eq!(h.ui.font_sizes(), vec![20]);
    assert_eq!(h.ui.toggles(), 2);
    assert!(h.render.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn help_prints_usage_lines() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("/help").await;

    assert_eq!(h.render.lines(), HELP_LINES.to_vec());
}

#[tokio::test(start_paused = true)]
async fn unknown_commands_are_reported_and_remembered() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("/dance").await;

    assert_eq!(h.render.last().as_deref(), Some(UNKNOWN_COMMAND_MESSAGE));
    assert_eq!(h.router.history().iter().collect::<Vec<_>>(), vec!["/dance"]);
}

#[tokio::test(start_paused = true)]
async fn chat_is_sent_only_when_connected() {
    let mut h = Harness::new(MockConnector::new().socket(vec![]));

    h.submit("anyone there?").await;
    assert!(h.sockets.sent().is_empty());

    h.submit("/connect localhost Alice").await;
    h.submit("hello world").await;
    assert_eq!(
        h.sockets.sent_json(),
        vec![json!([{"cmd": "Say", "text": "hello world"}])]
    );
}

#[tokio::test(start_paused = true)]
async fn blank_lines_are_ignored() {
    let mut h = Harness::new(MockConnector::new());

    h.submit("").await;
    h.submit("   ").await;

    assert!(h.router.history().is_empty());
    assert!(h.render.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn history_keeps_newest_lines_and_recalls_them() {
    let mut h = Harness::new(MockConnector::new());

    for line in ["one", "/help", "two", "/ui"] {
        h.submit(line).await;
    }

    assert_eq!(
        h.router.history().iter().collect::<Vec<_>>(),
        vec!["/help", "two", "/ui"]
    );
    assert_eq!(h.router.recall_older(), Some("/ui"));
    assert_eq!(h.router.recall_older(), Some("two"));
    assert_eq!(h.router.recall_older(), Some("/help"));
    assert_eq!(h.router.recall_older(), None);
    assert_eq!(h.router.recall_newer(), Some("two"));

    h.submit("three").await;
    assert_eq!(h.router.history().cursor(), 0);
    assert_eq!(h.router.recall_older(), Some("three"));
}
