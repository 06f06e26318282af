//! # Text Console Example
//!
//! A terminal front end for the console client:
//!
//! 1. Read lines from stdin and route them through `CommandRouter`
//! 2. Print server text to stdout, with ANSI colors for item/player parts
//! 3. Reconnect automatically when the server drops the connection
//! 4. Shut down on Ctrl+C or end of input
//!
//! ## Running
//!
//! ```sh
//! cargo run --example text_console
//!
//! # Connect on startup:
//! AP_SERVER=archipelago.gg:38281 AP_PLAYER=Alice cargo run --example text_console
//! ```
//!
//! `AP_PASSWORD` supplies a room password and `AP_DATA_DIR` picks where the
//! client id is stored (default `.archipelago-console`).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use archipelago_console::render::{ItemClass, PartKind};
use archipelago_console::{
    ClientConfig, CommandRouter, ConnectionController, ConnectionStatus, FileClientIdStore,
    Renderer, ResolvedPart, UiControl,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_DATA_DIR: &str = ".archipelago-console";

/// Prints to stdout unless the UI has been toggled off.
struct StdoutRenderer {
    hidden: Arc<AtomicBool>,
}

impl StdoutRenderer {
    fn visible(&self) -> bool {
        !self.hidden.load(Ordering::Relaxed)
    }
}

fn colored(part: &ResolvedPart) -> String {
    let code = match part.kind {
        PartKind::PlayerSelf => "1;35",
        PartKind::PlayerOther => "33",
        PartKind::Item(ItemClass::Advancement) => "1;36",
        PartKind::Item(ItemClass::Useful) => "34",
        PartKind::Item(ItemClass::Trap) => "31",
        PartKind::Item(ItemClass::Normal) => "36",
        PartKind::Location => "32",
        PartKind::Entrance => "94",
        PartKind::Plain => return part.text.clone(),
    };
    format!("\x1b[{code}m{}\x1b[0m", part.text)
}

impl Renderer for StdoutRenderer {
    fn display(&mut self, text: &str) {
        if self.visible() {
            println!("{text}");
        }
    }

    fn display_formatted(&mut self, parts: &[ResolvedPart]) {
        if self.visible() {
            let line: String = parts.iter().map(colored).collect();
            println!("{line}");
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.visible() {
            println!("[{status}]");
        }
    }
}

/// A terminal has no font size; the toggle mutes output instead.
struct TerminalUi {
    hidden: Arc<AtomicBool>,
}

impl UiControl for TerminalUi {
    fn set_font_size(&mut self, px: u32) {
        tracing::info!("font size set to {px}px (ignored in a terminal)");
    }

    fn toggle_visibility(&mut self) {
        let was_hidden = self.hidden.fetch_xor(true, Ordering::Relaxed);
        if was_hidden {
            println!("Output resumed.");
        } else {
            println!("Output hidden. Type /ui to show it again.");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` to see state transitions.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let data_dir = std::env::var("AP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let config = ClientConfig::new();

    let hidden = Arc::new(AtomicBool::new(false));
    let renderer = StdoutRenderer {
        hidden: Arc::clone(&hidden),
    };
    let ui = TerminalUi { hidden };

    let mut router = CommandRouter::new(Box::new(ui), config.history_capacity);
    let mut controller = ConnectionController::websocket(config, Box::new(renderer))
        .with_id_store(Box::new(FileClientIdStore::new(
            data_dir.join("client_id.json"),
        )));

    if let (Ok(server), Ok(player)) = (std::env::var("AP_SERVER"), std::env::var("AP_PLAYER")) {
        let password = std::env::var("AP_PASSWORD").ok();
        controller
            .connect(&server, &player, password.as_deref())
            .await?;
    } else {
        controller.display("Type /connect [server] [player] [password] to begin, or /help.");
    }

    // ── Event loop ──────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => router.submit(&line, &mut controller).await,
                None => break,
            },
            event = controller.next_event() => {
                // Reopening a socket can block for the connect timeout.
                tokio::select! {
                    () = controller.handle_event(event) => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.disconnect(true).await;
    tracing::info!("Goodbye");
    Ok(())
}
