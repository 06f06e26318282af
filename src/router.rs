//! Input line routing: local slash-commands versus chat.
//!
//! Lines starting with [`COMMAND_SENTINEL`] are parsed into a [`Command`] and
//! executed locally. Everything else is chat and goes to the server through
//! [`ConnectionController::send`]. Every submitted line is kept in the
//! router's [`CommandHistory`].

use crate::controller::ConnectionController;
use crate::history::CommandHistory;
use crate::render::UiControl;

/// Marks a line as a local command.
pub const COMMAND_SENTINEL: char = '/';

/// Lines printed by `/help`.
pub const HELP_LINES: [&str; 5] = [
    "Available commands:",
    "/connect [server] [player] [password] - Connect to an AP server with an optional password",
    "/fontsize [size] - Change the size of the font. 16 is default",
    "/ui - Toggle UI visibility",
    "/help - Print this message",
];

pub const CONNECT_USAGE_MESSAGE: &str = "Server address and player name are required to connect.";
pub const FONT_SIZE_USAGE_MESSAGE: &str = "You must specify a font size like: /fontsize 16";
pub const FONT_SIZE_INVALID_MESSAGE: &str = "Font size must be an integer greater than zero.";
pub const UNKNOWN_COMMAND_MESSAGE: &str = "Unknown command.";

/// A parsed slash-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect {
        address: Option<String>,
        player: Option<String>,
        password: Option<String>,
    },
    /// Raw size argument, validated on execution.
    FontSize(Option<String>),
    Ui,
    Help,
    /// Any other command word, without the sentinel.
    Unknown(String),
}

/// One submitted input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Chat(String),
}

/// Classify an input line. Returns `None` for blank lines.
///
/// ```
/// use archipelago_console::router::{parse_input, Command, Input};
///
/// assert_eq!(parse_input("/ui"), Some(Input::Command(Command::Ui)));
/// assert_eq!(parse_input("hi all"), Some(Input::Chat("hi all".into())));
/// assert_eq!(parse_input("   "), None);
/// ```
pub fn parse_input(line: &str) -> Option<Input> {
    if line.trim().is_empty() {
        return None;
    }
    match line.strip_prefix(COMMAND_SENTINEL) {
        Some(rest) => Some(Input::Command(parse_command(rest))),
        None => Some(Input::Chat(line.to_string())),
    }
}

fn parse_command(rest: &str) -> Command {
    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let mut arg = || words.next().map(str::to_string);

    match name {
        "connect" => Command::Connect {
            address: arg(),
            player: arg(),
            password: arg(),
        },
        "fontsize" => Command::FontSize(arg()),
        "ui" => Command::Ui,
        "help" => Command::Help,
        other => Command::Unknown(other.to_string()),
    }
}

/// Parse a `/fontsize` argument. Only integers ≥ 1 are accepted.
pub fn parse_font_size(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|px| *px >= 1)
}

/// Routes submitted lines and owns the input history.
pub struct CommandRouter {
    history: CommandHistory,
    ui: Box<dyn UiControl>,
}

impl CommandRouter {
    pub fn new(ui: Box<dyn UiControl>, history_capacity: usize) -> Self {
        Self {
            history: CommandHistory::new(history_capacity),
            ui,
        }
    }

    /// Handle one submitted line.
    ///
    /// Blank lines are ignored. Anything else, command or chat, recognized
    /// or not, is appended to the history afterwards.
    pub async fn submit(&mut self, line: &str, controller: &mut ConnectionController) {
        let Some(input) = parse_input(line) else {
            return;
        };
        match input {
            Input::Command(command) => self.execute(command, controller).await,
            Input::Chat(text) => controller.send(&text).await,
        }
        self.history.append(line);
    }

    async fn execute(&mut self, command: Command, controller: &mut ConnectionController) {
        tracing::debug!(?command, "local command");
        match command {
            Command::Connect {
                address: Some(address),
                player: Some(player),
                password,
            } => {
                if let Err(e) = controller
                    .connect(&address, &player, password.as_deref())
                    .await
                {
                    tracing::warn!("connect command failed: {e}");
                    controller.display(CONNECT_USAGE_MESSAGE);
                }
            }
            Command::Connect { .. } => controller.display(CONNECT_USAGE_MESSAGE),
            Command::FontSize(None) => controller.display(FONT_SIZE_USAGE_MESSAGE),
            Command::FontSize(Some(raw)) => match parse_font_size(&raw) {
                Some(px) => self.ui.set_font_size(px),
                None => controller.display(FONT_SIZE_INVALID_MESSAGE),
            },
            Command::Ui => self.ui.toggle_visibility(),
            Command::Help => {
                for line in HELP_LINES {
                    controller.display(line);
                }
            }
            Command::Unknown(_) => controller.display(UNKNOWN_COMMAND_MESSAGE),
        }
    }

    /// Step the input buffer one entry into the past.
    pub fn recall_older(&mut self) -> Option<&str> {
        self.history.recall_older()
    }

    /// Step the input buffer one entry towards the present.
    pub fn recall_newer(&mut self) -> Option<&str> {
        self.history.recall_newer()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("history", &self.history)
            .finish_non_exhaustive()
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
    fn parses_connect_arguments() {
        assert_eq!(
            parse_input("/connect localhost Alice hunter2"),
            Some(Input::Command(Command::Connect {
                address: Some("localhost".into()),
                player: Some("Alice".into()),
                password: Some("hunter2".into()),
            }))
        );
        assert_eq!(
            parse_input("/connect"),
            Some(Input::Command(Command::Connect {
                address: None,
                player: None,
                password: None,
            }))
        );
    }

    #[test]
    fn command_words_are_case_sensitive() {
        assert_eq!(
            parse_input("/HELP"),
            Some(Input::Command(Command::Unknown("HELP".into())))
        );
        assert_eq!(
            parse_input("/"),
            Some(Input::Command(Command::Unknown(String::new())))
        );
    }

    #[test]
    fn chat_keeps_the_line_verbatim() {
        assert_eq!(
            parse_input("  gg  "),
            Some(Input::Chat("  gg  ".into()))
        );
        assert_eq!(parse_input(""), None);
    }

    #[test]
    fn font_size_must_be_positive_integer() {
        assert_eq!(parse_font_size("16"), Some(16));
        assert_eq!(parse_font_size("0"), None);
        assert_eq!(parse_font_size("-4"), None);
        assert_eq!(parse_font_size("12.5"), None);
        assert_eq!(parse_font_size("big"), None);
    }
}
