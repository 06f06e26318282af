//! Presentation seams: the render interface, the UI collaborator, and the
//! resolution of `PrintJSON` parts into styled text.
//!
//! The core never touches presentation state. It reports text through
//! [`Renderer`] and forwards UI toggles through [`UiControl`]; the front end
//! decides what those look like.

use std::fmt;

use crate::names::NameResolver;
use crate::protocol::{JsonMessagePart, NetworkPlayer, PartType};

/// Connection state shown in the front end's status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "Not Connected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        })
    }
}

/// Item classification carried in the `flags` bits of an `item_id` part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Advancement,
    Useful,
    Trap,
    Normal,
}

impl ItemClass {
    /// Classify by flag bits. Lower bits win when several are set.
    pub fn from_flags(flags: u32) -> Self {
        if flags & 0b001 != 0 {
            Self::Advancement
        } else if flags & 0b010 != 0 {
            Self::Useful
        } else if flags & 0b100 != 0 {
            Self::Trap
        } else {
            Self::Normal
        }
    }

    /// Tooltip-style label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Advancement => "Advancement Item",
            Self::Useful => "Useful Item",
            Self::Trap => "Trap",
            Self::Normal => "Item",
        }
    }
}

/// How a resolved part should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// The player this client is connected as.
    PlayerSelf,
    PlayerOther,
    Item(ItemClass),
    Location,
    Entrance,
    Plain,
}

/// A `PrintJSON` part with ids replaced by names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPart {
    pub text: String,
    pub kind: PartKind,
}

impl ResolvedPart {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: PartKind::Plain,
        }
    }
}

/// Sink for everything the client wants to show.
pub trait Renderer: Send {
    /// Show a line of plain text.
    fn display(&mut self, text: &str);

    /// Show one line made of styled parts.
    fn display_formatted(&mut self, parts: &[ResolvedPart]);

    /// The connection status changed.
    fn set_status(&mut self, _status: ConnectionStatus) {}
}

/// UI toggles the command router can trigger.
pub trait UiControl: Send {
    /// Set the console font size in pixels. Only called with values ≥ 1.
    fn set_font_size(&mut self, px: u32);

    fn toggle_visibility(&mut self);
}

/// Player lookup context for resolving `player_id` parts.
#[derive(Debug, Clone, Copy)]
pub struct PlayerContext<'a> {
    pub players: &'a [NetworkPlayer],
    pub own_slot: Option<i64>,
}

/// Replace ids in `parts` with display names.
///
/// Ids that cannot be parsed or looked up keep their raw text.
pub fn resolve_parts(
    parts: &[JsonMessagePart],
    names: &dyn NameResolver,
    players: PlayerContext<'_>,
) -> Vec<ResolvedPart> {
    parts
        .iter()
        .map(|part| resolve_part(part, names, players))
        .collect()
}

fn resolve_part(
    part: &JsonMessagePart,
    names: &dyn NameResolver,
    players: PlayerContext<'_>,
) -> ResolvedPart {
    let id = part.text.trim().parse::<i64>().ok();
    let lookup = |found: Option<&str>| found.unwrap_or(part.text.as_str()).to_string();

    match part.part_type() {
        PartType::PlayerId => {
            let kind = if id.is_some() && id == players.own_slot {
                PartKind::PlayerSelf
            } else {
                PartKind::PlayerOther
            };
            let alias = id.and_then(|slot| {
                players
                    .players
                    .iter()
                    .find(|player| player.slot == slot)
                    .map(|player| player.alias.as_str())
            });
            ResolvedPart {
                text: lookup(alias),
                kind,
            }
        }
        PartType::ItemId => ResolvedPart {
            text: lookup(id.and_then(|id| names.item_name(id))),
            kind: PartKind::Item(ItemClass::from_flags(part.flags.unwrap_or(0))),
        },
        PartType::LocationId => ResolvedPart {
            text: lookup(id.and_then(|id| names.location_name(id))),
            kind: PartKind::Location,
        },
        PartType::EntranceName => ResolvedPart {
            text: part.text.clone(),
            kind: PartKind::Entrance,
        },
        PartType::Text => ResolvedPart::plain(part.text.clone()),
    }
}

/// Concatenate resolved parts into plain text.
pub fn to_plain_text(parts: &[ResolvedPart]) -> String {
    parts.iter().map(|part| part.text.as_str()).collect()
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
    use crate::names::NameTable;
    use crate::protocol::{DataPackage, GameData};

    fn names() -> NameTable {
        let mut table = NameTable::new();
        table.resolve_names(&DataPackage {
            games: [(
                "Game".to_string(),
                GameData {
                    item_name_to_id: [("Hookshot".to_string(), 77)].into_iter().collect(),
                    location_name_to_id: [("Cave".to_string(), 9)].into_iter().collect(),
                },
            )]
            .into_iter()
            .collect(),
        });
        table
    }

    fn players() -> Vec<NetworkPlayer> {
        vec![
            NetworkPlayer {
                team: 0,
                slot: 1,
                alias: "Bob".into(),
                name: "Bob".into(),
            },
            NetworkPlayer {
                team: 0,
                slot: 2,
                alias: "Al".into(),
                name: "Alice".into(),
            },
        ]
    }

    #[test]
    fn resolves_an_item_send_line() {
        let players = players();
        let ctx = PlayerContext {
            players: &players,
            own_slot: Some(2),
        };
        let parts = vec![
            JsonMessagePart::typed("player_id", "1"),
            JsonMessagePart::text(" sent "),
            JsonMessagePart::typed("item_id", "77").with_flags(0b010),
            JsonMessagePart::text(" to "),
            JsonMessagePart::typed("player_id", "2"),
            JsonMessagePart::text(" ("),
            JsonMessagePart::typed("location_id", "9"),
            JsonMessagePart::text(")"),
        ];

        let resolved = resolve_parts(&parts, &names(), ctx);
        assert_eq!(to_plain_text(&resolved), "Bob sent Hookshot to Al (Cave)");
        assert_eq!(resolved[0].kind, PartKind::PlayerOther);
        assert_eq!(resolved[2].kind, PartKind::Item(ItemClass::Useful));
        assert_eq!(resolved[4].kind, PartKind::PlayerSelf);
        assert_eq!(resolved[6].kind, PartKind::Location);
    }

    #[test]
    fn unknown_ids_keep_raw_text() {
        let ctx = PlayerContext {
            players: &[],
            own_slot: None,
        };
        let parts = vec![
            JsonMessagePart::typed("player_id", "5"),
            JsonMessagePart::typed("item_id", "not-a-number"),
            JsonMessagePart::typed("entrance_name", "Dark Door"),
        ];
        let resolved = resolve_parts(&parts, &NameTable::new(), ctx);
        assert_eq!(resolved[0].text, "5");
        assert_eq!(resolved[1].text, "not-a-number");
        assert_eq!(resolved[1].kind, PartKind::Item(ItemClass::Normal));
        assert_eq!(resolved[2].kind, PartKind::Entrance);
    }

    #[test]
    fn item_flags_prefer_lowest_bit() {
        assert_eq!(ItemClass::from_flags(0b111), ItemClass::Advancement);
        assert_eq!(ItemClass::from_flags(0b110), ItemClass::Useful);
        assert_eq!(ItemClass::from_flags(0b100), ItemClass::Trap);
        assert_eq!(ItemClass::from_flags(0), ItemClass::Normal);
        assert_eq!(ItemClass::Trap.label(), "Trap");
    }
}
