//! Wire-compatible Archipelago protocol types.
//!
//! Every frame on the socket is a JSON array of command objects, each tagged
//! by its `cmd` field. Only the commands and fields a text-only spectator
//! needs are modelled; unknown fields are ignored and unknown commands
//! decode to [`ServerCommand::Unknown`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Constants ───────────────────────────────────────────────────────

/// Game name sent in the `Connect` handshake.
pub const GAME_NAME: &str = "Archipelago";

/// Tags a text-only spectator declares when connecting.
pub const CLIENT_TAGS: [&str; 3] = ["TextOnly", "IgnoreGame", "Spectator"];

/// Error code the server sends when the password is missing or wrong.
pub const INVALID_PASSWORD: &str = "InvalidPassword";

// ── Structs ─────────────────────────────────────────────────────────

/// Protocol version advertised in the `Connect` handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    /// Always `"Version"` on the wire.
    #[serde(rename = "class", default = "version_class")]
    pub class: VersionClass,
}

/// Marker for the constant `class` field of [`NetworkVersion`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VersionClass {
    #[default]
    Version,
}

fn version_class() -> VersionClass {
    VersionClass::Version
}

impl NetworkVersion {
    /// Protocol version this client speaks.
    pub const CURRENT: Self = Self::new(0, 2, 4);

    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
            class: VersionClass::Version,
        }
    }
}

impl Default for NetworkVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// A player slot in the current multiworld, as listed in `Connected`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkPlayer {
    pub team: i64,
    pub slot: i64,
    pub alias: String,
    #[serde(default)]
    pub name: String,
}

/// One segment of a `PrintJSON` message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JsonMessagePart {
    #[serde(default)]
    pub text: String,
    /// Part type such as `player_id` or `item_id`; absent for plain text.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Item classification bits, present on `item_id` parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    /// Slot that owns the item or location, when relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<i64>,
}

/// The part types the renderer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    PlayerId,
    ItemId,
    LocationId,
    EntranceName,
    Text,
}

impl JsonMessagePart {
    /// Plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Part with an explicit type.
    pub fn typed(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Set the item classification bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Classify the part. Types this client does not style are [`PartType::Text`].
    pub fn part_type(&self) -> PartType {
        match self.kind.as_deref() {
            Some("player_id") => PartType::PlayerId,
            Some("item_id") => PartType::ItemId,
            Some("location_id") => PartType::LocationId,
            Some("entrance_name") => PartType::EntranceName,
            _ => PartType::Text,
        }
    }
}

/// Per-game name tables from a `DataPackage` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GameData {
    #[serde(default)]
    pub item_name_to_id: HashMap<String, i64>,
    #[serde(default)]
    pub location_name_to_id: HashMap<String, i64>,
}

/// Server-supplied mapping from item/location names to ids, per game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DataPackage {
    #[serde(default)]
    pub games: HashMap<String, GameData>,
}

// ── Commands ────────────────────────────────────────────────────────

/// Commands sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cmd")]
pub enum ClientCommand {
    /// Authenticate against the room announced by `RoomInfo`.
    Connect {
        game: String,
        name: String,
        uuid: String,
        tags: Vec<String>,
        /// Serialized as `null` when no password was supplied.
        password: Option<String>,
        version: NetworkVersion,
        items_handling: u8,
    },
    /// Chat text.
    Say { text: String },
    /// Ask for the id→name tables.
    GetDataPackage,
}

/// Commands sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum ServerCommand {
    /// First command after the socket opens.
    RoomInfo {
        /// Whether the room requires a password.
        #[serde(default)]
        password: bool,
        #[serde(default)]
        seed_name: Option<String>,
        #[serde(default)]
        version: Option<NetworkVersion>,
    },
    /// Authentication succeeded.
    Connected {
        team: i64,
        slot: i64,
        #[serde(default)]
        players: Vec<NetworkPlayer>,
    },
    /// Authentication failed.
    ConnectionRefused {
        #[serde(default)]
        errors: Vec<String>,
    },
    /// Plain text to show.
    Print { text: String },
    /// Structured text to show.
    #[serde(rename = "PrintJSON")]
    PrintJson {
        #[serde(default)]
        data: Vec<JsonMessagePart>,
    },
    /// Id→name tables.
    DataPackage { data: DataPackage },
    ReceivedItems {},
    LocationInfo {},
    RoomUpdate {},
    Bounced {},
    /// Any command this client does not know.
    #[serde(other)]
    Unknown,
}

impl ServerCommand {
    /// Name of the command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomInfo { .. } => "RoomInfo",
            Self::Connected { .. } => "Connected",
            Self::ConnectionRefused { .. } => "ConnectionRefused",
            Self::Print { .. } => "Print",
            Self::PrintJson { .. } => "PrintJSON",
            Self::DataPackage { .. } => "DataPackage",
            Self::ReceivedItems {} => "ReceivedItems",
            Self::LocationInfo {} => "LocationInfo",
            Self::RoomUpdate {} => "RoomUpdate",
            Self::Bounced {} => "Bounced",
            Self::Unknown => "Unknown",
        }
    }
}

// ── Framing ─────────────────────────────────────────────────────────

/// Decode one inbound frame into its commands, in order.
///
/// # Errors
///
/// Returns [`ConsoleError::Serialization`](crate::ConsoleError::Serialization)
/// if the frame is not a JSON array of command objects, or if a known command
/// is missing a required field.
pub fn decode_frame(text: &str) -> Result<Vec<ServerCommand>> {
    Ok(serde_json::from_str(text)?)
}

/// Encode outbound commands as one frame.
///
/// # Errors
///
/// Returns [`ConsoleError::Serialization`](crate::ConsoleError::Serialization)
/// if serialization fails.
pub fn encode_frame(commands: &[ClientCommand]) -> Result<String> {
    Ok(serde_json::to_string(commands)?)
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
    use serde_json::json;

    #[test]
    fn connect_envelope_matches_wire_format() {
        let frame = encode_frame(&[ClientCommand::Connect {
            game: GAME_NAME.into(),
            name: "Alice".into(),
            uuid: "123".into(),
            tags: CLIENT_TAGS.iter().map(ToString::to_string).collect(),
            password: None,
            version: NetworkVersion::CURRENT,
            items_handling: 0,
        }])
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!([{
                "cmd": "Connect",
                "game": "Archipelago",
                "name": "Alice",
                "uuid": "123",
                "tags": ["TextOnly", "IgnoreGame", "Spectator"],
                "password": null,
                "version": {"major": 0, "minor": 2, "build": 4, "class": "Version"},
                "items_handling": 0
            }])
        );
    }

    #[test]
    fn say_and_data_package_requests() {
        let frame = encode_frame(&[
            ClientCommand::Say {
                text: "hello".into(),
            },
            ClientCommand::GetDataPackage,
        ])
        .unwrap();
        assert_eq!(
            frame,
            r#"[{"cmd":"Say","text":"hello"},{"cmd":"GetDataPackage"}]"#
        );
    }

    #[test]
    fn decodes_commands_in_order() {
        let commands = decode_frame(
            r#"[{"cmd":"Print","text":"one"},{"cmd":"Print","text":"two"},{"cmd":"Bounced","data":{}}]"#,
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                ServerCommand::Print { text: "one".into() },
                ServerCommand::Print { text: "two".into() },
                ServerCommand::Bounced {},
            ]
        );
    }

    #[test]
    fn unknown_command_is_not_an_error() {
        let commands =
            decode_frame(r#"[{"cmd":"SetReply","key":"x","value":1},{"cmd":"Print","text":"hi"}]"#)
                .unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], ServerCommand::Unknown);
        assert_eq!(commands[0].name(), "Unknown");
    }

    #[test]
    fn room_info_ignores_extra_fields() {
        let commands = decode_frame(
            r#"[{"cmd":"RoomInfo","password":true,"seed_name":"S1","tags":["AP"],"permissions":{"release":1},
                 "version":{"major":0,"minor":4,"build":2,"class":"Version"}}]"#,
        )
        .unwrap();
        assert_eq!(
            commands[0],
            ServerCommand::RoomInfo {
                password: true,
                seed_name: Some("S1".into()),
                version: Some(NetworkVersion::new(0, 4, 2)),
            }
        );
    }

    #[test]
    fn connected_carries_players() {
        let commands = decode_frame(
            r#"[{"cmd":"Connected","team":0,"slot":2,"missing_locations":[],
                 "players":[{"team":0,"slot":1,"alias":"Bob","name":"Bob","class":"NetworkPlayer"},
                            {"team":0,"slot":2,"alias":"Al","name":"Alice","class":"NetworkPlayer"}]}]"#,
        )
        .unwrap();
        match &commands[0] {
            ServerCommand::Connected {
                team,
                slot,
                players,
            } => {
                assert_eq!((*team, *slot), (0, 2));
                assert_eq!(players[1].alias, "Al");
            }
            other => panic!("expected Connected, got {other:?}"),
        }
    }

    #[test]
    fn print_json_parts_keep_type_and_flags() {
        let commands = decode_frame(
            r#"[{"cmd":"PrintJSON","type":"ItemSend","data":[
                {"text":"1","type":"player_id"},
                {"text":" found "},
                {"text":"77","type":"item_id","flags":1,"player":1},
                {"text":"blue","type":"color"}]}]"#,
        )
        .unwrap();
        let ServerCommand::PrintJson { data } = &commands[0] else {
            panic!("expected PrintJSON");
        };
        assert_eq!(data[0].part_type(), PartType::PlayerId);
        assert_eq!(data[1].part_type(), PartType::Text);
        assert_eq!(data[2].part_type(), PartType::ItemId);
        assert_eq!(data[2].flags, Some(1));
        assert_eq!(data[3].part_type(), PartType::Text);
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"cmd":"Print","text":"x"}"#).is_err());
        assert!(decode_frame(r#"[{"cmd":"Print"}]"#).is_err());
    }
}
