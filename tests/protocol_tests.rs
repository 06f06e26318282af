#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the Archipelago protocol types.
//!
//! Fixtures are shaped like real server output, including fields the client
//! does not model, to make sure decoding stays lenient where the server is
//! ahead of us and strict where a field is required.

use archipelago_console::protocol::{
    decode_frame, encode_frame, ClientCommand, DataPackage, JsonMessagePart, NetworkVersion,
    PartType, ServerCommand, VersionClass,
};
use archipelago_console::ConsoleError;

// ════════════════════════════════════════════════════════════════════
// Server fixtures
// ════════════════════════════════════════════════════════════════════

const ROOM_INFO_FIXTURE: &str = r#"[{"cmd":"RoomInfo","version":{"major":0,"minor":4,"build":6,"class":"Version"},
"generator_version":{"major":0,"minor":4,"build":6,"class":"Version"},"tags":["AP"],"password":false,
"permissions":{"release":6,"collect":6,"remaining":1},"hint_cost":10,"location_check_points":1,
"games":["A Link to the Past","Archipelago"],"datapackage_checksums":{},"seed_name":"44017298723048",
"time":1700000000.5}]"#;

const DATA_PACKAGE_FIXTURE: &str = r#"[{"cmd":"DataPackage","data":{"games":{
"A Link to the Past":{"item_name_to_id":{"Hookshot":10,"Bow":11},"location_name_to_id":{"Link's House":20},"checksum":"abc"},
"Archipelago":{"item_name_to_id":{"Nothing":-1},"location_name_to_id":{"Cheat Console":-1,"Server":-2}}}}}]"#;

#[test]
fn decodes_real_room_info() {
    let commands = decode_frame(ROOM_INFO_FIXTURE).unwrap();
    assert_eq!(
        commands,
        vec![ServerCommand::RoomInfo {
            password: false,
            seed_name: Some("44017298723048".into()),
            version: Some(NetworkVersion::new(0, 4, 6)),
        }]
    );
}

#[test]
fn decodes_data_package_with_negative_ids() {
    let commands = decode_frame(DATA_PACKAGE_FIXTURE).unwrap();
    let ServerCommand::DataPackage { data } = &commands[0] else {
        panic!("expected DataPackage, got {:?}", commands[0]);
    };
    let alttp = &data.games["A Link to the Past"];
    assert_eq!(alttp.item_name_to_id["Bow"], 11);
    assert_eq!(data.games["Archipelago"].location_name_to_id["Server"], -2);
}

#[test]
fn connection_refused_without_errors_defaults_to_empty() {
    let commands = decode_frame(r#"[{"cmd":"ConnectionRefused"}]"#).unwrap();
    assert_eq!(
        commands,
        vec![ServerCommand::ConnectionRefused { errors: vec![] }]
    );
}

#[test]
fn ignored_commands_decode_with_payloads() {
    let commands = decode_frame(
        r#"[{"cmd":"ReceivedItems","index":0,"items":[{"item":10,"location":20,"player":1,"flags":0}]},
            {"cmd":"LocationInfo","locations":[]},
            {"cmd":"RoomUpdate","hint_points":5},
            {"cmd":"Bounced","games":["A"],"data":{}},
            {"cmd":"Retrieved","keys":{}}]"#,
    )
    .unwrap();
    let names: Vec<&str> = commands.iter().map(ServerCommand::name).collect();
    assert_eq!(
        names,
        vec!["ReceivedItems", "LocationInfo", "RoomUpdate", "Bounced", "Unknown"]
    );
}

#[test]
fn print_json_part_types() {
    let parts: Vec<JsonMessagePart> = serde_json::from_str(
        r#"[{"text":"1","type":"player_id"},{"text":"Foo","type":"player_name"},
            {"text":"5","type":"location_id","player":1},{"text":"Door","type":"entrance_name"},
            {"text":"plain"}]"#,
    )
    .unwrap();
    let types: Vec<PartType> = parts.iter().map(JsonMessagePart::part_type).collect();
    assert_eq!(
        types,
        vec![
            PartType::PlayerId,
            PartType::Text,
            PartType::LocationId,
            PartType::EntranceName,
            PartType::Text,
        ]
    );
}

// ════════════════════════════════════════════════════════════════════
// Decode errors
// ════════════════════════════════════════════════════════════════════

#[test]
fn frame_must_be_an_array() {
    let err = decode_frame(r#"{"cmd":"Print","text":"hi"}"#).unwrap_err();
    assert!(matches!(err, ConsoleError::Serialization(_)));
}

#[test]
fn known_command_missing_required_field_is_an_error() {
    assert!(decode_frame(r#"[{"cmd":"Print"}]"#).is_err());
    assert!(decode_frame(r#"[{"cmd":"Connected","slot":1}]"#).is_err());
}

#[test]
fn command_without_tag_is_an_error() {
    assert!(decode_frame(r#"[{"text":"hi"}]"#).is_err());
}

#[test]
fn empty_frame_is_empty() {
    assert!(decode_frame("[]").unwrap().is_empty());
}

// ════════════════════════════════════════════════════════════════════
// Client commands
// ════════════════════════════════════════════════════════════════════

#[test]
fn connect_with_password_serializes_string() {
    let frame = encode_frame(&[ClientCommand::Connect {
        game: "Archipelago".into(),
        name: "Alice".into(),
        uuid: "99".into(),
        tags: vec!["TextOnly".into()],
        password: Some("secret".into()),
        version: NetworkVersion::CURRENT,
        items_handling: 0,
    }])
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value[0]["password"], "secret");
    assert_eq!(value[0]["version"]["class"], "Version");
}

#[test]
fn version_class_defaults_when_missing() {
    let version: NetworkVersion =
        serde_json::from_str(r#"{"major":0,"minor":2,"build":4}"#).unwrap();
    assert_eq!(version, NetworkVersion::CURRENT);
    assert_eq!(version.class, VersionClass::Version);
}

#[test]
fn data_package_default_is_empty() {
    let package: DataPackage = serde_json::from_str("{}").unwrap();
    assert!(package.games.is_empty());
}
