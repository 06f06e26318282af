#![no_main]

use archipelago_console::names::NameTable;
use archipelago_console::protocol::{decode_frame, ServerCommand};
use archipelago_console::render::{resolve_parts, to_plain_text, PlayerContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(commands) = decode_frame(text) else {
        return;
    };

    // Part resolution must cope with whatever ids and players the server sends.
    let names = NameTable::new();
    let mut players = Vec::new();
    for command in commands {
        match command {
            ServerCommand::Connected { players: list, .. } => players = list,
            ServerCommand::PrintJson { data } => {
                let context = PlayerContext {
                    players: &players,
                    own_slot: Some(1),
                };
                let _ = to_plain_text(&resolve_parts(&data, &names, context));
            }
            _ => {}
        }
    }
});
