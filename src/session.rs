//! Session and reconnection state owned by the controller.

use tokio::time::Instant;

use crate::protocol::NetworkPlayer;

/// What the controller knows about the current (or last) session.
///
/// `auth_error` is cleared on every new connection attempt. Slot, team, and
/// players survive disconnects until the next `Connected` overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Last address that reached `Connected`.
    pub address: Option<String>,
    pub player_name: String,
    pub password: Option<String>,
    pub slot: Option<i64>,
    pub team: Option<i64>,
    /// Players in the multiworld, in server order.
    pub players: Vec<NetworkPlayer>,
    /// The server refused our credentials on the current attempt.
    pub auth_error: bool,
}

impl Session {
    /// The player entry for our own slot, once connected.
    pub fn own_player(&self) -> Option<&NetworkPlayer> {
        let slot = self.slot?;
        self.players
            .iter()
            .find(|player| player.slot == slot && Some(player.team) == self.team)
    }
}

/// Automatic reconnection bookkeeping.
///
/// `retry_at` is the single scheduled-retry slot; scheduling always replaces
/// it, so there is never more than one pending retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectState {
    /// Automatic attempts since the last successful `Connected`.
    pub attempts: u32,
    pub retry_at: Option<Instant>,
    /// Set by a user-initiated disconnect; cleared by a manual connect.
    pub suppressed: bool,
}

impl ReconnectState {
    pub fn is_pending(&self) -> bool {
        self.retry_at.is_some()
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
    fn own_player_matches_slot_and_team() {
        let session = Session {
            slot: Some(2),
            team: Some(1),
            players: vec![
                NetworkPlayer {
                    team: 0,
                    slot: 2,
                    alias: "Other".into(),
                    name: "Other".into(),
                },
                NetworkPlayer {
                    team: 1,
                    slot: 2,
                    alias: "Me".into(),
                    name: "Me".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(session.own_player().unwrap().alias, "Me");
        assert!(Session::default().own_player().is_none());
    }
}
