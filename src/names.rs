//! Id→name lookup for `PrintJSON` parts.

use std::collections::HashMap;

use crate::protocol::DataPackage;

/// Turns numeric item and location ids into display strings.
///
/// The controller feeds every `DataPackage` it receives to
/// [`resolve_names`](NameResolver::resolve_names) and queries the lookups
/// while resolving `PrintJSON` parts.
pub trait NameResolver: Send {
    /// Absorb the name tables of a data package.
    fn resolve_names(&mut self, package: &DataPackage);

    fn item_name(&self, id: i64) -> Option<&str>;

    fn location_name(&self, id: i64) -> Option<&str>;
}

/// In-memory [`NameResolver`] built from data packages.
///
/// Tables from later packages are merged over earlier ones, so a package
/// that only covers some games does not drop the others.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    items: HashMap<i64, String>,
    locations: HashMap<i64, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

impl NameResolver for NameTable {
    fn resolve_names(&mut self, package: &DataPackage) {
        for (game, data) in &package.games {
            tracing::debug!(
                game = %game,
                items = data.item_name_to_id.len(),
                locations = data.location_name_to_id.len(),
                "loading name tables"
            );
            self.items.extend(
                data.item_name_to_id
                    .iter()
                    .map(|(name, id)| (*id, name.clone())),
            );
            self.locations.extend(
                data.location_name_to_id
                    .iter()
                    .map(|(name, id)| (*id, name.clone())),
            );
        }
    }

    fn item_name(&self, id: i64) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }

    fn location_name(&self, id: i64) -> Option<&str> {
        self.locations.get(&id).map(String::as_str)
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
    use crate::protocol::GameData;

    fn package(game: &str, items: &[(&str, i64)], locations: &[(&str, i64)]) -> DataPackage {
        let data = GameData {
            item_name_to_id: items.iter().map(|(n, i)| (n.to_string(), *i)).collect(),
            location_name_to_id: locations.iter().map(|(n, i)| (n.to_string(), *i)).collect(),
        };
        DataPackage {
            games: [(game.to_string(), data)].into_iter().collect(),
        }
    }

    #[test]
    fn resolves_items_and_locations() {
        let mut table = NameTable::new();
        table.resolve_names(&package(
            "A Link to the Past",
            &[("Hookshot", 77)],
            &[("Link's House", 1000)],
        ));

        assert_eq!(table.item_name(77), Some("Hookshot"));
        assert_eq!(table.location_name(1000), Some("Link's House"));
        assert_eq!(table.item_name(1000), None);
    }

    #[test]
    fn later_packages_merge_with_earlier_ones() {
        let mut table = NameTable::new();
        table.resolve_names(&package("Game A", &[("Sword", 1)], &[]));
        table.resolve_names(&package("Game B", &[("Shield", 2)], &[("Cave", 3)]));

        assert_eq!(table.item_name(1), Some("Sword"));
        assert_eq!(table.item_name(2), Some("Shield"));
        assert_eq!(table.item_count(), 2);
        assert_eq!(table.location_count(), 1);
    }
}
