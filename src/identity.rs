//! Persistent client identifier sent as `uuid` in the `Connect` handshake.
//!
//! The id is a random numeric string generated on first use and stored
//! through a [`ClientIdStore`] so every later session reuses it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Numeric ids are kept below this bound (sixteen decimal digits).
const CLIENT_ID_MODULUS: u128 = 10_000_000_000_000_000;

/// Durable storage for the single client id entry.
pub trait ClientIdStore: Send {
    /// Read the stored id, if one was saved before.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage exists but cannot be read.
    fn load(&self) -> Result<Option<String>>;

    /// Persist `id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&mut self, id: &str) -> Result<()>;
}

/// Generate a fresh random numeric client id.
pub fn generate_client_id() -> String {
    (Uuid::new_v4().as_u128() % CLIENT_ID_MODULUS).to_string()
}

/// Return the stored id, generating and saving one if none exists.
///
/// Storage failures are logged and fall back to a freshly generated id, so
/// a read-only profile still gets a usable (if unstable) identity.
pub fn load_or_create(store: &mut dyn ClientIdStore) -> String {
    match store.load() {
        Ok(Some(id)) if !id.is_empty() => return id,
        Ok(_) => {}
        Err(e) => tracing::warn!("failed to read stored client id: {e}"),
    }

    let id = generate_client_id();
    if let Err(e) = store.save(&id) {
        tracing::warn!("failed to persist client id: {e}");
    }
    tracing::debug!(client_id = %id, "generated new client id");
    id
}

/// Keeps the id in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryClientIdStore {
    id: Option<String>,
}

impl MemoryClientIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an id already stored.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

impl ClientIdStore for MemoryClientIdStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.id.clone())
    }

    fn save(&mut self, id: &str) -> Result<()> {
        self.id = Some(id.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    client_id: String,
}

/// Keeps the id in a small JSON file.
#[derive(Debug, Clone)]
pub struct FileClientIdStore {
    path: PathBuf,
}

impl FileClientIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClientIdStore for FileClientIdStore {
    fn load(&self) -> Result<Option<String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredIdentity = serde_json::from_str(&text)?;
        Ok(Some(stored.client_id))
    }

    fn save(&mut self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&StoredIdentity {
            client_id: id.to_string(),
        })?;
        std::fs::write(&self.path, text)?;
        Ok(())
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
    fn generated_ids_are_numeric() {
        let id = generate_client_id();
        assert!(!id.is_empty());
        assert!(id.len() <= 16);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn memory_store_reuses_id() {
        let mut store = MemoryClientIdStore::new();
        let first = load_or_create(&mut store);
        let second = load_or_create(&mut store);
        assert_eq!(first, second);
    }

    #[test]
    fn existing_id_is_returned_untouched() {
        let mut store = MemoryClientIdStore::with_id("42");
        assert_eq!(load_or_create(&mut store), "42");
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile").join("client_id.json");

        let first = load_or_create(&mut FileClientIdStore::new(&path));
        let second = load_or_create(&mut FileClientIdStore::new(&path));
        assert_eq!(first, second);
        assert!(path.exists());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClientIdStore::new(dir.path().join("client_id.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_falls_back_to_new_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_id.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = FileClientIdStore::new(&path);
        assert!(store.load().is_err());
        let id = load_or_create(&mut store);
        assert_eq!(store.load().unwrap().as_deref(), Some(id.as_str()));
    }
}
