//! Sidecar metadata store.
//!
//! Two flat JSON files hold filename-keyed string maps: one for
//! descriptions, one for album labels. Every mutation is a whole-file
//! load-mutate-persist cycle. There is no partial update; an async mutex per
//! sidecar serializes the read-modify-write so concurrent writers cannot
//! interleave partial writes or lose updates. Across processes the contract
//! is still last-writer-wins.
//!
//! The media directory remains the source of truth for what exists; this
//! store is an attribute cache layered on top. Stale keys (files deleted out
//! of band) are tolerated and hidden by the listing.

use crate::config::StorageConfig;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// One sidecar file: a filename -> value map with guarded whole-file writes
#[derive(Debug)]
struct Sidecar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Sidecar {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Read the full map; a missing sidecar file is an empty map
    async fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read(&self.path).await?;
        if contents.is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_slice(&contents)?)
    }

    /// Replace the file with the full map
    async fn save(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let data = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, data).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    /// Remove a key; returns whether it was present
    async fn remove(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        let removed = map.remove(key).is_some();
        if removed {
            self.save(&map).await?;
        }
        Ok(removed)
    }

    async fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}

/// The metadata store: description and album sidecars
#[derive(Debug)]
pub struct MetadataStore {
    descriptions: Sidecar,
    albums: Sidecar,
}

impl MetadataStore {
    /// Create a store over the configured sidecar paths
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            descriptions: Sidecar::new(config.description_sidecar_path()),
            albums: Sidecar::new(config.album_sidecar_path()),
        }
    }

    /// Get the description for a stored filename
    pub async fn description(&self, stored_filename: &str) -> Result<Option<String>> {
        self.descriptions.get(stored_filename).await
    }

    /// Get the album for a stored filename
    pub async fn album(&self, stored_filename: &str) -> Result<Option<String>> {
        self.albums.get(stored_filename).await
    }

    /// Set or clear the description for a stored filename
    ///
    /// An empty value removes the entry; setting twice keeps only the last
    /// value.
    pub async fn set_description(&self, stored_filename: &str, description: &str) -> Result<()> {
        if description.is_empty() {
            self.descriptions.remove(stored_filename).await?;
        } else {
            self.descriptions.set(stored_filename, description).await?;
        }
        debug!(filename = %stored_filename, "Updated description");
        Ok(())
    }

    /// Set or clear the album label for a stored filename
    pub async fn set_album(&self, stored_filename: &str, album: &str) -> Result<()> {
        if album.is_empty() {
            self.albums.remove(stored_filename).await?;
        } else {
            self.albums.set(stored_filename, album).await?;
        }
        debug!(filename = %stored_filename, "Updated album");
        Ok(())
    }

    /// Prune both maps for a deleted filename in one logical operation
    pub async fn remove_entry(&self, stored_filename: &str) -> Result<()> {
        self.descriptions.remove(stored_filename).await?;
        self.albums.remove(stored_filename).await?;
        debug!(filename = %stored_filename, "Pruned metadata entries");
        Ok(())
    }

    /// Full copies of both maps, for the listing join
    pub async fn snapshot(
        &self,
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>)> {
        let descriptions = self.descriptions.snapshot().await?;
        let albums = self.albums.snapshot().await?;
        Ok((descriptions, albums))
    }

    /// Distinct album labels, sorted
    pub async fn album_labels(&self) -> Result<Vec<String>> {
        let map = self.albums.snapshot().await?;
        let mut labels: Vec<String> = map.into_values().collect();
        labels.sort();
        labels.dedup();
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_store() -> (Arc<MetadataStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            media_dir: "media".to_string(),
            thumbnail_dir: "thumbnails".to_string(),
            naming: Default::default(),
        };
        (Arc::new(MetadataStore::new(&config)), temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get_description() {
        let (store, _temp) = create_test_store();

        store.set_description("a.jpg", "sunset").await.unwrap();
        assert_eq!(
            store.description("a.jpg").await.unwrap().as_deref(),
            Some("sunset")
        );
        assert_eq!(store.description("b.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let (store, _temp) = create_test_store();

        store.set_description("a.jpg", "first").await.unwrap();
        store.set_description("a.jpg", "second").await.unwrap();

        let (descriptions, _) = store.snapshot().await.unwrap();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions.get("a.jpg").map(String::as_str), Some("second"));
    }

    #[tokio::test]
    async fn test_empty_value_clears_entry() {
        let (store, _temp) = create_test_store();

        store.set_album("a.jpg", "travel").await.unwrap();
        store.set_album("a.jpg", "").await.unwrap();

        assert_eq!(store.album("a.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_entry_prunes_both_maps() {
        let (store, _temp) = create_test_store();

        store.set_description("a.jpg", "sunset").await.unwrap();
        store.set_album("a.jpg", "travel").await.unwrap();

        store.remove_entry("a.jpg").await.unwrap();

        let (descriptions, albums) = store.snapshot().await.unwrap();
        assert!(!descriptions.contains_key("a.jpg"));
        assert!(!albums.contains_key("a.jpg"));
    }

    #[tokio::test]
    async fn test_remove_missing_entry_is_noop() {
        let (store, _temp) = create_test_store();

        store.set_description("a.jpg", "keep me").await.unwrap();
        store.remove_entry("missing.jpg").await.unwrap();

        let (descriptions, _) = store.snapshot().await.unwrap();
        assert_eq!(descriptions.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_both_survive() {
        let (store, _temp) = create_test_store();

        let s1 = store.clone();
        let s2 = store.clone();

        let t1 = tokio::spawn(async move { s1.set_description("a.jpg", "alpha").await });
        let t2 = tokio::spawn(async move { s2.set_description("b.jpg", "beta").await });

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let (descriptions, _) = store.snapshot().await.unwrap();
        assert_eq!(descriptions.get("a.jpg").map(String::as_str), Some("alpha"));
        assert_eq!(descriptions.get("b.jpg").map(String::as_str), Some("beta"));
    }

    #[tokio::test]
    async fn test_album_labels_distinct_sorted() {
        let (store, _temp) = create_test_store();

        store.set_album("a.jpg", "travel").await.unwrap();
        store.set_album("b.jpg", "family").await.unwrap();
        store.set_album("c.jpg", "travel").await.unwrap();

        assert_eq!(store.album_labels().await.unwrap(), vec!["family", "travel"]);
    }
}
