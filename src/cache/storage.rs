// Storage implementation for provider responses

use crate::errors::LapDeltaError;
use log::{debug, info, warn};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait defining the interface for provider response caching
pub trait ResponseCache {
    /// Store a response under the given key
    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LapDeltaError>;

    /// Load a previously stored response, `None` on a cache miss
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LapDeltaError>;

    /// Check if a response exists for the given key
    fn contains(&self, key: &str) -> bool;

    /// Remove a single entry
    fn evict(&mut self, key: &str) -> Result<(), LapDeltaError>;

    /// List the keys of all stored entries
    fn keys(&self) -> Result<Vec<String>, LapDeltaError>;
}

/// Directory backed cache with an in-memory layer in front of it.
///
/// The directory is created once, when the cache is constructed. Creating a
/// cache over an existing directory reuses its entries.
pub struct FileBasedCache {
    /// Base directory for cache entries
    cache_path: PathBuf,
    /// Serialized entries already read or written by this process
    memory: HashMap<String, String>,
}

impl FileBasedCache {
    /// Create a cache rooted at `cache_path`
    pub fn new(cache_path: PathBuf) -> Result<Self, LapDeltaError> {
        fs::create_dir_all(&cache_path).map_err(|e| LapDeltaError::CacheIOError {
            operation: format!("create cache directory {:?}", cache_path),
            source: e,
        })?;
        info!("Using provider cache at {:?}", cache_path);

        Ok(Self {
            cache_path,
            memory: HashMap::new(),
        })
    }

    /// Create the cache in the default user cache directory
    pub fn new_default() -> Result<Self, LapDeltaError> {
        Self::new(Self::default_cache_path()?)
    }

    /// Get the default location for cached provider responses
    pub fn default_cache_path() -> Result<PathBuf, LapDeltaError> {
        let cache_dir = dirs::cache_dir().ok_or(LapDeltaError::NoCacheDir)?;
        Ok(cache_dir.join("lapdelta").join("provider"))
    }

    /// Map a key to a file name without collisions: lowercase ASCII letters,
    /// digits and `-` are kept, `/` becomes `.` and every other byte is
    /// escaped as `_XX`. Uppercase letters are escaped too, so distinct keys
    /// stay distinct on case-insensitive file systems.
    fn normalize_key(key: &str) -> String {
        let mut normalized = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'0'..=b'9' | b'-' => normalized.push(byte as char),
                b'/' => normalized.push('.'),
                _ => normalized.push_str(&format!("_{:02X}", byte)),
            }
        }
        normalized
    }

    fn file_path_for_key(&self, key: &str) -> PathBuf {
        self.cache_path
            .join(format!("{}.json", Self::normalize_key(key)))
    }

    /// Clear the in-memory layer, entries on disk are kept
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Get the cache directory path
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

impl ResponseCache for FileBasedCache {
    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LapDeltaError> {
        let normalized = Self::normalize_key(key);
        let content = serde_json::to_string(value)
            .map_err(|e| LapDeltaError::CacheSerializeError { source: e })?;

        fs::write(self.file_path_for_key(key), &content).map_err(|e| {
            LapDeltaError::CacheIOError {
                operation: format!("write entry {}", normalized),
                source: e,
            }
        })?;
        debug!("Stored cache entry {}", normalized);

        self.memory.insert(normalized, content);
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LapDeltaError> {
        let normalized = Self::normalize_key(key);

        let content = match self.memory.get(&normalized) {
            Some(content) => content.clone(),
            None => {
                let file_path = self.file_path_for_key(key);
                if !file_path.exists() {
                    debug!("Cache miss for {}", normalized);
                    return Ok(None);
                }
                fs::read_to_string(&file_path).map_err(|e| LapDeltaError::CacheIOError {
                    operation: format!("read entry {}", normalized),
                    source: e,
                })?
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!("Cache hit for {}", normalized);
                Ok(Some(value))
            }
            Err(e) => {
                // A corrupt entry behaves like a miss, the caller refetches and overwrites it
                warn!("Ignoring unreadable cache entry {}: {}", normalized, e);
                Ok(None)
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.memory.contains_key(&Self::normalize_key(key)) || self.file_path_for_key(key).exists()
    }

    fn evict(&mut self, key: &str) -> Result<(), LapDeltaError> {
        let file_path = self.file_path_for_key(key);
        if file_path.exists() {
            fs::remove_file(&file_path).map_err(|e| LapDeltaError::CacheIOError {
                operation: format!("remove entry {:?}", file_path),
                source: e,
            })?;
        }
        self.memory.remove(&Self::normalize_key(key));
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, LapDeltaError> {
        let entries = fs::read_dir(&self.cache_path).map_err(|e| LapDeltaError::CacheIOError {
            operation: "list entries".to_string(),
            source: e,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LapDeltaError::CacheIOError {
                operation: "list entries".to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LapRecord;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_lap() -> LapRecord {
        LapRecord {
            driver: "VER".to_string(),
            team: Some("Red Bull Racing".to_string()),
            lap_number: 12,
            lap_time_s: Some(91.234),
            compound: Some("SOFT".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_creation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cache");

        let cache = FileBasedCache::new(path.clone()).unwrap();
        assert_eq!(cache.cache_path(), path.as_path());
        assert!(path.exists());

        // Second construction over the same directory must not fail
        FileBasedCache::new(path).unwrap();
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(
            FileBasedCache::normalize_key("2024/Monza/Q/VER/12"),
            "2024._4Donza._51._56_45_52.12"
        );
        assert_eq!(
            FileBasedCache::normalize_key("monza_q-1712/laps"),
            "monza_5Fq-1712.laps"
        );
    }

    #[test]
    fn test_similar_keys_do_not_collide() {
        let keys = ["a-b/VER/1", "a_b/ver/1", "a_b/VER/1", "a-b/ver/1", "a b/VER/1"];
        let normalized: HashSet<String> =
            keys.iter().map(|k| FileBasedCache::normalize_key(k)).collect();
        assert_eq!(normalized.len(), keys.len());

        let temp_dir = TempDir::new().unwrap();
        let mut cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();
        let mut lap = create_test_lap();
        cache.store("a-b/VER/1", &lap).unwrap();
        lap.lap_number = 13;
        cache.store("a_b/ver/1", &lap).unwrap();
        cache.clear_memory();

        let first: Option<LapRecord> = cache.load("a-b/VER/1").unwrap();
        let second: Option<LapRecord> = cache.load("a_b/ver/1").unwrap();
        assert_eq!(first.map(|l| l.lap_number), Some(12));
        assert_eq!(second.map(|l| l.lap_number), Some(13));
        assert_eq!(cache.keys().unwrap().len(), 2);
    }

    #[test]
    fn test_store_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();

        let lap = create_test_lap();
        cache.store("session/VER/12", &lap).unwrap();

        let loaded: Option<LapRecord> = cache.load("session/VER/12").unwrap();
        assert_eq!(loaded, Some(lap));
        assert!(cache.contains("session/VER/12"));
    }

    #[test]
    fn test_load_after_clearing_memory_reads_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();

        let lap = create_test_lap();
        cache.store("session/VER/12", &lap).unwrap();
        cache.clear_memory();

        let loaded: Option<LapRecord> = cache.load("session/VER/12").unwrap();
        assert_eq!(loaded, Some(lap));
    }

    #[test]
    fn test_miss_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();

        let loaded: Option<LapRecord> = cache.load("missing").unwrap();
        assert!(loaded.is_none());
        assert!(!cache.contains("missing"));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{not json").unwrap();

        let loaded: Option<LapRecord> = cache.load("broken").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_evict_and_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = FileBasedCache::new(temp_dir.path().to_path_buf()).unwrap();

        cache.store("b", &create_test_lap()).unwrap();
        cache.store("a", &create_test_lap()).unwrap();
        assert_eq!(cache.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        cache.evict("a").unwrap();
        assert!(!cache.contains("a"));
        assert_eq!(cache.keys().unwrap(), vec!["b".to_string()]);
    }
}
