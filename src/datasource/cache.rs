//! Dataset disk caching
//!
//! Persists fetched tables keyed by request URL, so revisiting a date does not hit the
//! data service again until the entry expires.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::datasource::types::DataTable;

/// Serialized cache entry stored as JSON on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTable {
    pub url: String,
    pub table: DataTable,
    pub cached_at: DateTime<Utc>,
}

pub struct DatasetCache {
    cache_dir: PathBuf,
    expiration_hours: i64,
}

impl DatasetCache {
    /// Cache under the platform cache directory:
    /// - macOS: ~/Library/Caches/bevymars/datasets/
    /// - Linux: ~/.cache/bevymars/datasets/
    /// - Windows: %LOCALAPPDATA%\bevymars\datasets\
    pub fn new(expiration_hours: i64) -> Result<Self, anyhow::Error> {
        let proj_dirs = ProjectDirs::from("", "", "bevymars")
            .ok_or_else(|| anyhow::anyhow!("Failed to resolve cache directory"))?;
        Self::new_in_dir(proj_dirs.cache_dir().join("datasets"), expiration_hours)
    }

    pub fn new_in_dir(cache_dir: PathBuf, expiration_hours: i64) -> Result<Self, anyhow::Error> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            expiration_hours,
        })
    }

    /// Returns Ok(None) on a miss, including a hash collision with a different URL.
    pub fn read(&self, url: &str) -> Result<Option<CachedTable>, anyhow::Error> {
        let path = self.cache_path(url);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let cached: CachedTable = serde_json::from_str(&contents)?;
        if cached.url != url {
            return Ok(None);
        }
        Ok(Some(cached))
    }

    pub fn write(&self, url: &str, table: &DataTable) -> Result<(), anyhow::Error> {
        let entry = CachedTable {
            url: url.to_string(),
            table: table.clone(),
            cached_at: Utc::now(),
        };
        fs::write(self.cache_path(url), serde_json::to_string(&entry)?)?;
        Ok(())
    }

    pub fn is_valid(&self, entry: &CachedTable) -> bool {
        Utc::now().signed_duration_since(entry.cached_at) < Duration::hours(self.expiration_hours)
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        self.cache_dir.join(format!("{:016x}.json", hasher.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::types::DatasetKind;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "bevymars-dataset-cache-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ))
    }

    fn table() -> DataTable {
        DataTable {
            kind: DatasetKind::Ngims,
            rows: vec![vec!["2019-06-01T00:00:00Z".into(), "1.5e7".into()]],
        }
    }

    #[test]
    fn test_cache_write_and_read() {
        let cache = DatasetCache::new_in_dir(unique_temp_dir("write_read"), 24)
            .expect("Failed to create cache");
        let url = "https://example.test/in_situ_kp_ngims.jsond?time,ngims_ar_density&";
        cache.write(url, &table()).expect("Failed to write to cache");

        let cached = cache
            .read(url)
            .expect("Failed to read from cache")
            .expect("Cache entry not found");
        assert_eq!(cached.table, table());
        assert!(cache.is_valid(&cached));
    }

    #[test]
    fn test_cache_miss() {
        let cache = DatasetCache::new_in_dir(unique_temp_dir("miss"), 24)
            .expect("Failed to create cache");
        assert!(cache.read("https://example.test/nothing").unwrap().is_none());
    }

    #[test]
    fn test_cache_expiration() {
        let cache = DatasetCache::new_in_dir(unique_temp_dir("expiration"), 1)
            .expect("Failed to create cache");
        let entry = CachedTable {
            url: "u".into(),
            table: table(),
            cached_at: Utc::now() - Duration::hours(2),
        };
        assert!(!cache.is_valid(&entry));
    }

    #[test]
    fn test_cache_file_persistence() {
        let dir = unique_temp_dir("persistence");
        let url = "https://example.test/mgitm.jsond?Latitude,Longitude,co2&altitude=98.75";
        DatasetCache::new_in_dir(dir.clone(), 24)
            .unwrap()
            .write(url, &table())
            .unwrap();

        let reopened = DatasetCache::new_in_dir(dir, 24).unwrap();
        assert!(reopened.read(url).unwrap().is_some());
    }
}
