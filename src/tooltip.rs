//! Entity tooltips and the cache that keeps them between requests.
//!
//! Tooltips are keyed by a hash of the entity's source path and are
//! considered fresh while the stored modification time matches the source.
//! Cache failures never surface: the tooltip is rebuilt from the descriptor.

use crate::descriptor::{ColumnDescriptor, EntityDescriptor, JoinColumnDescriptor};
use crate::svg::escape_xml;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt cache entry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cache lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    /// Modification time of the source the content was built from.
    pub expire: i64,
}

pub trait TooltipCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;
}

#[derive(Debug, Default)]
pub struct MemoryTooltipCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TooltipCache for MemoryTooltipCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileTooltipCache {
    dir: PathBuf,
}

impl FileTooltipCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl TooltipCache for FileTooltipCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let source = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&source)?))
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), serde_json::to_string(&entry)?)?;
        Ok(())
    }
}

pub fn cache_key(source_path: &str) -> String {
    hex::encode(Sha256::digest(source_path.as_bytes()))
}

pub struct TooltipService<C> {
    cache: C,
}

impl<C: TooltipCache> TooltipService<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Tooltip for the entity defined at `source_path`, last modified at
    /// `file_time`. With `use_cache` off the cache is neither read nor written.
    pub fn entity_tooltip(
        &self,
        source_path: &str,
        file_time: i64,
        descriptor: &EntityDescriptor,
        use_cache: bool,
    ) -> String {
        if !use_cache {
            return format_tooltip(descriptor, file_time);
        }

        let key = cache_key(source_path);
        match self.cache.get(&key) {
            Ok(Some(entry)) if entry.expire == file_time => return entry.content,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = source_path, error = %e, "tooltip cache read failed");
            }
        }

        let content = format_tooltip(descriptor, file_time);
        let entry = CacheEntry {
            content: content.clone(),
            expire: file_time,
        };
        if let Err(e) = self.cache.put(&key, entry) {
            tracing::warn!(path = source_path, error = %e, "tooltip cache write failed");
        }
        content
    }
}

/// HTML summary of an entity: names and update time, then its columns,
/// primary keys and join columns.
pub fn format_tooltip(descriptor: &EntityDescriptor, file_time: i64) -> String {
    let summary = format!(
        "<table><tbody><tr><td>Entity Name</td><td>{}</td></tr><tr><td>Table Name</td><td>{}</td></tr><tr><td>Last Update</td><td>{}</td></tr></tbody></table>",
        escape_xml(&descriptor.entity_name),
        escape_xml(&descriptor.table_name),
        file_time
    );

    let mut table = String::from("<table><tbody>");
    table.push_str(r#"<tr><td colspan="2">Columns</td></tr>"#);
    for column in &descriptor.columns {
        table.push_str(&row(&column.name, &column.data_type));
    }
    if !descriptor.primary_keys.is_empty() {
        table.push_str(r#"<tr><td colspan="2">Primary Keys</td></tr>"#);
        for key in &descriptor.primary_keys {
            table.push_str(&row(key, ""));
        }
    }
    if !descriptor.join_columns.is_empty() {
        table.push_str(r#"<tr><td colspan="2">Join Columns</td></tr>"#);
        for join in &descriptor.join_columns {
            table.push_str(&row(&join.name, join.reference_column()));
        }
    }
    table.push_str("</tbody></table>");

    format!(
        r#"<div>{}<div class="horizontal-line"></div>{}</div>"#,
        summary, table
    )
}

fn row(left: &str, right: &str) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td></tr>",
        escape_xml(left),
        escape_xml(right)
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipData<'a> {
    pub entity_name: &'a str,
    pub filetime: i64,
    pub columns: &'a [ColumnDescriptor],
    pub primary_keys: &'a [String],
    pub join_columns: &'a [JoinColumnDescriptor],
}

/// Tooltip content as structured JSON for client-side rendering.
pub fn tooltip_json(descriptor: &EntityDescriptor, file_time: i64) -> serde_json::Value {
    let data = TooltipData {
        entity_name: &descriptor.entity_name,
        filetime: file_time,
        columns: &descriptor.columns,
        primary_keys: &descriptor.primary_keys,
        join_columns: &descriptor.join_columns,
    };
    serde_json::to_value(data).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn admin() -> EntityDescriptor {
        EntityDescriptor::new("Admin", "admin")
            .primary_key("admin_id", "varchar")
            .column("admin_level_id", "varchar")
            .join("admin_level_id", "AdminLevel", "admin_level_id")
    }

    /// Cache that fails every call and counts writes.
    #[derive(Default)]
    struct BrokenCache {
        writes: Cell<usize>,
    }

    impl TooltipCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Poisoned)
        }

        fn put(&self, _key: &str, _entry: CacheEntry) -> Result<(), CacheError> {
            self.writes.set(self.writes.get() + 1);
            Err(CacheError::Poisoned)
        }
    }

    #[test]
    fn test_format_tooltip() {
        let html = format_tooltip(&admin(), 1700000000);
        assert!(html.starts_with("<div><table>"));
        assert!(html.contains("<tr><td>Entity Name</td><td>Admin</td></tr>"));
        assert!(html.contains("<tr><td>Last Update</td><td>1700000000</td></tr>"));
        assert!(html.contains("<tr><td>admin_id</td><td>varchar</td></tr>"));
        assert!(html.contains(r#"<tr><td colspan="2">Primary Keys</td></tr><tr><td>admin_id</td><td></td></tr>"#));
        assert!(html.contains("<tr><td>admin_level_id</td><td>admin_level_id</td></tr>"));
    }

    #[test]
    fn test_cache_key_is_stable_hex() {
        let key = cache_key("/entities/Admin.php");
        assert_eq!(key.len(), 64);
        assert_eq!(key, cache_key("/entities/Admin.php"));
        assert_ne!(key, cache_key("/entities/Role.php"));
    }

    #[test]
    fn test_cache_hit_and_refresh() {
        let service = TooltipService::new(MemoryTooltipCache::default());
        let key = cache_key("Admin.php");
        service
            .cache()
            .put(&key, CacheEntry { content: "cached".to_string(), expire: 10 })
            .unwrap();

        assert_eq!(service.entity_tooltip("Admin.php", 10, &admin(), true), "cached");

        let fresh = service.entity_tooltip("Admin.php", 11, &admin(), true);
        assert!(fresh.contains("Admin"));
        let stored = service.cache().get(&key).unwrap().unwrap();
        assert_eq!(stored.expire, 11);
        assert_eq!(stored.content, fresh);
    }

    #[test]
    fn test_cache_miss_stores() {
        let service = TooltipService::new(MemoryTooltipCache::default());
        let tooltip = service.entity_tooltip("Admin.php", 5, &admin(), true);
        let stored = service.cache().get(&cache_key("Admin.php")).unwrap().unwrap();
        assert_eq!(stored.content, tooltip);
    }

    #[test]
    fn test_cache_disabled() {
        let service = TooltipService::new(MemoryTooltipCache::default());
        service.entity_tooltip("Admin.php", 5, &admin(), false);
        assert!(service.cache().get(&cache_key("Admin.php")).unwrap().is_none());
    }

    #[test]
    fn test_broken_cache_falls_back() {
        let service = TooltipService::new(BrokenCache::default());
        let tooltip = service.entity_tooltip("Admin.php", 5, &admin(), true);
        assert_eq!(tooltip, format_tooltip(&admin(), 5));
        assert_eq!(service.cache().writes.get(), 1);
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = std::env::temp_dir().join(format!("erdraw-tooltip-{}", std::process::id()));
        let cache = FileTooltipCache::new(&dir);
        assert!(cache.get("missing").unwrap().is_none());

        let entry = CacheEntry { content: "<div></div>".to_string(), expire: 42 };
        cache.put("abc", entry.clone()).unwrap();
        assert_eq!(cache.get("abc").unwrap(), Some(entry));

        fs::write(dir.join("bad.json"), "not json").unwrap();
        assert!(matches!(cache.get("bad"), Err(CacheError::Json(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_tooltip_json() {
        let value = tooltip_json(&admin(), 7);
        assert_eq!(value["entityName"], "Admin");
        assert_eq!(value["filetime"], 7);
        assert_eq!(value["columns"][0]["type"], "varchar");
        assert_eq!(value["joinColumns"][0]["propertyType"], "AdminLevel");
    }
}
