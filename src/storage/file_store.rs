use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;

/// JSON 文件存储：整个文件是一个 `{key: value}` 对象
///
/// 写入先落临时文件再 rename，避免写到一半的文件。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// 打开存储文件，不存在时视为空
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    AppError::Storage(format!("failed to read {}: {}", path.display(), e))
                })?
            }
        } else {
            debug!("storage file {} not found, starting empty", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            warn!("rename {} failed: {}", tmp.display(), e);
            AppError::Io(e)
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("funding_dashboard_{}", uuid::Uuid::new_v4()))
            .join("storage.json")
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let path = temp_path();
        {
            let store = JsonFileStore::open(&path).unwrap();
            assert_eq!(store.get("funding_data_limit").unwrap(), None);
            store.set("funding_data_limit", "all").unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("funding_data_limit").unwrap(),
            Some("all".to_string())
        );
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupted_file_is_storage_error() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(AppError::Storage(_))
        ));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
