use std::sync::Arc;

use dashmap::DashMap;

use crate::error::AppResult;
use crate::storage::KeyValueStore;

/// 内存存储（DashMap），进程退出即丢失
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    map: Arc<DashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
