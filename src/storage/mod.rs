//! 持久化键值存储

pub mod file_store;
pub mod memory_store;

pub use file_store::JsonFileStore;
pub use memory_store::InMemoryStore;

use crate::error::AppResult;

/// 看板上次选择的 limit
pub const DATA_LIMIT_KEY: &str = "funding_data_limit";
/// 快照集合（JSON 数组）
pub const SNAPSHOTS_KEY: &str = "market_snapshots";

/// 键值存储接口，值统一为字符串
pub trait KeyValueStore: Send + Sync {
    /// 获取值，不存在返回 None
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置值
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}
