//! 市场统计快照：模型、历史排序与持久化

pub mod history;
pub mod model;
pub mod store;

pub use history::{sort_snapshots, HistoryColumn, HistoryViewState};
pub use model::{Snapshot, SnapshotCapture, DEFAULT_LABEL};
pub use store::SnapshotStore;
