//! 快照存储
//!
//! 整个集合以 JSON 数组保存在 `market_snapshots` 键下，每次操作都读-改-写。
//! 只有看板事件循环会调用这里，因此不加锁；多进程共享同一存储时需要额外的并发控制。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tracing::{error, info, warn};

use crate::dashboard::dialog::DialogPort;
use crate::dashboard::view_state::SortDirection;
use crate::error::{AppError, AppResult};
use crate::snapshot::history::{sort_snapshots, HistoryColumn};
use crate::snapshot::model::{normalize_label, Snapshot, SnapshotCapture};
use crate::storage::{KeyValueStore, SNAPSHOTS_KEY};
use crate::time_util::{iso_date_today, mill_time_to_local_display, now_millis};

/// 导入冲突时新 id 的随机偏移上限
const ID_JITTER: i64 = 100_000;

pub struct SnapshotStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Clone for SnapshotStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 读取全部快照（按插入顺序，新的在前）
    pub fn load(&self) -> AppResult<Vec<Snapshot>> {
        match self.store.get(SNAPSHOTS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw).map_err(|e| {
                AppError::Storage(format!("stored snapshots are corrupted: {}", e))
            }),
            _ => Ok(Vec::new()),
        }
    }

    fn persist(&self, snapshots: &[Snapshot]) -> AppResult<()> {
        let payload = serde_json::to_string(snapshots)?;
        self.store.set(SNAPSHOTS_KEY, &payload)
    }

    /// 保存快照，插入到最前面
    pub fn save(&self, capture: SnapshotCapture, label: Option<&str>) -> AppResult<Snapshot> {
        let id = now_millis();
        let snapshot = Snapshot {
            id,
            timestamp: mill_time_to_local_display(id).unwrap_or_else(|_| id.to_string()),
            label: normalize_label(label),
            limit: Some(capture.limit),
            avg: capture.avg,
            median: capture.median,
            sentiment: capture.sentiment,
        };

        let mut snapshots = self.load()?;
        snapshots.insert(0, snapshot.clone());
        self.persist(&snapshots)?;
        info!("snapshot saved: id={}, label={}", snapshot.id, snapshot.label);
        Ok(snapshot)
    }

    /// 按 id 删除，返回删除条数
    pub fn delete(&self, id: i64) -> AppResult<usize> {
        let mut snapshots = self.load()?;
        let before = snapshots.len();
        snapshots.retain(|s| s.id != id);
        self.persist(&snapshots)?;
        Ok(before - snapshots.len())
    }

    /// 修改标签，空标签回退为默认值；id 不存在返回 false
    pub fn edit_label(&self, id: i64, new_label: &str) -> AppResult<bool> {
        let mut snapshots = self.load()?;
        let Some(target) = snapshots.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        target.label = normalize_label(Some(new_label));
        self.persist(&snapshots)?;
        Ok(true)
    }

    pub fn find(&self, id: i64) -> AppResult<Option<Snapshot>> {
        Ok(self.load()?.into_iter().find(|s| s.id == id))
    }

    pub fn clear_all(&self) -> AppResult<()> {
        self.store.set(SNAPSHOTS_KEY, "[]")
    }

    /// 导出文件名：market_snapshots_<YYYY-MM-DD>.json
    pub fn export_file_name() -> String {
        format!("market_snapshots_{}.json", iso_date_today())
    }

    /// 原样导出存储内容到目录，返回文件路径
    pub fn export(&self, dir: &Path) -> AppResult<PathBuf> {
        let raw = self
            .store
            .get(SNAPSHOTS_KEY)?
            .unwrap_or_else(|| "[]".to_string());
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::export_file_name());
        std::fs::write(&path, raw)?;
        info!("snapshots exported to {}", path.display());
        Ok(path)
    }

    /// 合并导入，返回新增条数
    ///
    /// 先按 (timestamp, label, avg) 去重；内容不同但 id 冲突时重新生成 id。
    /// 任何一条记录无法解析都不会写入。
    pub fn import_str(&self, content: &str) -> AppResult<usize> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| AppError::ParseFailure(e.to_string()))?;
        let serde_json::Value::Array(items) = value else {
            return Err(AppError::InvalidImportFormat);
        };
        let incoming = items
            .into_iter()
            .map(serde_json::from_value::<Snapshot>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::ParseFailure(e.to_string()))?;

        let mut current = self.load()?;
        let mut ids: HashSet<i64> = current.iter().map(|s| s.id).collect();
        let mut added = 0;

        for mut snapshot in incoming {
            if current.iter().any(|c| c.same_content(&snapshot)) {
                continue;
            }
            if ids.contains(&snapshot.id) {
                snapshot.id = mint_id(&ids);
            }
            ids.insert(snapshot.id);
            current.push(snapshot);
            added += 1;
        }

        self.persist(&current)?;
        info!("imported {} snapshots", added);
        Ok(added)
    }

    pub fn import_file(&self, path: &Path) -> AppResult<usize> {
        let content = std::fs::read_to_string(path)?;
        self.import_str(&content).map_err(|e| {
            error!("import {} failed: {}", path.display(), e);
            e
        })
    }

    /// 按历史表排序列出
    pub fn list(&self, column: HistoryColumn, direction: SortDirection) -> AppResult<Vec<Snapshot>> {
        let mut snapshots = self.load()?;
        sort_snapshots(&mut snapshots, column, direction);
        Ok(snapshots)
    }

    /// 询问标签后保存；取消返回 None
    pub async fn save_interactive<D: DialogPort + ?Sized>(
        &self,
        dialog: &mut D,
        capture: SnapshotCapture,
    ) -> AppResult<Option<Snapshot>> {
        let Some(label) = dialog
            .prompt("Enter a label for this snapshot (optional):", "")
            .await
        else {
            return Ok(None);
        };
        self.save(capture, Some(&label)).map(Some)
    }

    /// 确认后删除
    pub async fn delete_confirmed<D: DialogPort + ?Sized>(
        &self,
        dialog: &mut D,
        id: i64,
    ) -> AppResult<usize> {
        if !dialog.confirm("Delete this snapshot?").await {
            return Ok(0);
        }
        self.delete(id)
    }

    /// 询问新标签（预填当前标签）后修改
    pub async fn edit_label_interactive<D: DialogPort + ?Sized>(
        &self,
        dialog: &mut D,
        id: i64,
    ) -> AppResult<bool> {
        let Some(existing) = self.find(id)? else {
            warn!("snapshot {} not found", id);
            return Ok(false);
        };
        let Some(new_label) = dialog.prompt("Enter new label:", &existing.label).await else {
            return Ok(false);
        };
        self.edit_label(id, &new_label)
    }

    /// 确认后清空
    pub async fn clear_all_confirmed<D: DialogPort + ?Sized>(&self, dialog: &mut D) -> AppResult<bool> {
        if !dialog
            .confirm("Are you sure you want to delete ALL snapshots? This cannot be undone.")
            .await
        {
            return Ok(false);
        }
        self.clear_all()?;
        Ok(true)
    }
}

/// 当前时间加随机偏移，直到与已有 id 不冲突
fn mint_id(existing: &HashSet<i64>) -> i64 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = now_millis() + rng.gen_range(0..ID_JITTER);
        if !existing.contains(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dialog::ScriptedDialog;
    use crate::dashboard::view_state::DataLimit;
    use crate::snapshot::model::DEFAULT_LABEL;
    use crate::storage::InMemoryStore;

    fn store() -> SnapshotStore<InMemoryStore> {
        SnapshotStore::new(Arc::new(InMemoryStore::new()))
    }

    fn capture() -> SnapshotCapture {
        SnapshotCapture {
            avg: "-5.48%".to_string(),
            median: "-5.48%".to_string(),
            sentiment: "1 (50%) / 1 (50%)".to_string(),
            limit: DataLimit::All,
        }
    }

    #[test]
    fn test_save_prepends_with_default_label() {
        let store = store();
        let first = store.save(capture(), None).unwrap();
        let second = store.save(capture(), Some("second")).unwrap();
        assert_eq!(first.label, DEFAULT_LABEL);
        assert_eq!(first.limit, Some(DataLimit::All));

        let list = store.load().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label, second.label);
    }

    #[test]
    fn test_edit_label_keeps_id() {
        let store = store();
        let saved = store.save(capture(), Some("before")).unwrap();
        assert!(store.edit_label(saved.id, "after").unwrap());
        assert!(store.edit_label(saved.id, "").unwrap());
        let found = store.find(saved.id).unwrap().unwrap();
        assert_eq!(found.label, DEFAULT_LABEL);
        assert!(!store.edit_label(saved.id + 1, "x").unwrap());
    }

    #[test]
    fn test_import_rejects_non_array() {
        let store = store();
        store.save(capture(), None).unwrap();
        assert!(matches!(
            store.import_str(r#"{"id": 1}"#),
            Err(AppError::InvalidImportFormat)
        ));
        assert!(matches!(
            store.import_str("not json"),
            Err(AppError::ParseFailure(_))
        ));
        assert!(matches!(
            store.import_str(r#"[{"id": 1, "label": "ok"}, {"label": "no id"}]"#),
            Err(AppError::ParseFailure(_))
        ));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_import_dedup_within_file() {
        let store = store();
        let content = r#"[
            {"id": 1, "timestamp": "t", "label": "a", "avg": "+1.00%"},
            {"id": 2, "timestamp": "t", "label": "a", "avg": "+1.00%"},
            {"id": 1, "timestamp": "t2", "label": "a", "avg": "+1.00%"}
        ]"#;
        assert_eq!(store.import_str(content).unwrap(), 2);
        let list = store.load().unwrap();
        assert_eq!(list.len(), 2);
        assert_ne!(list[0].id, list[1].id);
    }

    #[test]
    fn test_export_is_verbatim() {
        let store = store();
        store.save(capture(), Some("exported")).unwrap();
        let dir = std::env::temp_dir().join(format!("funding_export_{}", uuid::Uuid::new_v4()));
        let path = store.export(&dir).unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("market_snapshots_"));
        assert!(file_name.ends_with(".json"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            Some(written),
            store.store.get(SNAPSHOTS_KEY).unwrap()
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_interactive_flows() {
        let store = store();

        // 取消输入不保存
        let mut dialog = ScriptedDialog::new().answer_with(None);
        assert!(store.save_interactive(&mut dialog, capture()).await.unwrap().is_none());
        assert!(store.load().unwrap().is_empty());

        let mut dialog = ScriptedDialog::new().answer_with(Some(""));
        let saved = store
            .save_interactive(&mut dialog, capture())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.label, DEFAULT_LABEL);

        // 未确认不删除
        let mut dialog = ScriptedDialog::new().confirm_with(false);
        assert_eq!(store.delete_confirmed(&mut dialog, saved.id).await.unwrap(), 0);
        assert_eq!(store.load().unwrap().len(), 1);

        let mut dialog = ScriptedDialog::new().answer_with(Some("renamed"));
        assert!(store.edit_label_interactive(&mut dialog, saved.id).await.unwrap());
        assert_eq!(store.find(saved.id).unwrap().unwrap().label, "renamed");

        let mut dialog = ScriptedDialog::new().confirm_with(true);
        assert!(store.clear_all_confirmed(&mut dialog).await.unwrap());
        assert!(store.load().unwrap().is_empty());
    }
}
