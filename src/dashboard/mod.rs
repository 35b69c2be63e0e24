//! 资金费率看板
//!
//! [`Dashboard`] 持有全部会话状态（视图、行情缓存、历史排序）并只通过
//! [`RenderPort`] 输出。所有修改都在事件循环中顺序发生。

pub mod command;
pub mod dialog;
pub mod render;
pub mod view_state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bybit::market::TickersData;
use crate::error::{AppError, AppResult};
use crate::funding::fetcher::{MarketDataSource, TickerCache};
use crate::funding::rate_calculator::{compute_funding_stats, stat_class};
use crate::funding::sentiment::{aggregate, SentimentStats};
use crate::funding::table_renderer::{build_rows, EMPTY_MESSAGE, ERROR_MESSAGE, LOADING_MESSAGE};
use crate::snapshot::history::{HistoryColumn, HistoryViewState};
use crate::snapshot::model::SnapshotCapture;
use crate::snapshot::store::SnapshotStore;
use crate::storage::{KeyValueStore, DATA_LIMIT_KEY};

use dialog::DialogPort;
use render::{Element, RenderPort, Section};
use view_state::{DataLimit, SortColumn, ViewState};

/// 统计尚未计算时快照中保存的占位值
const PENDING_STAT: &str = "...";
const EMPTY_SENTIMENT: &str = "0 / 0";

pub struct Dashboard<R: RenderPort, S: KeyValueStore> {
    view: ViewState,
    history: HistoryViewState,
    cache: TickerCache,
    store: Arc<S>,
    snapshots: SnapshotStore<S>,
    renderer: R,
    export_dir: PathBuf,
}

impl<R: RenderPort, S: KeyValueStore> Dashboard<R, S> {
    pub fn new(renderer: R, store: Arc<S>) -> Self {
        Self {
            view: ViewState::new(),
            history: HistoryViewState::default(),
            cache: TickerCache::new(),
            snapshots: SnapshotStore::new(Arc::clone(&store)),
            store,
            renderer,
            export_dir: PathBuf::from("."),
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn history(&self) -> &HistoryViewState {
        &self.history
    }

    pub fn tickers(&self) -> &[TickersData] {
        self.cache.tickers()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn snapshot_store(&self) -> &SnapshotStore<S> {
        &self.snapshots
    }

    /// 启动：加载提示、默认布局、快照表，再恢复上次的 limit
    pub fn initialize(&mut self) {
        self.renderer.render_message(LOADING_MESSAGE);
        self.show_limit(self.view.data_limit);
        self.render_snapshots();

        if let Some(limit) = self.saved_limit() {
            info!("restore saved limit: {}", limit);
            self.set_limit(limit);
        }
    }

    /// 存储中的 limit；无法识别时回退到 25
    fn saved_limit(&self) -> Option<DataLimit> {
        match self.store.get(DATA_LIMIT_KEY) {
            Ok(Some(raw)) => Some(DataLimit::parse(&raw).unwrap_or_default()),
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read saved limit: {}", e);
                None
            }
        }
    }

    /// 为下一次拉取分配代次
    pub fn begin_refresh(&mut self) -> u64 {
        self.cache.begin_fetch()
    }

    /// 处理拉取结果，返回是否更新了缓存
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        result: AppResult<Vec<TickersData>>,
    ) -> bool {
        let sentiment = match self.cache.complete_fetch(generation, result) {
            Ok(tickers) => aggregate(tickers),
            Err(AppError::StaleResponse { generation, applied }) => {
                debug!("ignore response {} (applied {})", generation, applied);
                return false;
            }
            Err(e) if e.is_user_visible() => {
                error!("error fetching market data: {}", e);
                self.renderer.render_message(ERROR_MESSAGE);
                return false;
            }
            Err(e) => {
                error!("invalid market data response: {}", e);
                return false;
            }
        };

        self.apply_sentiment(sentiment);
        if self.view.is_searching && self.view.data_limit != DataLimit::History {
            let query = self.view.search_query.clone();
            self.run_search(query);
        } else {
            self.update_top_list();
        }
        true
    }

    /// 拉取并应用一次行情
    pub async fn refresh(&mut self, source: &dyn MarketDataSource) -> bool {
        let generation = self.begin_refresh();
        let result = source.fetch_tickers().await;
        self.complete_refresh(generation, result)
    }

    // total 为 0 时保留上一次的显示
    fn apply_sentiment(&mut self, sentiment: SentimentStats) {
        if sentiment.total == 0 {
            return;
        }
        self.renderer
            .set_text(Element::PosCount, &sentiment.positive_text(), None);
        self.renderer
            .set_text(Element::NegCount, &sentiment.negative_text(), None);
        self.renderer
            .set_text(Element::ZeroCount, &sentiment.zero_text(), None);
        self.view.sentiment = Some(sentiment);
    }

    /// 切换 Top N / All / History
    pub fn set_limit(&mut self, limit: DataLimit) {
        let was_searching = self.view.is_searching;
        if was_searching && limit != DataLimit::History {
            self.view.clear_search();
        }
        if self.view.data_limit == limit && !was_searching {
            return;
        }

        self.view.data_limit = limit;
        if let Err(e) = self.store.set(DATA_LIMIT_KEY, &limit.as_key()) {
            warn!("failed to persist limit {}: {}", limit, e);
        }
        self.show_limit(limit);

        if limit == DataLimit::History {
            self.render_snapshots();
        } else {
            self.update_top_list();
        }
    }

    // 标签页、区域显示与标题
    fn show_limit(&mut self, limit: DataLimit) {
        for tab in DataLimit::TABS {
            self.renderer.set_tab_active(tab, tab == limit);
        }

        let history = limit == DataLimit::History;
        self.renderer.set_visible(Section::MarketStats, !history);
        self.renderer.set_visible(Section::MarketTable, !history);
        self.renderer.set_visible(Section::SearchBar, !history);
        self.renderer.set_visible(Section::SaveSnapshotButton, !history);
        self.renderer.set_visible(Section::SnapshotSection, history);

        self.renderer
            .set_text(Element::PageTitle, &limit.title(), None);
    }

    /// 按 limit 截取缓存，重新统计并排序
    pub fn update_top_list(&mut self) {
        if self.cache.is_empty() || self.view.data_limit == DataLimit::History {
            return;
        }
        self.view.working_list = self.view.limit_slice(self.cache.tickers());
        self.update_stats();
        self.apply_sort();
    }

    // 没有有效值时保留上一次的统计
    fn update_stats(&mut self) {
        let Some(stats) = compute_funding_stats(&self.view.working_list) else {
            return;
        };
        self.renderer.set_text(
            Element::AvgFunding,
            &stats.avg_text(),
            Some(stat_class(stats.avg)),
        );
        self.renderer.set_text(
            Element::MedianFunding,
            &stats.median_text(),
            Some(stat_class(stats.median)),
        );
        self.view.stats = Some(stats);
    }

    /// 搜索合约；空查询退出搜索并恢复 limit 列表
    pub fn handle_search(&mut self, query: &str) {
        if self.view.data_limit == DataLimit::History {
            self.renderer
                .notify("Search is not available in the history view.");
            return;
        }

        let query = query.trim().to_uppercase();
        if query.is_empty() {
            self.view.clear_search();
            self.renderer
                .set_text(Element::PageTitle, &self.view.data_limit.title(), None);
            self.update_top_list();
            return;
        }
        self.run_search(query);
    }

    fn run_search(&mut self, query: String) {
        self.view.is_searching = true;
        self.view.search_query = query;
        self.renderer
            .set_text(Element::PageTitle, &self.view.title(), None);

        self.view.working_list =
            ViewState::search_matches(&self.view.search_query, self.cache.tickers());
        self.update_stats();
        self.apply_sort();
    }

    /// 点击列头排序
    pub fn sort_table(&mut self, column: SortColumn) {
        self.view.toggle_sort(column);
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        for column in SortColumn::ALL {
            self.renderer.set_sort_indicator(column, None);
        }
        self.renderer
            .set_sort_indicator(self.view.sort_column, Some(self.view.sort_direction));

        self.view.sort_working_list();
        if self.view.working_list.is_empty() {
            self.renderer.render_message(EMPTY_MESSAGE);
        } else {
            let rows = build_rows(&self.view.working_list);
            self.renderer.render_rows(&rows);
        }
    }

    pub fn sort_history(&mut self, column: HistoryColumn) {
        self.history.toggle_sort(column);
        self.render_snapshots();
    }

    /// 按历史排序渲染快照表
    pub fn render_snapshots(&mut self) {
        let list = match self
            .snapshots
            .list(self.history.sort_column, self.history.sort_direction)
        {
            Ok(list) => list,
            Err(e) => {
                error!("failed to load snapshots: {}", e);
                self.renderer.notify(&format!("Failed to load snapshots: {}", e));
                return;
            }
        };

        for column in HistoryColumn::ALL {
            self.renderer.set_history_sort_indicator(column, None);
        }
        self.renderer.set_history_sort_indicator(
            self.history.sort_column,
            Some(self.history.sort_direction),
        );
        self.renderer.render_snapshots(&list);
    }

    /// 当前显示的统计值
    pub fn capture(&self) -> SnapshotCapture {
        SnapshotCapture {
            avg: self
                .view
                .stats
                .map(|s| s.avg_text())
                .unwrap_or_else(|| PENDING_STAT.to_string()),
            median: self
                .view
                .stats
                .map(|s| s.median_text())
                .unwrap_or_else(|| PENDING_STAT.to_string()),
            sentiment: self
                .view
                .sentiment
                .map(|s| s.summary())
                .unwrap_or_else(|| EMPTY_SENTIMENT.to_string()),
            limit: self.view.data_limit,
        }
    }

    fn report(&mut self, action: &str, err: AppError) {
        error!("{} failed: {}", action, err);
        self.renderer.notify(&format!("{} failed: {}", action, err));
    }

    pub async fn save_snapshot<D: DialogPort + ?Sized>(&mut self, dialog: &mut D) {
        // 历史视图下没有保存按钮
        if self.view.data_limit == DataLimit::History {
            self.renderer
                .notify("Switch to a market view to save a snapshot.");
            return;
        }
        let capture = self.capture();
        match self.snapshots.save_interactive(dialog, capture).await {
            Ok(Some(snapshot)) => {
                self.renderer
                    .notify(&format!("Snapshot \"{}\" saved.", snapshot.label));
                self.render_snapshots();
            }
            Ok(None) => debug!("save snapshot cancelled"),
            Err(e) => self.report("Save snapshot", e),
        }
    }

    pub async fn delete_snapshot<D: DialogPort + ?Sized>(&mut self, dialog: &mut D, id: i64) {
        match self.snapshots.delete_confirmed(dialog, id).await {
            Ok(_) => self.render_snapshots(),
            Err(e) => self.report("Delete snapshot", e),
        }
    }

    pub async fn edit_snapshot_label<D: DialogPort + ?Sized>(&mut self, dialog: &mut D, id: i64) {
        match self.snapshots.edit_label_interactive(dialog, id).await {
            Ok(true) => self.render_snapshots(),
            Ok(false) => debug!("snapshot {} not edited", id),
            Err(e) => self.report("Edit snapshot", e),
        }
    }

    pub async fn clear_snapshots<D: DialogPort + ?Sized>(&mut self, dialog: &mut D) {
        match self.snapshots.clear_all_confirmed(dialog).await {
            Ok(true) => self.render_snapshots(),
            Ok(false) => {}
            Err(e) => self.report("Clear snapshots", e),
        }
    }

    pub fn export_snapshots(&mut self) -> Option<PathBuf> {
        let dir = self.export_dir.clone();
        match self.snapshots.export(&dir) {
            Ok(path) => {
                self.renderer
                    .notify(&format!("Exported snapshots to {}", path.display()));
                Some(path)
            }
            Err(e) => {
                self.report("Export", e);
                None
            }
        }
    }

    /// 从文件合并导入，返回新增条数
    pub fn import_snapshots(&mut self, path: &Path) -> Option<usize> {
        let result = self.snapshots.import_file(path);
        self.finish_import(result)
    }

    pub fn import_snapshots_str(&mut self, content: &str) -> Option<usize> {
        let result = self.snapshots.import_str(content);
        self.finish_import(result)
    }

    fn finish_import(&mut self, result: AppResult<usize>) -> Option<usize> {
        match result {
            Ok(added) => {
                self.render_snapshots();
                self.renderer
                    .notify(&format!("Imported {} snapshots successfully.", added));
                Some(added)
            }
            Err(e @ AppError::InvalidImportFormat) => {
                self.renderer.notify(&e.to_string());
                None
            }
            Err(e) if e.is_user_visible() => {
                error!("import failed: {}", e);
                self.renderer.notify("Error parsing JSON file.");
                None
            }
            Err(e) => {
                self.report("Import", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::render::RecordingRenderer;
    use crate::storage::InMemoryStore;

    fn dashboard() -> Dashboard<RecordingRenderer, InMemoryStore> {
        Dashboard::new(RecordingRenderer::new(), Arc::new(InMemoryStore::new()))
    }

    fn load(dashboard: &mut Dashboard<RecordingRenderer, InMemoryStore>, tickers: Vec<TickersData>) {
        let generation = dashboard.begin_refresh();
        assert!(dashboard.complete_refresh(generation, Ok(tickers)));
    }

    fn market(n: usize) -> Vec<TickersData> {
        (0..n)
            .map(|i| {
                TickersData::new(
                    &format!("C{}USDT", i),
                    "0.0001",
                    "8",
                    &format!("{}", 1000 - i),
                )
            })
            .collect()
    }

    #[test]
    fn test_initialize_restores_saved_limit() {
        let store = Arc::new(InMemoryStore::new());
        store.set(DATA_LIMIT_KEY, "history").unwrap();
        let mut dashboard = Dashboard::new(RecordingRenderer::new(), store);
        dashboard.initialize();

        assert_eq!(dashboard.view().data_limit, DataLimit::History);
        let renderer = dashboard.renderer();
        assert_eq!(renderer.text(Element::PageTitle), Some("Market History"));
        assert_eq!(renderer.is_visible(Section::MarketTable), Some(false));
        assert_eq!(renderer.is_visible(Section::SnapshotSection), Some(true));
        assert_eq!(renderer.active_tab, Some(DataLimit::History));
    }

    #[test]
    fn test_initialize_with_unknown_limit_uses_default() {
        let store = Arc::new(InMemoryStore::new());
        store.set(DATA_LIMIT_KEY, "7").unwrap();
        let mut dashboard = Dashboard::new(RecordingRenderer::new(), store);
        dashboard.initialize();
        assert_eq!(dashboard.view().data_limit, DataLimit::Top25);
        assert_eq!(dashboard.renderer().message.as_deref(), Some(LOADING_MESSAGE));
    }

    #[test]
    fn test_network_error_keeps_rows_cache() {
        let mut dashboard = dashboard();
        load(&mut dashboard, market(3));
        let generation = dashboard.begin_refresh();
        assert!(!dashboard.complete_refresh(generation, Err(AppError::Network("502".to_string()))));
        assert_eq!(dashboard.renderer().message.as_deref(), Some(ERROR_MESSAGE));
        assert_eq!(dashboard.tickers().len(), 3);
    }

    #[test]
    fn test_invalid_shape_is_silent() {
        let mut dashboard = dashboard();
        let generation = dashboard.begin_refresh();
        let res = Err(AppError::InvalidResponseShape("{}".to_string()));
        assert!(!dashboard.complete_refresh(generation, res));
        assert_eq!(dashboard.renderer().message, None);
    }

    #[test]
    fn test_same_limit_while_searching_restores_list() {
        let mut dashboard = dashboard();
        load(&mut dashboard, market(30));
        dashboard.handle_search("c1");
        assert!(dashboard.view().is_searching);
        assert_eq!(dashboard.renderer().text(Element::PageTitle), Some("Search Results: \"C1\""));

        dashboard.set_limit(DataLimit::Top25);
        assert!(!dashboard.view().is_searching);
        assert_eq!(dashboard.view().working_list.len(), 25);
        assert_eq!(
            dashboard.renderer().text(Element::PageTitle),
            Some("Top 25 Funding Rates")
        );
    }

    #[test]
    fn test_refresh_while_searching_keeps_filter() {
        let mut dashboard = dashboard();
        load(&mut dashboard, market(30));
        dashboard.handle_search("C2");
        let matched = dashboard.view().working_list.len();
        load(&mut dashboard, market(30));
        assert!(dashboard.view().is_searching);
        assert_eq!(dashboard.view().working_list.len(), matched);
    }

    #[test]
    fn test_search_rejected_in_history() {
        let mut dashboard = dashboard();
        dashboard.set_limit(DataLimit::History);
        dashboard.handle_search("BTC");
        assert!(!dashboard.view().is_searching);
        assert_eq!(dashboard.renderer().notifications.len(), 1);
    }

    #[test]
    fn test_sort_indicator_single_column() {
        let mut dashboard = dashboard();
        load(&mut dashboard, market(5));
        dashboard.sort_table(SortColumn::Symbol);
        let indicators = &dashboard.renderer().sort_indicators;
        assert_eq!(indicators.len(), 1);
        assert_eq!(
            indicators.get(&SortColumn::Symbol),
            Some(&view_state::SortDirection::Desc)
        );
    }

    #[test]
    fn test_capture_before_first_fetch() {
        let dashboard = dashboard();
        let capture = dashboard.capture();
        assert_eq!(capture.avg, "...");
        assert_eq!(capture.sentiment, "0 / 0");
        assert_eq!(capture.limit, DataLimit::Top25);
    }

    #[test]
    fn test_import_io_error_is_reported() {
        let mut dashboard = dashboard();
        let missing = std::env::temp_dir().join(format!("missing_{}.json", uuid::Uuid::new_v4()));
        assert_eq!(dashboard.import_snapshots(&missing), None);
        let notes = &dashboard.renderer().notifications;
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Import failed:"));
    }
}
