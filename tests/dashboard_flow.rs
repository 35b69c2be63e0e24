use std::sync::Arc;

use funding_dashboard::bybit::market::TickersData;
use funding_dashboard::dashboard::dialog::ScriptedDialog;
use funding_dashboard::dashboard::render::{Element, RecordingRenderer, Section};
use funding_dashboard::dashboard::view_state::{DataLimit, SortColumn, SortDirection};
use funding_dashboard::dashboard::Dashboard;
use funding_dashboard::funding::fetcher::StaticSource;
use funding_dashboard::snapshot::DEFAULT_LABEL;
use funding_dashboard::storage::{InMemoryStore, KeyValueStore, DATA_LIMIT_KEY};

type TestDashboard = Dashboard<RecordingRenderer, InMemoryStore>;

fn dashboard() -> TestDashboard {
    Dashboard::new(RecordingRenderer::new(), Arc::new(InMemoryStore::new()))
}

fn market(n: usize) -> Vec<TickersData> {
    (0..n)
        .map(|i| {
            // 费率取少量不同的值，制造排序并列
            let rate = format!("{:.4}", (i % 3) as f64 * 0.0001 - 0.0001);
            TickersData::new(
                &format!("T{:02}USDT", i),
                &rate,
                "8",
                &format!("{}", (n - i) * 1_000_000),
            )
        })
        .collect()
}

async fn load(dashboard: &mut TestDashboard, tickers: Vec<TickersData>) {
    assert!(dashboard.refresh(&StaticSource::new(tickers)).await);
}

fn symbols(dashboard: &TestDashboard) -> Vec<String> {
    dashboard
        .view()
        .working_list
        .iter()
        .map(|t| t.symbol.clone())
        .collect()
}

#[tokio::test]
async fn test_btc_eth_average_example() {
    let mut dashboard = dashboard();
    dashboard.set_limit(DataLimit::All);
    load(
        &mut dashboard,
        vec![
            TickersData::new("BTCUSDT", "0.0001", "8", "5000000000"),
            TickersData::new("ETHUSDT", "-0.0002", "8", "3000000000"),
        ],
    )
    .await;

    let renderer = dashboard.renderer();
    assert_eq!(renderer.text(Element::AvgFunding), Some("-5.48%"));
    assert_eq!(
        renderer.classes.get(&Element::AvgFunding).map(|s| s.as_str()),
        Some("negative-text")
    );
    assert_eq!(renderer.text(Element::PosCount), Some("1 (50%)"));
    assert_eq!(renderer.text(Element::NegCount), Some("1 (50%)"));
    assert_eq!(renderer.text(Element::ZeroCount), Some("0 (0%)"));
    assert_eq!(renderer.row_symbols(), vec!["BTC", "ETH"]);
}

#[tokio::test]
async fn test_limit_sizes() {
    let mut dashboard = dashboard();
    load(&mut dashboard, market(30)).await;

    for (limit, expected) in [
        (DataLimit::Top5, 5),
        (DataLimit::Top10, 10),
        (DataLimit::Top25, 25),
        (DataLimit::Top50, 30),
        (DataLimit::All, 30),
    ] {
        dashboard.set_limit(limit);
        assert_eq!(dashboard.view().working_list.len(), expected, "{}", limit);
    }
}

#[tokio::test]
async fn test_blank_search_restores_limit_list() {
    let mut dashboard = dashboard();
    dashboard.set_limit(DataLimit::Top10);
    load(&mut dashboard, market(30)).await;
    let before = symbols(&dashboard);

    dashboard.handle_search("t2");
    assert_eq!(dashboard.view().working_list.len(), 10);
    assert!(symbols(&dashboard).iter().all(|s| s.contains("T2")));

    dashboard.handle_search("   ");
    assert_eq!(symbols(&dashboard), before);
    assert_eq!(
        dashboard.renderer().text(Element::PageTitle),
        Some("Top 10 Funding Rates")
    );
}

#[tokio::test]
async fn test_double_flip_restores_order() {
    let mut dashboard = dashboard();
    dashboard.set_limit(DataLimit::All);
    load(&mut dashboard, market(12)).await;

    for column in SortColumn::ALL {
        dashboard.sort_table(column);
        let original = symbols(&dashboard);
        dashboard.sort_table(column);
        dashboard.sort_table(column);
        assert_eq!(symbols(&dashboard), original, "{:?}", column);
    }
}

#[tokio::test]
async fn test_history_view_toggles_sections() {
    let mut dashboard = dashboard();
    load(&mut dashboard, market(5)).await;
    dashboard.set_limit(DataLimit::History);

    let renderer = dashboard.renderer();
    assert_eq!(renderer.is_visible(Section::MarketStats), Some(false));
    assert_eq!(renderer.is_visible(Section::SearchBar), Some(false));
    assert_eq!(renderer.is_visible(Section::SaveSnapshotButton), Some(false));
    assert_eq!(renderer.is_visible(Section::SnapshotSection), Some(true));
    assert_eq!(renderer.text(Element::PageTitle), Some("Market History"));

    let renders = renderer.row_renders;
    load(&mut dashboard, market(5)).await;
    // 历史视图下刷新不重绘行情表
    assert_eq!(dashboard.renderer().row_renders, renders);
}

#[tokio::test]
async fn test_limit_is_persisted() {
    let store = Arc::new(InMemoryStore::new());
    let mut dashboard = Dashboard::new(RecordingRenderer::new(), Arc::clone(&store));
    dashboard.set_limit(DataLimit::Top50);
    assert_eq!(store.get(DATA_LIMIT_KEY).unwrap(), Some("50".to_string()));

    let mut restored = Dashboard::new(RecordingRenderer::new(), store);
    restored.initialize();
    assert_eq!(restored.view().data_limit, DataLimit::Top50);
    assert_eq!(restored.renderer().active_tab, Some(DataLimit::Top50));
}

#[tokio::test]
async fn test_save_and_edit_default_labels() {
    let mut dashboard = dashboard();
    load(&mut dashboard, market(5)).await;

    let mut dialog = ScriptedDialog::new().answer_with(Some(""));
    dashboard.save_snapshot(&mut dialog).await;
    let saved = dashboard.snapshot_store().load().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].label, DEFAULT_LABEL);
    assert_eq!(saved[0].limit, Some(DataLimit::Top25));
    assert!(saved[0].sentiment.contains(" / "));

    let id = saved[0].id;
    let mut dialog = ScriptedDialog::new().answer_with(Some("renamed"));
    dashboard.edit_snapshot_label(&mut dialog, id).await;
    let mut dialog = ScriptedDialog::new().answer_with(Some(""));
    dashboard.edit_snapshot_label(&mut dialog, id).await;

    let saved = dashboard.snapshot_store().load().unwrap();
    assert_eq!(saved[0].id, id);
    assert_eq!(saved[0].label, DEFAULT_LABEL);
}

#[tokio::test]
async fn test_destructive_ops_need_confirmation() {
    let mut dashboard = dashboard();
    let mut dialog = ScriptedDialog::new().answer_with(Some("keep"));
    dashboard.save_snapshot(&mut dialog).await;
    let id = dashboard.snapshot_store().load().unwrap()[0].id;

    let mut dialog = ScriptedDialog::new();
    dashboard.delete_snapshot(&mut dialog, id).await;
    dashboard.clear_snapshots(&mut dialog).await;
    assert_eq!(dashboard.snapshot_store().load().unwrap().len(), 1);
    assert_eq!(dialog.asked.len(), 2);

    let mut dialog = ScriptedDialog::new().confirm_with(true);
    dashboard.delete_snapshot(&mut dialog, id).await;
    assert!(dashboard.snapshot_store().load().unwrap().is_empty());
    assert!(dashboard.renderer().snapshots.is_empty());
}

#[tokio::test]
async fn test_history_sort_indicator() {
    let mut dashboard = dashboard();
    dashboard.set_limit(DataLimit::History);
    dashboard.sort_history(funding_dashboard::snapshot::HistoryColumn::Avg);

    let indicators = &dashboard.renderer().history_indicators;
    assert_eq!(indicators.len(), 1);
    assert_eq!(
        indicators.get(&funding_dashboard::snapshot::HistoryColumn::Avg),
        Some(&SortDirection::Desc)
    );
}

#[tokio::test]
async fn test_sentiment_counts_whole_market() {
    let mut dashboard = dashboard();
    load(&mut dashboard, market(30)).await;
    dashboard.set_limit(DataLimit::Top5);
    dashboard.handle_search("T1");
    // 搜索中再刷新一次
    load(&mut dashboard, market(30)).await;

    assert!(dashboard.view().is_searching);
    assert!(dashboard.view().working_list.len() < 30);
    let renderer = dashboard.renderer();
    assert_eq!(renderer.text(Element::PosCount), Some("10 (33%)"));
    assert_eq!(renderer.text(Element::NegCount), Some("10 (33%)"));
    assert_eq!(renderer.text(Element::ZeroCount), Some("10 (33%)"));
}
