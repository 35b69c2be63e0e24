use std::sync::Arc;

use anyhow::anyhow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::app_config::DashboardConfig;
use crate::bybit::bybit_client::BybitClient;
use crate::bybit::market::BybitMarket;
use crate::dashboard::command::{Command, HELP_TEXT};
use crate::dashboard::dialog::ConsoleDialog;
use crate::dashboard::render::{RenderPort, TerminalRenderer};
use crate::dashboard::Dashboard;
use crate::funding::fetcher::MarketDataSource;
use crate::job::{spawn_fetch, FetchOutcome};
use crate::storage::{InMemoryStore, JsonFileStore, KeyValueStore};

enum LoopEvent {
    Tick,
    Fetched(FetchOutcome),
    Input(std::io::Result<Option<String>>),
    Shutdown(&'static str),
}

/// 命令执行后事件循环要做的事
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Refresh,
    Quit,
}

fn market_source(config: &DashboardConfig) -> anyhow::Result<Arc<dyn MarketDataSource>> {
    let client = BybitClient::new(config.market_data_url.clone(), config.http_timeout)?;
    Ok(Arc::new(BybitMarket::new(client)))
}

/// 应用入口：`once` 时拉取渲染一次后退出，否则进入交互事件循环
pub async fn run(config: DashboardConfig, once: bool) -> anyhow::Result<()> {
    config.validate()?;
    let source = market_source(&config)?;
    info!(
        "dashboard starting: url={}, interval={:?}, storage={}",
        config.market_data_url,
        config.refresh_interval,
        config.storage_path.display()
    );

    if once {
        return run_once(source).await;
    }

    let store = JsonFileStore::open(&config.storage_path)?;
    let dashboard = Dashboard::new(TerminalRenderer::stdout(), Arc::new(store))
        .with_export_dir(config.export_dir.clone());
    run_loop(dashboard, source, &config).await
}

async fn run_once(source: Arc<dyn MarketDataSource>) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::new(TerminalRenderer::stdout(), Arc::new(InMemoryStore::new()));
    dashboard.initialize();
    if !dashboard.refresh(source.as_ref()).await {
        return Err(anyhow!("market data refresh failed"));
    }
    Ok(())
}

async fn run_loop<R, S>(
    mut dashboard: Dashboard<R, S>,
    source: Arc<dyn MarketDataSource>,
    config: &DashboardConfig,
) -> anyhow::Result<()>
where
    R: RenderPort,
    S: KeyValueStore,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();
    // 第一次 tick 立即触发，即启动时的首次拉取
    let mut timer = tokio::time::interval(config.refresh_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    dashboard.initialize();
    dashboard
        .renderer_mut()
        .notify("Type `help` for commands.");

    loop {
        let event = tokio::select! {
            _ = timer.tick() => LoopEvent::Tick,
            Some(outcome) = rx.recv() => LoopEvent::Fetched(outcome),
            line = lines.next_line(), if stdin_open => LoopEvent::Input(line),
            name = &mut shutdown => LoopEvent::Shutdown(name),
        };

        match event {
            LoopEvent::Tick => {
                let generation = dashboard.begin_refresh();
                spawn_fetch(generation, Arc::clone(&source), tx.clone());
            }
            LoopEvent::Fetched(outcome) => {
                dashboard.complete_refresh(outcome.generation, outcome.result);
            }
            LoopEvent::Input(Ok(Some(line))) => {
                if line.trim().is_empty() {
                    continue;
                }
                match dispatch(&mut dashboard, &mut lines, &line).await {
                    Step::Continue => {}
                    Step::Refresh => {
                        let generation = dashboard.begin_refresh();
                        spawn_fetch(generation, Arc::clone(&source), tx.clone());
                    }
                    Step::Quit => {
                        info!("quit requested");
                        break;
                    }
                }
            }
            LoopEvent::Input(Ok(None)) => {
                // 输入关闭后继续定时刷新，直到收到退出信号
                info!("stdin closed, commands disabled");
                stdin_open = false;
            }
            LoopEvent::Input(Err(e)) => {
                warn!("failed to read command: {}", e);
                stdin_open = false;
            }
            LoopEvent::Shutdown(name) => {
                info!("received {}, shutting down", name);
                break;
            }
        }
    }

    info!("dashboard stopped");
    Ok(())
}

async fn dispatch<R, S, I>(dashboard: &mut Dashboard<R, S>, lines: &mut Lines<I>, line: &str) -> Step
where
    R: RenderPort,
    S: KeyValueStore,
    I: AsyncBufRead + Unpin + Send,
{
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(message) => {
            let renderer = dashboard.renderer_mut();
            renderer.notify(&message);
            renderer.notify(HELP_TEXT);
            return Step::Continue;
        }
    };

    let mut dialog = ConsoleDialog::new(lines);
    match command {
        Command::Limit(limit) => dashboard.set_limit(limit),
        Command::Search(query) => dashboard.handle_search(&query),
        Command::Sort(column) => dashboard.sort_table(column),
        Command::HistorySort(column) => dashboard.sort_history(column),
        Command::Refresh => return Step::Refresh,
        Command::Save => dashboard.save_snapshot(&mut dialog).await,
        Command::Delete(id) => dashboard.delete_snapshot(&mut dialog, id).await,
        Command::Edit(id) => dashboard.edit_snapshot_label(&mut dialog, id).await,
        Command::Clear => dashboard.clear_snapshots(&mut dialog).await,
        Command::Export => {
            dashboard.export_snapshots();
        }
        Command::Import(path) => {
            dashboard.import_snapshots(&path);
        }
        Command::Help => dashboard.renderer_mut().notify(HELP_TEXT),
        Command::Quit => return Step::Quit,
    }
    Step::Continue
}

/// 等待退出信号，返回信号名
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("failed to register signal handlers: {}", e);
                ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    "CTRL+C"
}
