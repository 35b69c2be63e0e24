// 行情刷新任务

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bybit::market::TickersData;
use crate::error::AppResult;
use crate::funding::fetcher::MarketDataSource;

/// 一次拉取的结果，带发起时的代次
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub result: AppResult<Vec<TickersData>>,
}

/// 在后台拉取行情，完成后把结果送回事件循环
pub fn spawn_fetch(
    generation: u64,
    source: Arc<dyn MarketDataSource>,
    tx: UnboundedSender<FetchOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("fetch started: generation={}", generation);
        let result = source.fetch_tickers().await;
        if tx.send(FetchOutcome { generation, result }).is_err() {
            // 事件循环已退出
            warn!("fetch {} finished after shutdown", generation);
        }
    })
}
