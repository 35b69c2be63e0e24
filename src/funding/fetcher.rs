//! 行情拉取与缓存
//!
//! 每次拉取分配一个递增的代次（generation），响应返回时若已有更新代次的数据落地，
//! 该响应直接丢弃，避免慢请求覆盖新数据。

use std::cmp::Ordering;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::bybit::market::TickersData;
use crate::error::{AppError, AppResult};

/// 只保留 USDT 本位合约
pub const QUOTE_SUFFIX: &str = "USDT";

/// 行情数据源
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_tickers(&self) -> AppResult<Vec<TickersData>>;
}

/// 固定数据源，用于测试与离线运行
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    tickers: Vec<TickersData>,
    failure: Option<String>,
}

impl StaticSource {
    pub fn new(tickers: Vec<TickersData>) -> Self {
        Self {
            tickers,
            failure: None,
        }
    }

    /// 每次拉取都返回网络错误
    pub fn failing(message: &str) -> Self {
        Self {
            tickers: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    async fn fetch_tickers(&self) -> AppResult<Vec<TickersData>> {
        match &self.failure {
            Some(message) => Err(AppError::Network(message.clone())),
            None => Ok(self.tickers.clone()),
        }
    }
}

/// 过滤 USDT 合约并按 24h 成交额降序
///
/// 成交额无法解析时按相等处理，这类合约的相对位置不做保证。
pub fn normalize_tickers(list: Vec<TickersData>) -> Vec<TickersData> {
    let mut tickers: Vec<TickersData> = list
        .into_iter()
        .filter(|t| t.symbol.ends_with(QUOTE_SUFFIX))
        .collect();
    tickers.sort_by(|a, b| {
        b.turnover()
            .partial_cmp(&a.turnover())
            .unwrap_or(Ordering::Equal)
    });
    tickers
}

/// 进程内行情缓存
#[derive(Debug, Default)]
pub struct TickerCache {
    tickers: Vec<TickersData>,
    issued: u64,
    applied: u64,
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按成交额排序后的全部 USDT 合约
    pub fn tickers(&self) -> &[TickersData] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// 发起一次拉取，返回本次的代次
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// 最近一次成功落地的代次
    pub fn applied_generation(&self) -> u64 {
        self.applied
    }

    /// 处理拉取结果
    ///
    /// 过期响应返回 `StaleResponse`；失败结果原样返回，缓存保持不变。
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: AppResult<Vec<TickersData>>,
    ) -> AppResult<&[TickersData]> {
        if generation <= self.applied {
            debug!(
                "drop stale response: generation {} <= applied {}",
                generation, self.applied
            );
            return Err(AppError::StaleResponse {
                generation,
                applied: self.applied,
            });
        }
        let list = result?;
        let raw_len = list.len();
        self.tickers = normalize_tickers(list);
        self.applied = generation;
        info!(
            "ticker cache refreshed: generation={}, raw={}, usdt={}",
            generation,
            raw_len,
            self.tickers.len()
        );
        Ok(&self.tickers)
    }
}
