use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bybit::bybit_client::BybitClient;
use crate::bybit::BybitApiResponse;
use crate::error::{AppError, AppResult};
use crate::funding::fetcher::MarketDataSource;
use crate::funding::rate_calculator::parse_float_prefix;

/// 线性合约 ticker，数值字段保持交易所返回的字符串原样
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TickersData {
    pub symbol: String,
    #[serde(default)]
    pub funding_rate: String,
    #[serde(default)]
    pub funding_interval_hour: String,
    #[serde(default, rename = "turnover24h")]
    pub turnover24h: String,
}

impl TickersData {
    pub fn new(symbol: &str, funding_rate: &str, interval_hour: &str, turnover24h: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            funding_rate: funding_rate.to_string(),
            funding_interval_hour: interval_hour.to_string(),
            turnover24h: turnover24h.to_string(),
        }
    }

    /// 成交额，无法解析时为 NaN
    pub fn turnover(&self) -> f64 {
        parse_float_prefix(&self.turnover24h)
    }

    /// 资金费率，无法解析时为 NaN
    pub fn rate(&self) -> f64 {
        parse_float_prefix(&self.funding_rate)
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TickersResult {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub list: Option<Vec<TickersData>>,
}

pub type TickersResponse = BybitApiResponse<TickersResult>;

impl TickersResponse {
    /// 取出 result.list，缺失即视为响应格式错误
    pub fn into_list(self) -> AppResult<Vec<TickersData>> {
        match self.result.and_then(|r| r.list) {
            Some(list) => Ok(list),
            None => Err(AppError::InvalidResponseShape(format!(
                "missing result.list (retCode={:?}, retMsg={:?})",
                self.ret_code, self.ret_msg
            ))),
        }
    }
}

/// Bybit 公共行情
pub struct BybitMarket {
    client: BybitClient,
}

impl BybitMarket {
    pub fn new(client: BybitClient) -> Self {
        BybitMarket { client }
    }

    /// 获取全部线性合约行情
    pub async fn get_tickers(&self) -> AppResult<Vec<TickersData>> {
        let res: TickersResponse = self.client.send_request().await?;
        let list = res.into_list()?;
        debug!("fetched {} tickers from {}", list.len(), self.client.url());
        Ok(list)
    }
}

#[async_trait]
impl MarketDataSource for BybitMarket {
    async fn fetch_tickers(&self) -> AppResult<Vec<TickersData>> {
        self.get_tickers().await
    }
}
