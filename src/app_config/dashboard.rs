use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::env::{env_or_default, env_u64};
use crate::error::{AppError, AppResult};

pub const DEFAULT_MARKET_DATA_URL: &str =
    "https://api.bybit.com/v5/market/tickers?category=linear";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STORAGE_PATH: &str = "data/dashboard_storage.json";

/// 看板运行配置
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// 行情接口地址
    pub market_data_url: String,
    /// 轮询间隔
    pub refresh_interval: Duration,
    pub http_timeout: Duration,
    /// 键值存储文件
    pub storage_path: PathBuf,
    /// 快照导出目录
    pub export_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            export_dir: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    /// 从环境变量读取，缺失或非法的数值回退到默认值
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            market_data_url: env_or_default("MARKET_DATA_URL", DEFAULT_MARKET_DATA_URL),
            refresh_interval: Duration::from_secs(env_u64(
                "REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )),
            http_timeout: Duration::from_secs(env_u64(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            storage_path: PathBuf::from(env_or_default("STORAGE_PATH", DEFAULT_STORAGE_PATH)),
            export_dir: PathBuf::from(env_or_default("EXPORT_DIR", ".")),
        };
        config.validate()?;
        Ok(config)
    }

    /// 命令行参数覆盖环境变量
    pub fn with_overrides(
        mut self,
        url: Option<String>,
        interval_secs: Option<u64>,
        storage: Option<PathBuf>,
        export_dir: Option<PathBuf>,
    ) -> AppResult<Self> {
        if let Some(url) = url {
            self.market_data_url = url;
        }
        if let Some(secs) = interval_secs {
            self.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(storage) = storage {
            self.storage_path = storage;
        }
        if let Some(dir) = export_dir {
            self.export_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.refresh_interval.is_zero() {
            return Err(AppError::Config("refresh interval must be > 0".to_string()));
        }
        if self.http_timeout.is_zero() {
            return Err(AppError::Config("http timeout must be > 0".to_string()));
        }
        if self.market_data_url.trim().is_empty() {
            return Err(AppError::Config("market data url is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let config = DashboardConfig::default()
            .with_overrides(
                Some("http://localhost:9000/tickers".to_string()),
                Some(5),
                None,
                Some(PathBuf::from("/tmp")),
            )
            .unwrap();
        assert_eq!(config.market_data_url, "http://localhost:9000/tickers");
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert_eq!(config.export_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let res = DashboardConfig::default().with_overrides(None, Some(0), None, None);
        assert!(matches!(res, Err(AppError::Config(_))));
    }
}
