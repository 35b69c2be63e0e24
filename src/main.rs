use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use tracing::error;

use funding_dashboard::app;
use funding_dashboard::app_config::log::setup_logging;
use funding_dashboard::app_config::DashboardConfig;

/// Bybit USDT 永续资金费率看板
#[derive(Parser, Debug)]
#[command(name = "funding_dashboard", version, about)]
struct Args {
    /// 行情接口地址
    #[arg(long)]
    url: Option<String>,

    /// 刷新间隔（秒）
    #[arg(long)]
    interval_secs: Option<u64>,

    /// 存储文件路径
    #[arg(long)]
    storage: Option<PathBuf>,

    /// 快照导出目录
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// 拉取并渲染一次后退出
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    setup_logging()?;

    let args = Args::parse();
    let config = DashboardConfig::from_env()?.with_overrides(
        args.url,
        args.interval_secs,
        args.storage,
        args.export_dir,
    )?;

    if let Err(e) = app::run(config, args.once).await {
        error!("dashboard exited with error: {}", e);
        return Err(e);
    }
    Ok(())
}
