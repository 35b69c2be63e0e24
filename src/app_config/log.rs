use std::env;
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::app_config::env::env_is_true;

// 全局变量用于保持日志文件句柄
static INFO_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static ERROR_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

// 日志配置结构体
#[derive(Debug, Clone)]
struct LogConfig {
    app_env: String,
    log_level: String,
    log_dir: String,
    log_rotation: String,
    info_file_name: String,
    error_file_name: String,
    enable_file_logging: bool,
    enable_console_logging: bool,
}

impl LogConfig {
    fn from_env() -> Self {
        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| crate::ENVIRONMENT_LOCAL.to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "log_files".to_string()),
            log_rotation: env::var("LOG_ROTATION").unwrap_or_else(|_| "daily".to_string()),
            info_file_name: env::var("LOG_INFO_FILE").unwrap_or_else(|_| "info.log".to_string()),
            error_file_name: env::var("LOG_ERROR_FILE")
                .unwrap_or_else(|_| "error.log".to_string()),
            enable_file_logging: env_is_true("ENABLE_FILE_LOGGING", true),
            // stdout 用于输出看板，控制台日志默认关闭
            enable_console_logging: env_is_true("ENABLE_CONSOLE_LOGGING", false),
        }
    }
}

// 解析时间轮转策略
fn parse_rotation(s: &str) -> Rotation {
    match s.to_lowercase().as_str() {
        "minutely" | "minute" | "min" => Rotation::MINUTELY,
        "hourly" | "hour" | "hr" => Rotation::HOURLY,
        "daily" | "day" => Rotation::DAILY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn console_layer<S>(level: &str) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(true)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level))
}

// 文件日志不带颜色，附带线程 id
fn file_layer<S, W>(writer: W, level: &str) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
        .with_filter(EnvFilter::new(level))
}

// 设置日志
pub fn setup_logging() -> anyhow::Result<()> {
    let config = LogConfig::from_env();

    // 本地环境或关闭文件日志：仅控制台（stderr）输出
    if config.app_env == crate::ENVIRONMENT_LOCAL || !config.enable_file_logging {
        let subscriber = Registry::default().with(console_layer(&config.log_level));
        tracing::subscriber::set_global_default(subscriber)?;
        info!(
            "Log configuration setup successfully! Environment: {}, Log Level: {}",
            config.app_env, config.log_level
        );
        return Ok(());
    }

    std::fs::create_dir_all(&config.log_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create log directory '{}': {}", config.log_dir, e)
    })?;

    let info_file = RollingFileAppender::new(
        parse_rotation(&config.log_rotation),
        &config.log_dir,
        &config.info_file_name,
    );
    let error_file = RollingFileAppender::new(
        parse_rotation(&config.log_rotation),
        &config.log_dir,
        &config.error_file_name,
    );

    let (info_non_blocking, info_guard) = tracing_appender::non_blocking(info_file);
    let (error_non_blocking, error_guard) = tracing_appender::non_blocking(error_file);

    // 保存guard到全局，防止被丢弃
    INFO_GUARD
        .set(info_guard)
        .map_err(|_| anyhow::anyhow!("Failed to set INFO_GUARD"))?;
    ERROR_GUARD
        .set(error_guard)
        .map_err(|_| anyhow::anyhow!("Failed to set ERROR_GUARD"))?;

    let base = Registry::default()
        .with(file_layer(info_non_blocking, &config.log_level))
        .with(file_layer(error_non_blocking, "error"));

    if config.enable_console_logging {
        tracing::subscriber::set_global_default(base.with(console_layer(&config.log_level)))?;
    } else {
        tracing::subscriber::set_global_default(base)?;
    }

    info!(
        "Log configuration setup successfully! Environment: {}, Log Level: {}, Console Logging: {}",
        config.app_env, config.log_level, config.enable_console_logging
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("HOURLY"), Rotation::HOURLY);
        assert_eq!(parse_rotation("min"), Rotation::MINUTELY);
        assert_eq!(parse_rotation("weekly"), Rotation::DAILY);
    }
}
