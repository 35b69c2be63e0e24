use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 行情请求失败或返回非 200
    #[error("网络错误: {0}")]
    Network(String),

    /// 行情返回缺少 result.list
    #[error("行情响应格式错误: {0}")]
    InvalidResponseShape(String),

    /// 更早发起的请求晚于新数据返回，结果被丢弃
    #[error("过期的行情响应: generation {generation} < {applied}")]
    StaleResponse { generation: u64, applied: u64 },

    /// 导入文件顶层不是数组
    #[error("Invalid file format: Expected an array of snapshots.")]
    InvalidImportFormat,

    /// 导入文件内容解析失败
    #[error("解析错误: {0}")]
    ParseFailure(String),

    /// 持久化存储读写失败
    #[error("存储错误: {0}")]
    Storage(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl AppError {
    /// 是否应当在表格中提示用户（其余错误只记录日志）
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::InvalidImportFormat | AppError::ParseFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visible_errors() {
        assert!(AppError::Network("timeout".to_string()).is_user_visible());
        assert!(AppError::InvalidImportFormat.is_user_visible());
        assert!(AppError::ParseFailure("eof".to_string()).is_user_visible());
        assert!(!AppError::Storage("locked".to_string()).is_user_visible());
        assert!(!AppError::InvalidResponseShape("{}".to_string()).is_user_visible());
        assert!(!AppError::StaleResponse { generation: 1, applied: 2 }.is_user_visible());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
