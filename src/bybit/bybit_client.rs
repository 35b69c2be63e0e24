use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 公共行情接口客户端，无需签名
#[derive(Debug, Clone)]
pub struct BybitClient {
    client: Client,
    url: String,
}

impl BybitClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(BybitClient {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET 请求并反序列化响应体
    ///
    /// 请求失败或非 200 返回 `Network`；响应体不是预期 JSON 返回 `InvalidResponseShape`。
    pub async fn send_request<T: DeserializeOwned>(&self) -> AppResult<T> {
        let response = self.client.get(&self.url).send().await?;

        let status_code = response.status();
        let response_body = response.text().await?;
        debug!(
            "url:{}, status:{}, body_len:{}",
            self.url,
            status_code,
            response_body.len()
        );

        if status_code != StatusCode::OK {
            return Err(AppError::Network(format!("请求失败: HTTP {}", status_code)));
        }

        serde_json::from_str::<T>(&response_body).map_err(|e| {
            let preview: String = response_body.chars().take(200).collect();
            AppError::InvalidResponseShape(format!("{}: {}", e, preview))
        })
    }
}
