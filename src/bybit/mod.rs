use serde::{Deserialize, Serialize};

pub mod bybit_client;
pub mod market;

// 通用的响应结构体，result 缺失时为 None
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BybitApiResponse<T> {
    #[serde(default)]
    pub ret_code: Option<i64>,
    #[serde(default)]
    pub ret_msg: Option<String>,
    #[serde(default)]
    pub result: Option<T>,
}
