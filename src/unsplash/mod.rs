//! Unsplash 图片搜索
//!
//! 单次 GET /search/photos，关键词以逗号拼接为 query；每个请求都带 client_id 参数。
//! 非 2xx 与响应格式不符均转为 RemoteService 错误，不重试；结果保持上游顺序，取 urls.regular。

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::core::{ClientSlot, PageGenError};

pub const UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";

const SERVICE: &str = "unsplash";
const KEYWORD_SEPARATOR: &str = ",";

/// 插槽名（用于 ClientNotInitialized 报错）
pub const UNSPLASH_SLOT: &str = "unsplash";

#[derive(Debug, Deserialize)]
struct SearchPhotosResponse {
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Unsplash 客户端：持有 reqwest Client（含超时）、base_url 与 client_id
pub struct UnsplashClient {
    client: Client,
    base_url: String,
    client_id: String,
    per_page: Option<u32>,
}

impl UnsplashClient {
    pub fn new(base_url: &str, client_id: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            per_page: None,
        }
    }

    pub fn with_per_page(mut self, per_page: Option<u32>) -> Self {
        self.per_page = per_page;
        self
    }

    /// GET 请求，自动附加 client_id 认证参数
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Response, PageGenError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("client_id", self.client_id.as_str())])
            .send()
            .await
            .map_err(|e| PageGenError::remote(SERVICE, format!("Request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PageGenError::remote_status(
                SERVICE,
                status.as_u16(),
                if body.is_empty() { status.to_string() } else { body },
            ));
        }
        Ok(resp)
    }

    /// 按关键词搜索图片，返回 regular 分辨率的 url 列表（顺序与上游一致）
    pub async fn search_photos(&self, keywords: &[String]) -> Result<Vec<String>, PageGenError> {
        let mut params = vec![("query", keywords.join(KEYWORD_SEPARATOR))];
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }

        let resp = self.get("/search/photos", &params).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| PageGenError::remote(SERVICE, format!("Read body: {e}")))?;
        let urls = parse_search_results(&body)?;
        tracing::info!(query = %params[0].1, results = urls.len(), "unsplash search");
        Ok(urls)
    }
}

fn parse_search_results(body: &str) -> Result<Vec<String>, PageGenError> {
    let payload: SearchPhotosResponse = serde_json::from_str(body)
        .map_err(|e| PageGenError::remote(SERVICE, format!("Malformed payload: {e}")))?;
    Ok(payload
        .results
        .into_iter()
        .map(|photo| photo.urls.regular)
        .collect())
}

/// 通过插槽取已初始化的客户端再搜索；未 setup 时直接返回 ClientNotInitialized
pub async fn get_images(
    slot: &ClientSlot<UnsplashClient>,
    keywords: &[String],
) -> Result<Vec<String>, PageGenError> {
    let client = slot.get()?;
    client.search_photos(keywords).await
}
