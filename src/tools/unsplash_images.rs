//! get_images_from_unsplash：把 Unsplash 图片搜索暴露给 Agent
//!
//! 仅转发参数并等待结果，本身不做额外逻辑。输入/输出 schema 由 schemars 生成。

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::core::{ClientSlot, PageGenError};
use crate::tools::Tool;
use crate::unsplash::{get_images, UnsplashClient};

pub const GET_IMAGES_TOOL: &str = "get_images_from_unsplash";

/// 工具参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageSearchArgs {
    /// 网站主题关键词（1-5 个）
    pub topic_keywords: Vec<String>,
}

/// 工具返回值：图片 url 列表
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ImageSearchOutput(Vec<String>);

pub struct UnsplashImagesTool {
    slot: ClientSlot<UnsplashClient>,
}

impl UnsplashImagesTool {
    pub fn new(slot: ClientSlot<UnsplashClient>) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl Tool for UnsplashImagesTool {
    fn name(&self) -> &str {
        GET_IMAGES_TOOL
    }

    fn description(&self) -> &str {
        "Search images by topic keywords via the Unsplash API. Returns a list of image URLs."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schema_for!(ImageSearchArgs)).unwrap_or_else(|_| serde_json::json!({}))
    }

    fn output_schema(&self) -> Value {
        serde_json::to_value(schema_for!(ImageSearchOutput)).unwrap_or_else(|_| serde_json::json!({}))
    }

    async fn execute(&self, args: Value) -> Result<Result<Value, String>, PageGenError> {
        let args: ImageSearchArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return Ok(Err(format!("expected {{\"topic_keywords\": [string]}}: {e}"))),
        };
        if args.topic_keywords.is_empty() {
            return Ok(Err("topic_keywords must not be empty".to_string()));
        }
        let urls = get_images(&self.slot, &args.topic_keywords).await?;
        Ok(Ok(Value::from(urls)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_schemas() {
        let tool = UnsplashImagesTool::new(ClientSlot::new("unsplash"));
        let params = tool.parameters_schema();
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["topic_keywords"]["type"], "array");
        assert_eq!(params["required"][0], "topic_keywords");

        let output = tool.output_schema();
        assert_eq!(output["type"], "array");
        assert_eq!(output["items"]["type"], "string");
    }

    #[tokio::test]
    async fn test_forwards_keywords() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "coffee,beans"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"urls": {"regular": "https://img/1"}}]
            })))
            .mount(&server)
            .await;

        let slot = ClientSlot::new("unsplash");
        let _guard = slot.setup(Arc::new(UnsplashClient::new(
            &server.uri(),
            "id",
            Duration::from_secs(3),
        )));
        let tool = UnsplashImagesTool::new(slot);
        let out = tool
            .execute(serde_json::json!({"topic_keywords": ["coffee", "beans"]}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out, serde_json::json!(["https://img/1"]));
    }

    #[tokio::test]
    async fn test_invalid_args_are_not_errors() {
        let tool = UnsplashImagesTool::new(ClientSlot::new("unsplash"));
        assert!(tool.execute(serde_json::json!({"q": "x"})).await.unwrap().is_err());
        assert!(tool
            .execute(serde_json::json!({"topic_keywords": []}))
            .await
            .unwrap()
            .is_err());
    }

    #[tokio::test]
    async fn test_not_initialized_propagates() {
        let tool = UnsplashImagesTool::new(ClientSlot::new("unsplash"));
        let err = tool
            .execute(serde_json::json!({"topic_keywords": ["tea"]}))
            .await
            .unwrap_err();
        assert!(err.is_client_not_initialized());
    }
}
