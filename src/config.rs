//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PAGEGEN__*` 覆盖（双下划线表示嵌套，如 `PAGEGEN__LLM__MODEL=deepseek-chat`）。
//! 凭据未写入配置时回退到 `DEEPSEEK_API_KEY` / `UNSPLASH_CLIENT_ID` 环境变量。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::PageGenError;
use crate::llm::deepseek::{DEEPSEEK_BASE_URL, DEEPSEEK_CHAT};
use crate::unsplash::UNSPLASH_BASE_URL;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub unsplash: UnsplashSection,
    pub generator: GeneratorSection,
}

/// [llm] 段：DeepSeek（OpenAI 兼容）端点、模型与凭据
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    DEEPSEEK_BASE_URL.to_string()
}

fn default_model() -> String {
    DEEPSEEK_CHAT.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl LlmSection {
    /// 配置优先，其次环境变量 DEEPSEEK_API_KEY
    pub fn resolve_api_key(&self) -> Result<String, PageGenError> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok())
            .ok_or_else(|| {
                PageGenError::Config(
                    "missing DeepSeek API key (llm.api_key or DEEPSEEK_API_KEY)".to_string(),
                )
            })
    }
}

/// [unsplash] 段：图片搜索端点、client_id、超时
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashSection {
    #[serde(default = "default_unsplash_base_url")]
    pub base_url: String,
    pub client_id: Option<String>,
    #[serde(default = "default_unsplash_timeout")]
    pub timeout_secs: u64,
    /// 每次搜索返回的结果数；未设置时使用 Unsplash 默认值
    pub per_page: Option<u32>,
}

fn default_unsplash_base_url() -> String {
    UNSPLASH_BASE_URL.to_string()
}

fn default_unsplash_timeout() -> u64 {
    3
}

impl Default for UnsplashSection {
    fn default() -> Self {
        Self {
            base_url: default_unsplash_base_url(),
            client_id: None,
            timeout_secs: default_unsplash_timeout(),
            per_page: None,
        }
    }
}

impl UnsplashSection {
    pub fn resolve_client_id(&self) -> Result<String, PageGenError> {
        self.client_id
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("UNSPLASH_CLIENT_ID").ok())
            .ok_or_else(|| {
                PageGenError::Config(
                    "missing Unsplash client id (unsplash.client_id or UNSPLASH_CLIENT_ID)"
                        .to_string(),
                )
            })
    }
}

/// [generator] 段：工具调用轮数上限、输出目录、调试日志
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSection {
    /// 单个阶段内 Agent 最多连续调用工具的轮数
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 以 debug 级别记录每一轮 Agent 请求
    #[serde(default)]
    pub debug: bool,
}

fn default_max_tool_rounds() -> usize {
    8
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("pages")
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            output_dir: default_output_dir(),
            debug: false,
        }
    }
}

/// 从 config 目录加载配置，环境变量 PAGEGEN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PAGEGEN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PAGEGEN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.base_url, "https://api.deepseek.com");
        assert_eq!(cfg.llm.model, "deepseek-chat");
        assert_eq!(cfg.unsplash.base_url, "https://api.unsplash.com");
        assert_eq!(cfg.unsplash.timeout_secs, 3);
        assert_eq!(cfg.generator.max_tool_rounds, 8);
        assert!(!cfg.generator.debug);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[llm]
model = "deepseek-reasoner"
api_key = "sk-test"

[unsplash]
client_id = "abc"
per_page = 20

[generator]
max_tool_rounds = 3
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.model, "deepseek-reasoner");
        assert_eq!(cfg.llm.base_url, "https://api.deepseek.com");
        assert_eq!(cfg.llm.resolve_api_key().unwrap(), "sk-test");
        assert_eq!(cfg.unsplash.resolve_client_id().unwrap(), "abc");
        assert_eq!(cfg.unsplash.per_page, Some(20));
        assert_eq!(cfg.generator.max_tool_rounds, 3);
    }
}
