//! pagegen 命令行入口
//!
//! 用法：`pagegen "<需求描述>" [--config path]`
//! 初始化日志、加载配置、在作用域内安装 Unsplash 与 DeepSeek 客户端，
//! 运行生成流水线并把片段实时写到 stdout，最后将页面保存到 output_dir。Ctrl-C 中止在途请求。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use futures_util::{pin_mut, StreamExt};
use tokio::io::AsyncWriteExt;

use pagegen::agent::react::LLM_SLOT;
use pagegen::config::load_config;
use pagegen::llm::{ChatBackend, DeepSeekClient};
use pagegen::tools::{ToolRegistry, UnsplashImagesTool};
use pagegen::unsplash::{UnsplashClient, UNSPLASH_SLOT};
use pagegen::{observability, ClientSlot, PageGenerator, ReactAgent};

fn parse_args() -> anyhow::Result<(String, Option<PathBuf>)> {
    let mut prompt = None;
    let mut config_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(
                    args.next().context("--config requires a path")?,
                ));
            }
            _ if prompt.is_none() => prompt = Some(arg),
            _ => bail!("unexpected argument: {arg}"),
        }
    }
    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .context("usage: pagegen \"<page description>\" [--config path]")?;
    Ok((prompt, config_path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (prompt, config_path) = parse_args()?;
    let cfg = load_config(config_path).context("Failed to load config")?;

    // 日志写 stderr，默认 info，可通过 RUST_LOG 覆盖
    observability::init(cfg.generator.debug);

    let unsplash: ClientSlot<UnsplashClient> = ClientSlot::new(UNSPLASH_SLOT);
    let llm: ClientSlot<dyn ChatBackend> = ClientSlot::new(LLM_SLOT);

    // guard 离开作用域时释放客户端（含出错提前返回）
    let _unsplash_guard = unsplash.setup(Arc::new(
        UnsplashClient::new(
            &cfg.unsplash.base_url,
            cfg.unsplash.resolve_client_id()?,
            Duration::from_secs(cfg.unsplash.timeout_secs),
        )
        .with_per_page(cfg.unsplash.per_page),
    ));
    let _llm_guard = llm.setup(Arc::new(DeepSeekClient::new(
        &cfg.llm.base_url,
        &cfg.llm.model,
        &cfg.llm.resolve_api_key()?,
        Duration::from_secs(cfg.llm.connect_timeout_secs),
    )));

    let mut tools = ToolRegistry::new();
    tools.register(UnsplashImagesTool::new(unsplash.clone()));
    let agent = ReactAgent::new(llm.clone(), tools)
        .with_max_tool_rounds(cfg.generator.max_tool_rounds)
        .with_debug(cfg.generator.debug);

    let mut generator = PageGenerator::new(Arc::new(agent), prompt);

    let completed = {
        let stream = generator.generate();
        pin_mut!(stream);
        let mut stdout = tokio::io::stdout();
        let consume = async {
            while let Some(fragment) = stream.next().await {
                let fragment = fragment.context("Page generation failed")?;
                stdout.write_all(fragment.as_bytes()).await?;
                stdout.flush().await?;
            }
            anyhow::Ok(())
        };
        tokio::select! {
            result = consume => { result?; true }
            _ = tokio::signal::ctrl_c() => false,
        }
    };

    if !completed {
        tracing::warn!(title = %generator.page().title(), "generation interrupted");
        return Ok(());
    }

    let page = generator.into_page();
    tokio::fs::create_dir_all(&cfg.generator.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", cfg.generator.output_dir.display()))?;
    let path = cfg.generator.output_dir.join(page.file_name());
    tokio::fs::write(&path, page.html_code())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(
        title = %page.title(),
        valid = page.is_valid(),
        path = %path.display(),
        "page saved"
    );
    Ok(())
}
