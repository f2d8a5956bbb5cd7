//! 页面生成流水线
//!
//! 标题 -> 找图（Agent 自主调用图片工具）-> 生成 HTML -> 自检 ->（未通过时）重新生成一次。
//! 所有阶段共用同一个 ThreadId，后续阶段通过 Agent 侧的线程历史看到关键词、图片 url 与草稿，
//! 流水线本身不重发历史。任一阶段失败即中止整个运行，PageArtifact 保留已完成阶段的结果。
//! 每个 PageGenerator 只运行一次；drop 时通知 Agent 释放该线程的历史。

use std::sync::Arc;
use std::time::Instant;

use async_stream::try_stream;
use chrono::Datelike;
use futures_util::{pin_mut, Stream, StreamExt};

use crate::agent::{ConversationalAgent, FragmentStream, ThreadId};
use crate::core::PageGenError;
use crate::generator::prompts;
use crate::generator::{PageArtifact, Stage, StageMessage};

/// 输出流中各阶段之间的分隔符
pub const STAGE_SEPARATOR: &str = "\n";

/// 单次生成运行：独占一个 ThreadId 与一个 PageArtifact
pub struct PageGenerator {
    agent: Arc<dyn ConversationalAgent>,
    thread: ThreadId,
    user_prompt: String,
    current_year: i32,
    page: PageArtifact,
    completed: Vec<Stage>,
    started: bool,
}

impl PageGenerator {
    pub fn new(agent: Arc<dyn ConversationalAgent>, user_prompt: impl Into<String>) -> Self {
        Self {
            agent,
            thread: ThreadId::new(),
            user_prompt: user_prompt.into(),
            current_year: chrono::Local::now().year(),
            page: PageArtifact::default(),
            completed: Vec::new(),
            started: false,
        }
    }

    /// 覆盖生成提示词中的「今年」
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread
    }

    pub fn page(&self) -> &PageArtifact {
        &self.page
    }

    pub fn into_page(mut self) -> PageArtifact {
        std::mem::take(&mut self.page)
    }

    /// 已完成的阶段（按执行顺序）
    pub fn completed_stages(&self) -> &[Stage] {
        &self.completed
    }

    /// 完整运行的输出：标题、找图片段、HTML 片段、校验结论、（仅未通过时）重新生成片段，阶段之间以换行分隔。
    /// 流被完全消费后可通过 `page()` 读取结果；中途 drop 则停止在途请求，产物保持当时的状态。
    /// 只能调用一次：再次调用得到的流只产出 RunAlreadyStarted，不会向 Agent 发请求。
    pub fn generate(&mut self) -> impl Stream<Item = Result<String, PageGenError>> + Send + '_ {
        let restarted = std::mem::replace(&mut self.started, true);
        try_stream! {
            if restarted {
                Err::<(), _>(PageGenError::RunAlreadyStarted(self.thread.to_string()))?;
            }
            tracing::info!(thread_id = %self.thread, prompt = %self.user_prompt, "page generation started");
            let started = Instant::now();

            let title = self.create_site_title().await?;
            yield title;
            yield STAGE_SEPARATOR.to_string();

            let mut search = self.search_images().await?;
            while let Some(fragment) = search.next().await {
                yield fragment?;
            }
            self.finish(Stage::ImageSearch);
            yield STAGE_SEPARATOR.to_string();

            {
                let html = self.generate_html();
                pin_mut!(html);
                while let Some(fragment) = html.next().await {
                    yield fragment?;
                }
            }
            yield STAGE_SEPARATOR.to_string();

            let verdict = self.check_html().await?;
            yield verdict;
            yield STAGE_SEPARATOR.to_string();

            if !self.page.is_valid() {
                let html = self.regenerate_html();
                pin_mut!(html);
                while let Some(fragment) = html.next().await {
                    yield fragment?;
                }
            }

            tracing::info!(
                thread_id = %self.thread,
                title = %self.page.title(),
                valid = self.page.is_valid(),
                html_bytes = self.page.html_code().len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "page generation finished"
            );
        }
    }

    /// 标题阶段：非流式，结果写入 title
    async fn create_site_title(&mut self) -> Result<String, PageGenError> {
        let stage = StageMessage::new(Stage::Title, prompts::site_title(&self.user_prompt));
        let title = self.invoke(&stage).await?;
        self.page.set_title(title.clone());
        self.finish(Stage::Title);
        Ok(title)
    }

    /// 找图阶段：Agent 选关键词并调用图片工具，url 留在线程历史中；文本片段原样透传
    async fn search_images(&self) -> Result<FragmentStream, PageGenError> {
        let stage = StageMessage::new(Stage::ImageSearch, prompts::find_images(&self.user_prompt));
        self.open_stream(&stage).await
    }

    /// HTML 生成阶段：片段边透传边缓冲，流结束后整体覆盖 html_code
    fn generate_html(&mut self) -> impl Stream<Item = Result<String, PageGenError>> + Send + '_ {
        let stage = StageMessage::new(
            Stage::HtmlGeneration,
            prompts::generate_html(&self.user_prompt, self.current_year),
        );
        self.stream_into_page(stage)
    }

    /// 校验阶段：回复包含肯定词即标记为通过；返回模型原话
    async fn check_html(&mut self) -> Result<String, PageGenError> {
        let stage = StageMessage::new(Stage::Validation, prompts::CHECK_HTML);
        let verdict = self.invoke(&stage).await?;
        if prompts::is_affirmative(&verdict) {
            self.page.mark_valid();
        }
        tracing::info!(thread_id = %self.thread, valid = self.page.is_valid(), verdict = %verdict.trim(), "page validated");
        self.finish(Stage::Validation);
        Ok(verdict)
    }

    /// 重新生成阶段：与 HTML 生成相同的缓冲与覆盖规则；之后不再校验
    fn regenerate_html(&mut self) -> impl Stream<Item = Result<String, PageGenError>> + Send + '_ {
        let stage = StageMessage::new(
            Stage::Regeneration,
            prompts::regenerate_html(&self.user_prompt),
        );
        self.stream_into_page(stage)
    }

    async fn invoke(&self, stage: &StageMessage) -> Result<String, PageGenError> {
        tracing::info!(thread_id = %self.thread, stage = %stage.stage, "stage started");
        self.agent
            .invoke(&self.thread, stage.messages(), stage.temperature)
            .await
    }

    async fn open_stream(&self, stage: &StageMessage) -> Result<FragmentStream, PageGenError> {
        tracing::info!(thread_id = %self.thread, stage = %stage.stage, "stage started");
        self.agent
            .stream(&self.thread, stage.messages(), stage.temperature)
            .await
    }

    fn stream_into_page(
        &mut self,
        stage: StageMessage,
    ) -> impl Stream<Item = Result<String, PageGenError>> + Send + '_ {
        try_stream! {
            let mut fragments = self.open_stream(&stage).await?;
            let mut buffer = String::new();
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                buffer.push_str(&fragment);
                yield fragment;
            }
            self.page.replace_html(buffer);
            self.finish(stage.stage);
        }
    }

    fn finish(&mut self, stage: Stage) {
        tracing::debug!(thread_id = %self.thread, stage = %stage, "stage finished");
        self.completed.push(stage);
    }
}

impl Drop for PageGenerator {
    fn drop(&mut self) {
        self.agent.release(&self.thread);
    }
}
