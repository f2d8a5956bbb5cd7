//! 生成结果：标题、页面源码、校验结论

use serde::Serialize;

/// 一次生成运行的产物，只由所属 PageGenerator 的阶段方法修改
///
/// - `html_code` 总是最近一次生成/重新生成阶段的完整输出，旧稿直接丢弃
/// - `is_valid` 只会从 false 变为 true，不会被重置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageArtifact {
    html_code: String,
    title: String,
    is_valid: bool,
}

impl PageArtifact {
    pub fn html_code(&self) -> &str {
        &self.html_code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// 由标题生成的文件名（`<slug>.html`）；标题为空时为 `page.html`
    pub fn file_name(&self) -> String {
        let slug = self
            .title
            .trim()
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            "page.html".to_string()
        } else {
            format!("{slug}.html")
        }
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// 整体覆盖，不与旧稿合并
    pub(crate) fn replace_html(&mut self, html: String) {
        self.html_code = html;
    }

    pub(crate) fn mark_valid(&mut self) {
        self.is_valid = true;
    }
}
