//! # 解析器模块
//!
//! 这个模块包含在原文上就地重写 URL 引用的功能：
//!
//! - HTML 标签与属性的定位和重写（含 `srcset`、`style` 属性、`<style>` 块）
//! - CSS 中 `url()` 与 `@import` 的定位和重写
//!
//! 两个重写器都只替换引用本身，其余字节原样复制。替换值由调用方通过
//! [`LinkResolver`] 提供。
//!
//! # 模块组织
//!
//! - `html` - HTML 扫描、属性解码、`srcset` 解析
//! - `css` - CSS 样式表与声明列表的 URL 重写

pub mod css;
pub mod html;

// Re-export commonly used items for convenience
pub use css::rewrite_css;
pub use html::{parse_srcset, rewrite_html, rewrite_srcset, SrcSetItem};

/// Decides what a URL reference found in a document is replaced with
pub trait LinkResolver {
    /// Replacement for `reference`, or `None` to leave it untouched
    fn substitute(&mut self, reference: &str) -> Option<String>;

    /// Called for `<base href>`; later references are relative to it
    fn set_base(&mut self, _href: &str) {}
}

impl<F> LinkResolver for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn substitute(&mut self, reference: &str) -> Option<String> {
        self(reference)
    }
}

/// Replacement of the byte range `start..end` of a source text
#[derive(Debug)]
pub(crate) struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Splices ordered, non-overlapping edits into `source`
pub(crate) fn apply_edits(source: &str, edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return source.to_string();
    }

    let mut result = String::with_capacity(source.len());
    let mut copied = 0;

    for edit in edits {
        if edit.start < copied {
            continue;
        }
        result.push_str(&source[copied..edit.start]);
        result.push_str(&edit.replacement);
        copied = edit.end;
    }
    result.push_str(&source[copied..]);

    result
}
