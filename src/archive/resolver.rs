//! URL 解析器
//!
//! 把 HTML / CSS 中出现的 URL 字符串映射到归档中的子资源、子框架归档，
//! 或者判定为无法解析（保持原样输出）。
//!
//! 匹配规则：
//!
//! - 与子资源 URL、子框架主资源 URL 做精确字符串比较，不做任何规范化
//! - 先查子资源，再查子框架归档，第一个匹配者胜出
//! - 相对引用先按基准 URL 拼接成绝对 URL，再做精确比较
//! - 当前归档找不到时，沿父归档链向上查找

use tracing::trace;
use url::{ParseError, Url};

use super::{ArchiveRef, Resource};

/// Outcome of resolving a URL inside one archive
#[derive(Clone, Copy, Debug)]
pub enum Resolution<'a> {
    Resource(&'a Resource),
    Subframe(ArchiveRef<'a>),
    /// Not an error: the reference is left untouched
    Unresolved,
}

impl Resolution<'_> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }
}

/// Resolves `url` against the subresources, then the subframe archives, of `archive`
pub fn resolve<'a>(archive: ArchiveRef<'a>, url: &str) -> Resolution<'a> {
    if let Some(resource) = archive.get_subresource(url) {
        return Resolution::Resource(resource);
    }
    if let Some(subframe) = archive.get_subframe_archive(url) {
        return Resolution::Subframe(subframe);
    }
    Resolution::Unresolved
}

/// A reference that resolved, and where
#[derive(Clone, Debug)]
pub struct ScopedMatch<'a> {
    pub resolution: Resolution<'a>,
    /// Archive whose subresources or subframes contained the match
    pub holder: ArchiveRef<'a>,
    /// Number of parent steps from the searching archive to `holder`
    pub distance: usize,
    /// The URL that matched, after joining against the base
    pub url: String,
}

/// Resolves a reference as written in a document
///
/// `reference` is tried verbatim first; a relative reference is additionally
/// joined against `base`. The search starts in `archive` and walks up its
/// parent chain. Returns `None` when nothing matches.
pub fn resolve_reference<'a>(
    archive: ArchiveRef<'a>,
    base: Option<&Url>,
    reference: &str,
) -> Option<ScopedMatch<'a>> {
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let candidates = candidate_urls(base, reference);
    let mut scope = Some(archive);
    let mut distance = 0;

    while let Some(holder) = scope {
        for candidate in &candidates {
            let resolution = resolve(holder, candidate);
            if !resolution.is_unresolved() {
                return Some(ScopedMatch {
                    resolution,
                    holder,
                    distance,
                    url: candidate.clone(),
                });
            }
        }

        scope = holder.parent();
        distance += 1;
    }

    trace!(reference, "reference not found in archive");
    None
}

fn candidate_urls(base: Option<&Url>, reference: &str) -> Vec<String> {
    let mut candidates = vec![reference.to_string()];

    if let (Some(base), Err(ParseError::RelativeUrlWithoutBase)) = (base, Url::parse(reference)) {
        if let Ok(joined) = base.join(reference) {
            let joined = joined.to_string();
            if joined != reference {
                candidates.push(joined);
            }
        }
    }

    candidates
}
