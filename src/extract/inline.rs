//! 单文件模式：把资源递归内联为 `data:` URL
//!
//! 文本资源（HTML/CSS）在编码之前先重写其内部引用，因此生成的 `data:` URL
//! 已经包含完整内联后的内容。正在内联的资源 URL 保存在一个栈中，
//! 再次引用栈中的 URL 时保持原样，以此避免循环引用导致的无限递归。

use std::borrow::Cow;

use tracing::trace;
use url::Url;

use crate::archive::{resolve_reference, ArchiveRef, Resolution, Resource, ResourceKind};
use crate::parsers::{rewrite_css, rewrite_html, LinkResolver};
use crate::utils::url::create_data_url;

/// Embedding state for one extraction call
#[derive(Debug, Default)]
pub struct Inliner<'a> {
    /// URLs currently being embedded, outermost first
    stack: Vec<&'a str>,
}

impl<'a> Inliner<'a> {
    pub fn new() -> Self {
        Inliner { stack: vec![] }
    }

    /// Text of `resource` with every resolvable reference inlined
    ///
    /// `None` for resources that are not HTML or CSS.
    pub fn render_text(
        &mut self,
        archive: ArchiveRef<'a>,
        resource: &'a Resource,
    ) -> Option<String> {
        let kind = resource.kind();
        if kind == ResourceKind::Opaque {
            return None;
        }
        let text = resource.text()?;

        self.stack.push(resource.url());
        let mut resolver = InlineResolver {
            inliner: self,
            archive,
            base: Url::parse(resource.url()).ok(),
        };
        let rendered = match kind {
            ResourceKind::Html => rewrite_html(&text, &mut resolver),
            _ => rewrite_css(&text, &mut resolver),
        };
        self.stack.pop();

        Some(rendered)
    }

    /// Bytes of `resource`, re-encoded after inlining when it is HTML or CSS
    pub fn render(&mut self, archive: ArchiveRef<'a>, resource: &'a Resource) -> Cow<'a, [u8]> {
        match self.render_text(archive, resource) {
            Some(text) => Cow::Owned(resource.encode_text(&text)),
            None => Cow::Borrowed(resource.data()),
        }
    }

    fn is_embedding(&self, url: &str) -> bool {
        self.stack.iter().any(|embedding| *embedding == url)
    }

    fn data_url(
        &mut self,
        archive: ArchiveRef<'a>,
        resource: &'a Resource,
        rewrite: bool,
    ) -> Option<String> {
        if self.is_embedding(resource.url()) {
            trace!(url = resource.url(), "reference cycle, leaving reference untouched");
            return None;
        }

        let data = if rewrite {
            self.render(archive, resource)
        } else {
            Cow::Borrowed(resource.data())
        };
        Some(create_data_url(
            resource.mime_type(),
            resource.charset().unwrap_or_default(),
            &data,
            resource.url(),
        ))
    }
}

/// Resolves the references of one document to `data:` URLs
struct InlineResolver<'i, 'a> {
    inliner: &'i mut Inliner<'a>,
    archive: ArchiveRef<'a>,
    base: Option<Url>,
}

impl LinkResolver for InlineResolver<'_, '_> {
    fn substitute(&mut self, reference: &str) -> Option<String> {
        let found = resolve_reference(self.archive, self.base.as_ref(), reference)?;

        match found.resolution {
            Resolution::Resource(resource) => self.inliner.data_url(found.holder, resource, true),
            Resolution::Subframe(subframe) => {
                // A frame document that is not HTML is embedded as it is
                let main = subframe.main_resource()?;
                let is_html = main.kind() == ResourceKind::Html;
                self.inliner.data_url(subframe, main, is_html)
            }
            Resolution::Unresolved => None,
        }
    }

    fn set_base(&mut self, href: &str) {
        let joined = match &self.base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        if let Ok(base) = joined {
            self.base = Some(base);
        }
    }
}
