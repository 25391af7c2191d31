//! # Webarchive 资源图
//!
//! 这个模块把解码得到的通用值树解释为 webarchive 的对象图：
//!
//! - `WebArchive` - 拥有所有归档与资源的 arena，索引 0 为顶层归档
//! - `Archive` - 一个归档单元（顶层或嵌套的子框架归档）
//! - `Resource` - 归档中的单个文件
//! - `ArchiveRef` - 在 arena 中导航用的只读视图
//!
//! 父归档与资源所属归档都以索引保存，不参与生命周期管理。
//!
//! # 模块组织
//!
//! - `builder` - 按 webarchive 模式构建资源图
//! - `resolver` - URL 到资源 / 子框架归档的解析

pub mod builder;
pub mod resolver;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use tracing::warn;

use crate::core::{is_css_media_type, is_html_media_type, ExtractOptions, Result};
use crate::{extract, plist};

pub use builder::{build, SchemaError};
pub use resolver::{resolve, resolve_reference, Resolution, ScopedMatch};

/// Stable index of an archive inside a [`WebArchive`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveId(usize);

/// Stable index of a resource inside a [`WebArchive`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

impl ArchiveId {
    pub const ROOT: ArchiveId = ArchiveId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a resource's bytes are treated during extraction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Html,
    Css,
    /// Anything else, including text resources without a usable encoding
    Opaque,
}

/// One file inside an archive
#[derive(Clone, Debug)]
pub struct Resource {
    pub(crate) url: String,
    pub(crate) data: Vec<u8>,
    pub(crate) mime_type: String,
    pub(crate) text_encoding: Option<String>,
    pub(crate) frame_name: Option<String>,
    pub(crate) owner: ArchiveId,
}

impl Resource {
    /// Original (absolute) URL, exactly as captured
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Text encoding label, lower-cased
    pub fn text_encoding(&self) -> Option<&str> {
        self.text_encoding.as_deref()
    }

    /// Present on the main resource of subframe archives
    pub fn frame_name(&self) -> Option<&str> {
        self.frame_name.as_deref()
    }

    /// Archive holding this resource
    pub fn owner(&self) -> ArchiveId {
        self.owner
    }

    pub fn encoding(&self) -> Option<&'static Encoding> {
        let label = self.text_encoding.as_deref()?;
        let encoding = Encoding::for_label(label.as_bytes());
        if encoding.is_none() {
            warn!(url = %self.url, label, "unknown text encoding, treating resource as binary");
        }
        encoding
    }

    pub fn kind(&self) -> ResourceKind {
        if self.text_encoding.is_none() {
            return ResourceKind::Opaque;
        }

        if is_html_media_type(&self.mime_type) && self.encoding().is_some() {
            ResourceKind::Html
        } else if is_css_media_type(&self.mime_type) && self.encoding().is_some() {
            ResourceKind::Css
        } else {
            ResourceKind::Opaque
        }
    }

    /// Decodes the resource as text, `None` without a usable encoding
    ///
    /// A byte order mark is kept as U+FEFF so re-encoding reproduces it.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        let encoding = self.encoding()?;
        let (text, had_errors) = encoding.decode_without_bom_handling(&self.data);
        if had_errors {
            warn!(url = %self.url, encoding = encoding.name(), "malformed text, decoded lossily");
        }
        Some(text)
    }

    /// Encodes `text` back into this resource's encoding
    ///
    /// Encodings that cannot be written (UTF-16) produce UTF-8, see [`Resource::charset`].
    pub fn encode_text(&self, text: &str) -> Vec<u8> {
        match self.encoding() {
            Some(encoding) => {
                let (bytes, _, _) = encoding.output_encoding().encode(text);
                bytes.into_owned()
            }
            None => text.as_bytes().to_vec(),
        }
    }

    /// Charset label matching the output of [`Resource::encode_text`]
    pub fn charset(&self) -> Option<&'static str> {
        self.encoding().map(|encoding| encoding.output_encoding().name())
    }
}

/// One webarchive unit, top-level or nested
#[derive(Clone, Debug, Default)]
pub struct Archive {
    pub(crate) main_resource: Option<ResourceId>,
    pub(crate) subresources: Vec<ResourceId>,
    pub(crate) subframe_archives: Vec<ArchiveId>,
    pub(crate) parent: Option<ArchiveId>,
}

/// Arena owning every archive and resource of one webarchive file
#[derive(Clone, Debug)]
pub struct WebArchive {
    pub(crate) archives: Vec<Archive>,
    pub(crate) resources: Vec<Resource>,
}

impl WebArchive {
    /// Opens the `.webarchive` file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WebArchive> {
        let data = fs::read(path.as_ref())?;
        WebArchive::from_bytes(&data)
    }

    /// Decodes a webarchive held in memory
    pub fn from_bytes(data: &[u8]) -> Result<WebArchive> {
        let value = plist::decode(data)?;
        Ok(build(value)?)
    }

    /// Archive without a main resource, subresources or subframes
    pub fn empty() -> WebArchive {
        WebArchive {
            archives: vec![Archive::default()],
            resources: vec![],
        }
    }

    pub fn root(&self) -> ArchiveRef<'_> {
        self.archive(ArchiveId::ROOT)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this arena.
    pub fn archive(&self, id: ArchiveId) -> ArchiveRef<'_> {
        assert!(id.0 < self.archives.len(), "archive id out of range");
        ArchiveRef { web: self, id }
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn main_resource(&self) -> Option<&Resource> {
        self.root().main_resource()
    }

    pub fn subresources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.root().subresources()
    }

    pub fn subframe_archives(&self) -> impl Iterator<Item = ArchiveRef<'_>> + '_ {
        self.root().subframe_archives()
    }

    pub fn get_subresource(&self, url: &str) -> Option<&Resource> {
        self.root().get_subresource(url)
    }

    pub fn get_subframe_archive(&self, url: &str) -> Option<ArchiveRef<'_>> {
        self.root().get_subframe_archive(url)
    }

    /// Number of resources in the whole tree, 0 without a main resource
    pub fn resource_count(&self) -> usize {
        self.root().resource_count()
    }

    /// Number of archives, the top-level one included
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// See [`extract::extract`]
    pub fn extract<P: AsRef<Path>>(
        &self,
        output_path: P,
        options: &ExtractOptions,
    ) -> Result<usize> {
        extract::extract(self, output_path, options)
    }

    /// Self-contained HTML document with every resource inlined
    pub fn to_html(&self) -> Result<String> {
        extract::to_single_document(self)
    }

    /// [`WebArchive::to_html`] in the main resource's text encoding
    pub fn to_html_bytes(&self) -> Result<Vec<u8>> {
        extract::to_single_document_bytes(self)
    }
}

/// Read-only view of one archive inside a [`WebArchive`]
#[derive(Clone, Copy)]
pub struct ArchiveRef<'a> {
    web: &'a WebArchive,
    id: ArchiveId,
}

impl<'a> ArchiveRef<'a> {
    pub fn id(&self) -> ArchiveId {
        self.id
    }

    pub fn web_archive(&self) -> &'a WebArchive {
        self.web
    }

    fn node(&self) -> &'a Archive {
        &self.web.archives[self.id.0]
    }

    pub fn main_resource(&self) -> Option<&'a Resource> {
        self.node().main_resource.map(|id| self.web.resource(id))
    }

    pub fn subresources(&self) -> impl Iterator<Item = &'a Resource> + 'a {
        let web = self.web;
        self.node().subresources.iter().map(move |id| web.resource(*id))
    }

    pub fn subframe_archives(&self) -> impl Iterator<Item = ArchiveRef<'a>> + 'a {
        let web = self.web;
        self.node()
            .subframe_archives
            .iter()
            .map(move |id| ArchiveRef { web, id: *id })
    }

    pub fn parent(&self) -> Option<ArchiveRef<'a>> {
        self.node().parent.map(|id| ArchiveRef { web: self.web, id })
    }

    /// Number of ancestors, 0 for the top-level archive
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(archive) = current {
            depth += 1;
            current = archive.parent();
        }
        depth
    }

    /// First subresource whose URL equals `url` exactly
    pub fn get_subresource(&self, url: &str) -> Option<&'a Resource> {
        self.subresources().find(|resource| resource.url == url)
    }

    /// First subframe archive whose main resource URL equals `url` exactly
    pub fn get_subframe_archive(&self, url: &str) -> Option<ArchiveRef<'a>> {
        self.subframe_archives().find(|archive| {
            archive
                .main_resource()
                .map_or(false, |resource| resource.url == url)
        })
    }

    /// Resolves `url` against this archive alone
    pub fn resolve(&self, url: &str) -> Resolution<'a> {
        resolve(*self, url)
    }

    pub fn resource_count(&self) -> usize {
        if self.main_resource().is_none() {
            return 0;
        }

        1 + self.node().subresources.len()
            + self
                .subframe_archives()
                .map(|archive| archive.resource_count())
                .sum::<usize>()
    }
}

impl std::fmt::Debug for ArchiveRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveRef")
            .field("id", &self.id)
            .field("url", &self.main_resource().map(Resource::url))
            .finish()
    }
}
