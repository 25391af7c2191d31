//! 多文件模式：主文档加上一个资源目录
//!
//! 目录布局：
//!
//! ```text
//! page.html
//! page_files/
//!     style.css
//!     logo.png
//!     frame.html          子框架归档的主文档
//!     frame_files/        子框架归档自己的资源
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use url::Url;

use super::names::LocalNames;
use crate::archive::{
    resolve_reference, ArchiveId, ArchiveRef, Resolution, Resource, ResourceKind, WebArchive,
};
use crate::core::{ArchiveError, ExtractOptions, Result};
use crate::parsers::{rewrite_css, rewrite_html, LinkResolver};
use crate::utils::url::encode_local_reference;

/// Local names of every archive in one webarchive
pub struct LocalLayout<'a> {
    web: &'a WebArchive,
    names: HashMap<ArchiveId, LocalNames>,
    suffix: String,
    on_file: Option<Box<dyn Fn(&Path) + 'a>>,
}

impl<'a> LocalLayout<'a> {
    pub fn new(web: &'a WebArchive, options: &ExtractOptions) -> Self {
        let mut names = HashMap::new();
        let mut pending = vec![web.root()];

        while let Some(archive) = pending.pop() {
            names.insert(archive.id(), LocalNames::for_archive(archive));
            pending.extend(archive.subframe_archives());
        }

        LocalLayout {
            web,
            names,
            suffix: options.subresource_dir_suffix.clone(),
            on_file: None,
        }
    }

    /// Calls `on_file` with the path of each file right after it is written
    pub fn on_file(mut self, on_file: impl Fn(&Path) + 'a) -> Self {
        self.on_file = Some(Box::new(on_file));
        self
    }

    /// Local name of `url` among the resources of `archive`
    pub fn name(&self, archive: ArchiveId, url: &str) -> Option<&str> {
        self.names.get(&archive)?.get(url)
    }

    /// Name of the resource directory that sits beside `output_path`
    pub fn resource_dir_name(&self, output_path: &Path) -> String {
        let stem = output_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}", stem, self.suffix)
    }

    /// Writes the top-level archive to `output_path`; returns the number of files written
    pub fn extract(&self, output_path: &Path) -> Result<usize> {
        self.extract_archive(self.web.root(), output_path)
    }

    fn extract_archive(&self, archive: ArchiveRef<'a>, output_path: &Path) -> Result<usize> {
        let main = archive
            .main_resource()
            .ok_or(ArchiveError::MissingMainResource)?;

        let dir_name = self.resource_dir_name(output_path);
        let dir: PathBuf = output_path
            .parent()
            .map_or_else(|| PathBuf::from(&dir_name), |parent| parent.join(&dir_name));

        // The main document sits beside its resource directory; only HTML is rewritten
        let main_data = match main.kind() {
            ResourceKind::Html => self.render(archive, main, Some(&dir_name)),
            _ => main.data().to_vec(),
        };
        self.write(output_path, &main_data)?;
        let mut written = 1;

        let has_children =
            archive.subresources().next().is_some() || archive.subframe_archives().next().is_some();
        if !has_children {
            return Ok(written);
        }
        fs::create_dir_all(&dir)?;

        let mut seen: HashSet<&str> = HashSet::new();
        for resource in archive.subresources() {
            let Some(name) = self.name(archive.id(), resource.url()) else {
                continue;
            };
            // Only the first of several resources sharing a URL is ever referenced
            if !seen.insert(name) {
                trace!(url = resource.url(), "skipping duplicate subresource");
                continue;
            }

            let data = self.render(archive, resource, None);
            self.write(&dir.join(name), &data)?;
            written += 1;
        }

        for subframe in archive.subframe_archives() {
            let Some(name) = subframe
                .main_resource()
                .and_then(|main| self.name(archive.id(), main.url()))
            else {
                continue;
            };
            if !seen.insert(name) {
                continue;
            }

            written += self.extract_archive(subframe, &dir.join(name))?;
        }

        debug!(
            archive = archive.id().index(),
            files = written,
            path = %output_path.display(),
            "extracted archive"
        );

        Ok(written)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)?;
        if let Some(on_file) = &self.on_file {
            on_file(path);
        }
        Ok(())
    }

    /// `prefix` is the resource directory for main documents, `None` for subresources
    fn render(
        &self,
        archive: ArchiveRef<'a>,
        resource: &'a Resource,
        prefix: Option<&str>,
    ) -> Vec<u8> {
        let kind = resource.kind();
        let text = match kind {
            ResourceKind::Opaque => None,
            _ => resource.text(),
        };
        let Some(text) = text else {
            return resource.data().to_vec();
        };

        let mut resolver = LocalResolver {
            layout: self,
            archive,
            base: Url::parse(resource.url()).ok(),
            prefix,
        };
        let rendered = match kind {
            ResourceKind::Html => rewrite_html(&text, &mut resolver),
            _ => rewrite_css(&text, &mut resolver),
        };

        resource.encode_text(&rendered)
    }
}

/// Resolves the references of one extracted file to relative paths
struct LocalResolver<'l, 'a> {
    layout: &'l LocalLayout<'a>,
    archive: ArchiveRef<'a>,
    base: Option<Url>,
    prefix: Option<&'l str>,
}

impl LocalResolver<'_, '_> {
    fn relative_path(&self, name: &str, distance: usize) -> String {
        let path = match (self.prefix, distance) {
            (Some(prefix), 0) => format!("{}/{}", prefix, name),
            (None, 0) => name.to_string(),
            // The main document is one level above its own resource directory
            (Some(_), distance) => format!("{}{}", "../".repeat(distance - 1), name),
            (None, distance) => format!("{}{}", "../".repeat(distance), name),
        };

        encode_local_reference(&path)
    }
}

impl LinkResolver for LocalResolver<'_, '_> {
    fn substitute(&mut self, reference: &str) -> Option<String> {
        let found = resolve_reference(self.archive, self.base.as_ref(), reference)?;
        let url = match found.resolution {
            Resolution::Resource(resource) => resource.url(),
            Resolution::Subframe(subframe) => subframe.main_resource()?.url(),
            Resolution::Unresolved => return None,
        };

        let name = self.layout.name(found.holder.id(), url)?;
        Some(self.relative_path(name, found.distance))
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
