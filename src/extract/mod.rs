//! # 提取引擎
//!
//! 把 webarchive 转换为浏览器可以直接打开的 HTML：
//!
//! - 单文件模式（默认）：所有资源递归内联为 `data:` URL，输出一个自包含文档
//! - 多文件模式：输出主文档和一个资源目录，引用改写为相对路径
//!
//! 两种模式下，无法在归档中找到的引用都原样保留。
//!
//! # 模块组织
//!
//! - `inline` - 单文件模式与循环引用保护
//! - `local` - 多文件模式的目录布局与相对路径
//! - `names` - 本地文件名的分配

pub mod inline;
pub mod local;
pub mod names;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::archive::{ResourceKind, WebArchive};
use crate::core::{ArchiveError, ExtractMode, ExtractOptions, Result};

pub use inline::Inliner;
pub use local::LocalLayout;
pub use names::LocalNames;

/// Extracts `web` to `output_path`, returning the number of files written
///
/// # Errors
///
/// Fails with [`ArchiveError::MissingMainResource`] for an archive without a
/// main resource, and with an I/O error when a file cannot be written.
pub fn extract<P: AsRef<Path>>(
    web: &WebArchive,
    output_path: P,
    options: &ExtractOptions,
) -> Result<usize> {
    let output_path = output_path.as_ref();

    let written = match options.mode {
        ExtractMode::DataUri => {
            let document = to_single_document_bytes(web)?;
            fs::write(output_path, document)?;
            1
        }
        ExtractMode::LocalPaths => LocalLayout::new(web, options).extract(output_path)?,
    };

    debug!(
        mode = ?options.mode,
        files = written,
        path = %output_path.display(),
        "extraction finished"
    );

    Ok(written)
}

/// The archive as one self-contained HTML document
///
/// A main resource that is not HTML is returned as text, unchanged.
pub fn to_single_document(web: &WebArchive) -> Result<String> {
    let root = web.root();
    let main = root
        .main_resource()
        .ok_or(ArchiveError::MissingMainResource)?;

    let rendered = match main.kind() {
        ResourceKind::Html => Inliner::new().render_text(root, main),
        _ => None,
    };
    let document = match rendered {
        Some(text) => text,
        None => match main.text() {
            Some(text) => text.into_owned(),
            None => String::from_utf8_lossy(main.data()).into_owned(),
        },
    };

    Ok(document)
}

/// Like [`to_single_document`], encoded in the main resource's text encoding
pub fn to_single_document_bytes(web: &WebArchive) -> Result<Vec<u8>> {
    let root = web.root();
    let main = root
        .main_resource()
        .ok_or(ArchiveError::MissingMainResource)?;

    if main.kind() != ResourceKind::Html {
        return Ok(main.data().to_vec());
    }
    Ok(Inliner::new().render(root, main).into_owned())
}
