//! # Webarchive Library
//!
//! 读取 Apple 的 webarchive 文件，并把它转换为任何浏览器都能打开的标准 HTML：
//! 既可以输出一个资源全部内联的单文件文档，也可以输出主文档加资源目录。
//!
//! ## 模块组织
//!
//! - `core` - 错误类型、提取选项、媒体类型工具
//! - `plist` - 二进制属性列表解码器
//! - `archive` - 资源图、导航视图与 URL 解析
//! - `parsers` - HTML 与 CSS 中 URL 引用的就地重写
//! - `extract` - 单文件与多文件两种提取方式
//! - `utils` - 数据URL与本地路径工具
//! - `env` - 命令行程序使用的环境变量
//!
//! ## 使用示例
//!
//! ```no_run
//! use webarchive::{ExtractOptions, WebArchive};
//!
//! let archive = WebArchive::open("page.webarchive")?;
//! archive.extract("page.html", &ExtractOptions::local_paths())?;
//! let single_file = archive.to_html()?;
//! # Ok::<(), webarchive::WebArchiveError>(())
//! ```

pub mod archive;
pub mod core;
pub mod env;
pub mod extract;
pub mod parsers;
pub mod plist;
pub mod utils;

// Re-export commonly used items for convenience
pub use archive::{
    ArchiveId, ArchiveRef, Resolution, Resource, ResourceId, ResourceKind, WebArchive,
};
pub use crate::core::*;
pub use parsers::LinkResolver;
