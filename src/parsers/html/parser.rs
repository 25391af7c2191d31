//! `srcset` 属性解析
//!
//! 解析 `<img>` / `<source>` 元素的 `srcset` 属性，记录每个候选项中 URL 的字节区间，
//! 从而在重写时只替换 URL，逗号、空白和描述符都保持原样。
//!
//! ## 使用示例
//!
//! ```rust
//! use webarchive::parsers::html::parse_srcset;
//!
//! let items = parse_srcset("small.jpg 480w, large.jpg");
//! assert_eq!(items.len(), 2);
//! assert_eq!(items[0].path, "small.jpg");
//! assert_eq!(items[0].descriptor, "480w");
//! assert_eq!(items[1].descriptor, "");
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::utils::WHITESPACES;
use crate::parsers::{apply_edits, Edit, LinkResolver};

/// 合法的描述符：宽度（`480w`）或像素密度（`2x`、`1.5x`）
const DESCRIPTOR_PATTERN: &str = r"^(?:[0-9]+w|(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)x)$";

static DESCRIPTOR: OnceLock<Option<Regex>> = OnceLock::new();

/// SrcSet 属性项目结构
#[derive(Debug, PartialEq, Eq)]
pub struct SrcSetItem<'a> {
    /// 图片文件的路径或URL
    pub path: &'a str,
    /// 图片描述符，可能为空
    pub descriptor: &'a str,
    /// `path` 在整个属性值中的字节区间
    pub span: Range<usize>,
}

impl SrcSetItem<'_> {
    /// 描述符为空或可以识别
    pub fn is_valid(&self) -> bool {
        self.descriptor.is_empty() || is_valid_descriptor(self.descriptor)
    }
}

fn is_valid_descriptor(descriptor: &str) -> bool {
    DESCRIPTOR
        .get_or_init(|| Regex::new(DESCRIPTOR_PATTERN).ok())
        .as_ref()
        .map_or(false, |regex| regex.is_match(descriptor))
}

/// 解析HTML图片的srcset属性
///
/// 候选项之间以逗号分隔；URL 本身可以包含逗号（例如 `data:` URL），
/// 只有 URL 末尾的逗号才被视为分隔符。
pub fn parse_srcset(srcset: &str) -> Vec<SrcSetItem<'_>> {
    let mut srcset_items: Vec<SrcSetItem> = vec![];
    let len = srcset.len();
    let mut pos = 0;

    loop {
        // 跳过空白和多余的逗号
        pos += srcset[pos..]
            .find(|c: char| !WHITESPACES.contains(&c) && c != ',')
            .unwrap_or(len - pos);
        if pos >= len {
            break;
        }

        let path_start = pos;
        pos += srcset[pos..]
            .find(WHITESPACES)
            .unwrap_or(len - pos);
        let mut path_end = pos;

        let trailing_commas = srcset[path_start..path_end].len()
            - srcset[path_start..path_end].trim_end_matches(',').len();
        let descriptor = if trailing_commas > 0 {
            path_end -= trailing_commas;
            ""
        } else {
            let descriptor_start = pos;
            pos += srcset[pos..].find(',').unwrap_or(len - pos);
            let descriptor = srcset[descriptor_start..pos].trim_matches(WHITESPACES);
            if pos < len {
                pos += 1;
            }
            descriptor
        };

        if path_end > path_start {
            srcset_items.push(SrcSetItem {
                path: &srcset[path_start..path_end],
                descriptor,
                span: path_start..path_end,
            });
        }
    }

    srcset_items
}

/// 重写 `srcset` 中每个合法候选项的 URL
///
/// 描述符无法识别的候选项原样保留。没有任何替换时返回 `None`。
pub fn rewrite_srcset<R: LinkResolver + ?Sized>(srcset: &str, resolver: &mut R) -> Option<String> {
    let edits: Vec<Edit> = parse_srcset(srcset)
        .into_iter()
        .filter(SrcSetItem::is_valid)
        .filter_map(|item| {
            resolver.substitute(item.path).map(|replacement| Edit {
                start: item.span.start,
                end: item.span.end,
                replacement,
            })
        })
        .collect();

    if edits.is_empty() {
        None
    } else {
        Some(apply_edits(srcset, edits))
    }
}
