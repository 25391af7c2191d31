//! HTML解析和处理模块
//!
//! 这个模块被拆分为多个子模块：
//!
//! - `utils`: 基础常量、字符引用解码与属性值转义
//! - `tokenizer`: 标签边界与属性值区间的扫描
//! - `parser`: `srcset` 解析与重写
//! - `rewriter`: 文档级的 URL 重写

pub mod parser;
pub mod rewriter;
pub mod tokenizer;
pub mod utils;

pub use parser::{parse_srcset, rewrite_srcset, SrcSetItem};
pub use rewriter::{is_url_attribute, rewrite_html};
pub use tokenizer::RAW_TEXT_ELEMENTS;
pub use utils::{decode_entities, escape_attribute_value, WHITESPACES};
