//! CSS 重写模块
//!
//! 此模块在不改变样式表其余内容的前提下，替换其中的 URL 引用。
//! 使用 cssparser 的分词器定位每个引用在原文中的字节区间，
//! 收集所有替换后一次性拼接回原文，因此注释、空白、大小写和引号风格都保持原样。
//!
//! # 识别的引用形式
//!
//! - `url(foo.png)` - 未加引号的 URL
//! - `url("foo.png")` / `url('foo.png')` - 带引号的 URL
//! - `image-set("a.png" 1x)` 中的字符串
//! - `@import "foo.css"` - 字符串形式的导入
//!
//! # 使用示例
//!
//! ```rust
//! use webarchive::parsers::css::rewrite_css;
//!
//! let mut resolver = |url: &str| (url == "bg.png").then(|| "local/bg.png".to_string());
//! let css = rewrite_css("body { background: URL( bg.png ) }", &mut resolver);
//! assert_eq!(css, "body { background: URL( local/bg.png ) }");
//! ```

use cssparser::{serialize_string, ParseError, Parser, ParserInput, Token};
use tracing::trace;

use super::{apply_edits, Edit, LinkResolver};

/// 参数中的字符串被视为 URL 的 CSS 函数
const URL_FUNCTIONS: &[&str] = &["url", "image-set", "-webkit-image-set"];

/// 超过这个嵌套深度的块不再检查，原样复制
pub const MAX_NESTING_DEPTH: usize = 64;

/// 重写样式表（或 `style` 属性中的声明列表）中的 URL 引用
///
/// `resolver` 对每个引用返回替换值；返回 `None` 的引用保持原样。
/// 没有任何引用被替换时，返回值与输入逐字节相同。
pub fn rewrite_css<R: LinkResolver + ?Sized>(css: &str, resolver: &mut R) -> String {
    let edits = css_edits(css, resolver);
    apply_edits(css, edits)
}

/// 与 [`rewrite_css`] 相同，但只返回替换列表，按位置排序
pub(crate) fn css_edits<R: LinkResolver + ?Sized>(css: &str, resolver: &mut R) -> Vec<Edit> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut edits: Vec<Edit> = vec![];

    let _ = collect_edits(&mut parser, resolver, &mut edits, false, 0);

    edits
}

/// 格式化带引号的CSS字符串
pub fn format_quoted_string(string: &str) -> String {
    let mut res: String = "".to_string();
    let _ = serialize_string(string, &mut res);
    res
}

/// 按原来的引号风格给新值加引号
fn quote_like(original: &str, value: &str) -> String {
    if original.starts_with('\'') && !value.contains(['\'', '\\', '\n', '\r', '\x0c']) {
        format!("'{}'", value)
    } else {
        format_quoted_string(value)
    }
}

/// 判断新值能否直接放进 `url(...)` 而不加引号
fn is_safe_unquoted_url(value: &str) -> bool {
    !value.is_empty()
        && !value.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '"' | '\'' | '(' | ')' | '\\')
        })
}

fn collect_edits<'i, 't, R: LinkResolver + ?Sized>(
    parser: &mut Parser<'i, 't>,
    resolver: &mut R,
    edits: &mut Vec<Edit>,
    in_url_function: bool,
    depth: usize,
) -> Result<(), ParseError<'i, ()>> {
    // 上一个有意义的 token 是 @import
    let mut after_import = false;

    loop {
        let token_start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let start = token_start.byte_index();

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => continue,
            Token::UnquotedUrl(ref value) => {
                if let Some(new_url) = resolver.substitute(value) {
                    let raw = parser.slice_from(token_start);
                    edits.push(unquoted_url_edit(start, raw, &new_url));
                }
            }
            Token::QuotedString(ref value) if in_url_function || after_import => {
                if let Some(new_url) = resolver.substitute(value) {
                    let raw = parser.slice_from(token_start);
                    edits.push(Edit {
                        start,
                        end: start + raw.len(),
                        replacement: quote_like(raw, &new_url),
                    });
                }
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
                if depth >= MAX_NESTING_DEPTH =>
            {
                // The parser skips the unconsumed block without recursing
                trace!(depth, "block nested too deeply, copying it unchanged");
            }
            Token::Function(ref name) => {
                let is_url_function = URL_FUNCTIONS
                    .iter()
                    .any(|function| name.eq_ignore_ascii_case(function));
                let _ = parser.parse_nested_block(|nested| {
                    collect_edits(nested, resolver, edits, is_url_function, depth + 1)
                });
            }
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(|nested| {
                    collect_edits(nested, resolver, edits, false, depth + 1)
                });
            }
            Token::BadUrl(ref value) => {
                trace!(url = %value, "skipping malformed url()");
            }
            _ => {}
        }

        after_import = matches!(
            token,
            Token::AtKeyword(ref name) if name.eq_ignore_ascii_case("import")
        );
    }

    Ok(())
}

/// 只替换 `url(` 与 `)` 之间去掉空白后的部分
fn unquoted_url_edit(start: usize, raw: &str, new_url: &str) -> Edit {
    let open = raw.find('(').map_or(0, |index| index + 1);
    let close = if raw.ends_with(')') {
        raw.len() - 1
    } else {
        raw.len()
    };
    let inner = &raw[open..close.max(open)];
    let leading = inner.len() - inner.trim_start().len();
    let trailing = inner.len() - inner.trim_end().len();
    let value_start = open + leading;
    let value_end = (close - trailing).max(value_start);

    let replacement = if is_safe_unquoted_url(new_url) {
        new_url.to_string()
    } else {
        format_quoted_string(new_url)
    };

    Edit {
        start: start + value_start,
        end: start + value_end,
        replacement,
    }
}
