//! HTML 扫描
//!
//! 只识别重写所需的结构：注释、声明、结束标签和开始标签。
//! 开始标签被拆成标签名与属性，每个属性值都记录它在原文中的字节区间和引号，
//! 因此重写时只需替换这一段。

use std::ops::Range;

use super::utils::is_whitespace_byte;

/// 内容按原样处理、不再扫描标签的元素
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp"];

/// One piece of markup found by [`next_markup`]
#[derive(Debug, PartialEq, Eq)]
pub enum Markup<'a> {
    StartTag(StartTag<'a>),
    /// Comments, declarations, processing instructions and end tags
    Other { end: usize },
}

#[derive(Debug, PartialEq, Eq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
    /// Byte offset just past the closing `>`
    pub end: usize,
    /// Written as `<name ... />`
    pub self_closing: bool,
    /// The input ended before the closing `>`
    pub unterminated: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: Option<AttributeValue<'a>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AttributeValue<'a> {
    /// Value as written, quotes excluded
    pub raw: &'a str,
    pub range: Range<usize>,
    pub quote: Option<char>,
}

impl StartTag<'_> {
    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS
            .iter()
            .any(|name| self.name.eq_ignore_ascii_case(name))
    }
}

/// Finds the next markup construct at or after `from`
///
/// Returns its start offset and the construct; `None` once only text remains.
pub fn next_markup(html: &str, from: usize) -> Option<(usize, Markup<'_>)> {
    let bytes = html.as_bytes();
    let mut pos = from;

    while let Some(offset) = html.get(pos..).and_then(|rest| rest.find('<')) {
        let start = pos + offset;
        let rest = &html[start..];
        let next = bytes.get(start + 1).copied();

        if rest.starts_with("<!--") {
            let end = find_from(html, start + 4, "-->").map_or(html.len(), |index| index + 3);
            return Some((start, Markup::Other { end }));
        }
        if matches!(next, Some(b'!') | Some(b'?')) {
            return Some((start, Markup::Other { end: tag_end(html, start) }));
        }
        if next == Some(b'/') && bytes.get(start + 2).map_or(false, u8::is_ascii_alphabetic) {
            return Some((start, Markup::Other { end: tag_end(html, start) }));
        }
        if next.map_or(false, |byte| byte.is_ascii_alphabetic()) {
            return Some((start, Markup::StartTag(parse_start_tag(html, start))));
        }

        // A stray `<` is text
        pos = start + 1;
    }

    None
}

/// Parses the start tag whose `<` is at `start`
pub fn parse_start_tag(html: &str, start: usize) -> StartTag<'_> {
    let bytes = html.as_bytes();
    let len = bytes.len();

    let mut i = start + 1;
    while i < len && !is_whitespace_byte(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
        i += 1;
    }
    let name = &html[start + 1..i];

    let mut attributes = vec![];
    let mut self_closing = false;
    let mut unterminated = false;

    let end = loop {
        while i < len && is_whitespace_byte(bytes[i]) {
            i += 1;
        }
        if i >= len {
            unterminated = true;
            break len;
        }
        match bytes[i] {
            b'>' => break i + 1,
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                self_closing = true;
                break i + 2;
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        // Attribute name; a leading `=` belongs to the name
        let name_start = i;
        i += 1;
        while i < len && !is_whitespace_byte(bytes[i]) && !matches!(bytes[i], b'/' | b'>' | b'=') {
            i += 1;
        }
        let attribute_name = &html[name_start..i];

        let mut after_name = i;
        while after_name < len && is_whitespace_byte(bytes[after_name]) {
            after_name += 1;
        }

        if bytes.get(after_name) != Some(&b'=') {
            attributes.push(Attribute {
                name: attribute_name,
                value: None,
            });
            continue;
        }

        i = after_name + 1;
        while i < len && is_whitespace_byte(bytes[i]) {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = i + 1;
                let value_end = html[value_start..]
                    .find(quote as char)
                    .map_or(len, |index| value_start + index);
                i = (value_end + 1).min(len);
                AttributeValue {
                    raw: &html[value_start..value_end],
                    range: value_start..value_end,
                    quote: Some(quote as char),
                }
            }
            _ => {
                let value_start = i;
                while i < len && !is_whitespace_byte(bytes[i]) && bytes[i] != b'>' {
                    i += 1;
                }
                AttributeValue {
                    raw: &html[value_start..i],
                    range: value_start..i,
                    quote: None,
                }
            }
        };

        attributes.push(Attribute {
            name: attribute_name,
            value: Some(value),
        });
    };

    StartTag {
        name,
        attributes,
        end,
        self_closing,
        unterminated,
    }
}

/// Offset of the `</name` that closes a raw text element, or the end of input
pub fn find_end_tag(html: &str, from: usize, name: &str) -> usize {
    let bytes = html.as_bytes();
    let mut pos = from;

    while let Some(index) = find_from(html, pos, "</") {
        let name_start = index + 2;
        let name_end = name_start + name.len();
        let matches_name = bytes
            .get(name_start..name_end)
            .map_or(false, |candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let delimited = bytes
            .get(name_end)
            .map_or(true, |byte| is_whitespace_byte(*byte) || matches!(byte, b'/' | b'>'));

        if matches_name && delimited {
            return index;
        }
        pos = name_start;
    }

    html.len()
}

fn tag_end(html: &str, start: usize) -> usize {
    find_from(html, start, ">").map_or(html.len(), |index| index + 1)
}

fn find_from(html: &str, from: usize, needle: &str) -> Option<usize> {
    html.get(from..)?.find(needle).map(|index| from + index)
}
