//! HTML 重写
//!
//! 从左到右扫描一遍文档，只在以下位置做替换：
//!
//! - 携带 URL 的属性值（按标签名与属性名的组合识别）
//! - `srcset` 中每个候选项的 URL
//! - `style` 属性与 `<style>` 元素的内容（交给 CSS 重写器）
//!
//! 其余内容（文本、注释、`<script>` 内容、引号、大小写、标签内空白）逐字节复制。

use tracing::trace;

use super::parser::rewrite_srcset;
use super::tokenizer::{find_end_tag, next_markup, Attribute, AttributeValue, Markup, StartTag};
use super::utils::{decode_entities, decode_entities_mapped, escape_attribute_value, needs_quotes};
use crate::parsers::css::{css_edits, rewrite_css};
use crate::parsers::{apply_edits, Edit, LinkResolver};

/// 判断属性是否携带 URL
///
/// 标签名与属性名都应为小写。
pub fn is_url_attribute(tag: &str, attribute: &str) -> bool {
    match attribute {
        "src" => matches!(
            tag,
            "img" | "iframe" | "frame" | "script" | "embed" | "audio" | "video" | "source"
                | "track" | "input"
        ),
        "href" => matches!(tag, "a" | "link" | "area"),
        "background" => matches!(tag, "body" | "table" | "td" | "th"),
        "poster" => tag == "video",
        "action" => tag == "form",
        "formaction" => matches!(tag, "button" | "input"),
        "cite" => matches!(tag, "blockquote" | "q" | "del" | "ins"),
        "data" => tag == "object",
        _ => false,
    }
}

/// 重写 HTML 文档中的 URL 引用
///
/// `resolver` 对每个引用返回替换值；返回 `None` 的引用保持原样。
/// 没有任何引用被替换时，返回值与输入逐字节相同。
pub fn rewrite_html<R: LinkResolver + ?Sized>(html: &str, resolver: &mut R) -> String {
    let mut edits: Vec<Edit> = vec![];
    let mut pos = 0;

    while let Some((_, markup)) = next_markup(html, pos) {
        match markup {
            Markup::Other { end } => pos = end,
            Markup::StartTag(tag) if tag.unterminated => pos = tag.end,
            Markup::StartTag(tag) => {
                pos = tag.end;
                rewrite_attributes(&tag, resolver, &mut edits);

                if tag.is_raw_text() && !tag.self_closing {
                    let content_end = find_end_tag(html, pos, tag.name);
                    if tag.name.eq_ignore_ascii_case("style") {
                        rewrite_style_element(html, pos..content_end, resolver, &mut edits);
                    }
                    pos = content_end;
                }
            }
        }
    }

    apply_edits(html, edits)
}

fn rewrite_style_element<R: LinkResolver + ?Sized>(
    html: &str,
    content: std::ops::Range<usize>,
    resolver: &mut R,
    edits: &mut Vec<Edit>,
) {
    let css = &html[content.clone()];
    let rewritten = rewrite_css(css, resolver);
    if rewritten != css {
        edits.push(Edit {
            start: content.start,
            end: content.end,
            replacement: rewritten,
        });
    }
}

fn rewrite_attributes<R: LinkResolver + ?Sized>(
    tag: &StartTag<'_>,
    resolver: &mut R,
    edits: &mut Vec<Edit>,
) {
    let tag_name = tag.name.to_ascii_lowercase();

    for attribute in &tag.attributes {
        let Attribute {
            name,
            value: Some(value),
        } = attribute
        else {
            continue;
        };
        let attribute_name = name.to_ascii_lowercase();
        if attribute_name == "style" {
            rewrite_style_attribute(value, resolver, edits);
            continue;
        }
        let decoded = decode_entities(value.raw);

        let replacement = if tag_name == "base" && attribute_name == "href" {
            resolver.set_base(decoded.trim());
            None
        } else if attribute_name == "srcset" && matches!(tag_name.as_str(), "img" | "source") {
            rewrite_srcset(&decoded, resolver)
        } else if is_url_attribute(&tag_name, &attribute_name) {
            resolver.substitute(decoded.trim())
        } else {
            None
        };

        if let Some(replacement) = replacement {
            trace!(tag = %tag_name, attribute = %attribute_name, "rewrote attribute");
            edits.push(Edit {
                start: value.range.start,
                end: value.range.end,
                replacement: escape_attribute_value(&replacement, value.quote),
            });
        }
    }
}

/// Rewrites only the URLs inside a `style` attribute; character references elsewhere stay
fn rewrite_style_attribute<R: LinkResolver + ?Sized>(
    value: &AttributeValue<'_>,
    resolver: &mut R,
    edits: &mut Vec<Edit>,
) {
    let (decoded, raw_offsets) = decode_entities_mapped(value.raw);
    let replaced = css_edits(&decoded, resolver);
    if replaced.is_empty() {
        return;
    }

    let raw_edits = replaced
        .iter()
        .map(|edit| Edit {
            start: raw_offsets[edit.start],
            end: raw_offsets[edit.end],
            replacement: escape_attribute_value(&edit.replacement, value.quote.or(Some('"'))),
        })
        .collect();
    let rewritten = apply_edits(value.raw, raw_edits);

    // An unquoted value that now needs quotes is re-escaped as a whole
    let replacement = match value.quote {
        None if needs_quotes(&rewritten) => {
            escape_attribute_value(&apply_edits(&decoded, replaced), None)
        }
        _ => rewritten,
    };

    trace!(attribute = "style", "rewrote attribute");
    edits.push(Edit {
        start: value.range.start,
        end: value.range.end,
        replacement,
    });
}
