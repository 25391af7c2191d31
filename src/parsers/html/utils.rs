use std::borrow::Cow;

/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 检查是否为 HTML 空白字节
pub fn is_whitespace_byte(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0c' | b'\r')
}

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// 解码属性值中的字符引用
///
/// 只处理常见的命名引用和数字引用，其余 `&` 原样保留。
pub fn decode_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(index) = rest.find('&') {
        result.push_str(&rest[..index]);
        rest = &rest[index..];

        match decode_reference(rest) {
            Some((decoded, consumed)) => {
                result.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// 解码字符引用，同时记录解码结果中每个字节在原文中的位置
///
/// 位置表比解码结果多一项，对应结尾。
pub fn decode_entities_mapped(value: &str) -> (String, Vec<usize>) {
    let mut decoded = String::with_capacity(value.len());
    let mut raw_offsets = Vec::with_capacity(value.len() + 1);
    let mut position = 0;

    while let Some(next) = value[position..].chars().next() {
        let rest = &value[position..];
        let (c, consumed) = match next {
            '&' => decode_reference(rest).unwrap_or(('&', 1)),
            _ => (next, next.len_utf8()),
        };

        raw_offsets.extend(std::iter::repeat(position).take(c.len_utf8()));
        decoded.push(c);
        position += consumed;
    }
    raw_offsets.push(value.len());

    (decoded, raw_offsets)
}

/// `text` 以 `&` 开头；返回解码出的字符和消耗的字节数
fn decode_reference(text: &str) -> Option<(char, usize)> {
    let end = text.find(';')?;
    let body = &text[1..end];

    let decoded = if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        NAMED_ENTITIES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, decoded)| *decoded)?
    };

    Some((decoded, end + 1))
}

/// 按属性的引号风格转义新值
///
/// 未加引号的值若会产生歧义，则改用双引号包裹。
pub fn escape_attribute_value(value: &str, quote: Option<char>) -> String {
    match quote {
        Some('\'') => value.replace('&', "&amp;").replace('\'', "&#39;"),
        Some(_) => value.replace('&', "&amp;").replace('"', "&quot;"),
        None if needs_quotes(value) => {
            format!("\"{}\"", value.replace('&', "&amp;").replace('"', "&quot;"))
        }
        None => value.replace('&', "&amp;"),
    }
}

pub(crate) fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| WHITESPACES.contains(&c) || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`'))
}
