// 集成测试公共模块
//
// 提供一个仅用于测试的二进制属性列表编码器，以及构建 webarchive 的辅助函数，
// 使测试可以在内存中生成归档文件。

#![allow(dead_code)]

/// A property list value to encode
#[derive(Clone, Debug)]
pub enum Node {
    Bool(bool),
    Int(i64),
    Text(String),
    Data(Vec<u8>),
    Array(Vec<Node>),
    Dict(Vec<(String, Node)>),
}

/// Serializes `root` as a `bplist00` container
///
/// Objects are written depth-first with 4-byte offsets and 2-byte references.
pub fn encode(root: &Node) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = vec![];
    flatten(root, &mut objects);

    let mut data = b"bplist00".to_vec();
    let mut offsets = vec![];
    for object in &objects {
        offsets.push(data.len() as u32);
        data.extend_from_slice(object);
    }

    let offset_table_start = data.len() as u64;
    for offset in offsets {
        data.extend_from_slice(&offset.to_be_bytes());
    }

    data.extend_from_slice(&[0; 6]);
    data.push(4);
    data.push(2);
    data.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    data.extend_from_slice(&0u64.to_be_bytes());
    data.extend_from_slice(&offset_table_start.to_be_bytes());
    data
}

fn flatten(node: &Node, objects: &mut Vec<Vec<u8>>) -> u16 {
    let index = objects.len();
    objects.push(vec![]);

    let bytes = match node {
        Node::Bool(value) => vec![if *value { 0x09 } else { 0x08 }],
        Node::Int(value) => {
            let mut bytes = vec![0x13];
            bytes.extend_from_slice(&value.to_be_bytes());
            bytes
        }
        Node::Text(text) if text.is_ascii() => {
            let mut bytes = sized_marker(0x5, text.len());
            bytes.extend_from_slice(text.as_bytes());
            bytes
        }
        Node::Text(text) => {
            let units: Vec<u16> = text.encode_utf16().collect();
            let mut bytes = sized_marker(0x6, units.len());
            for unit in units {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            bytes
        }
        Node::Data(data) => {
            let mut bytes = sized_marker(0x4, data.len());
            bytes.extend_from_slice(data);
            bytes
        }
        Node::Array(items) => {
            let refs: Vec<u16> = items.iter().map(|item| flatten(item, objects)).collect();
            let mut bytes = sized_marker(0xA, refs.len());
            for reference in refs {
                bytes.extend_from_slice(&reference.to_be_bytes());
            }
            bytes
        }
        Node::Dict(entries) => {
            let key_refs: Vec<u16> = entries
                .iter()
                .map(|(key, _)| flatten(&Node::Text(key.clone()), objects))
                .collect();
            let value_refs: Vec<u16> = entries
                .iter()
                .map(|(_, value)| flatten(value, objects))
                .collect();
            let mut bytes = sized_marker(0xD, entries.len());
            for reference in key_refs.into_iter().chain(value_refs) {
                bytes.extend_from_slice(&reference.to_be_bytes());
            }
            bytes
        }
    };

    objects[index] = bytes;
    index as u16
}

fn sized_marker(kind: u8, len: usize) -> Vec<u8> {
    if len < 15 {
        vec![(kind << 4) | len as u8]
    } else {
        let mut bytes = vec![(kind << 4) | 0x0F, 0x12];
        bytes.extend_from_slice(&(len as u32).to_be_bytes());
        bytes
    }
}

pub fn text(value: &str) -> Node {
    Node::Text(value.to_string())
}

/// A `WebResource` dictionary
pub fn resource(url: &str, mime_type: &str, encoding: Option<&str>, data: &[u8]) -> Node {
    let mut entries = vec![
        ("WebResourceURL".to_string(), text(url)),
        ("WebResourceMIMEType".to_string(), text(mime_type)),
        ("WebResourceData".to_string(), Node::Data(data.to_vec())),
    ];
    if let Some(encoding) = encoding {
        entries.push(("WebResourceTextEncodingName".to_string(), text(encoding)));
    }
    Node::Dict(entries)
}

pub fn html_resource(url: &str, html: &str) -> Node {
    resource(url, "text/html", Some("UTF-8"), html.as_bytes())
}

pub fn css_resource(url: &str, css: &str) -> Node {
    resource(url, "text/css", Some("utf-8"), css.as_bytes())
}

pub fn image_resource(url: &str, data: &[u8]) -> Node {
    resource(url, "image/png", None, data)
}

/// A `WebArchive` dictionary
pub fn archive(main: Node, subresources: Vec<Node>, subframes: Vec<Node>) -> Node {
    let mut entries = vec![("WebMainResource".to_string(), main)];
    if !subresources.is_empty() {
        entries.push(("WebSubresources".to_string(), Node::Array(subresources)));
    }
    if !subframes.is_empty() {
        entries.push(("WebSubframeArchives".to_string(), Node::Array(subframes)));
    }
    Node::Dict(entries)
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR";

/// Page with a stylesheet, an image and one subframe
pub fn sample_archive() -> Node {
    let frame = archive(
        html_resource(
            "https://example.com/frame.html",
            "<html><body><img src=\"logo.png\"><img src=\"frame-only.png\"></body></html>",
        ),
        vec![image_resource("https://example.com/frame-only.png", b"frame image")],
        vec![],
    );

    archive(
        html_resource(
            "https://example.com/index.html",
            "<!DOCTYPE html>\n<html><head><link rel=stylesheet href=\"style.css\"></head>\n<body>\n<img src='logo.png' alt=\"\">\n<iframe seamless src=\"https://example.com/frame.html\"></iframe>\n<a href=\"https://other.example.org/\">out</a>\n</body></html>\n",
        ),
        vec![
            css_resource(
                "https://example.com/style.css",
                "body { background: url(logo.png) }",
            ),
            image_resource("https://example.com/logo.png", PNG_BYTES),
        ],
        vec![frame],
    )
}

pub fn sample_archive_bytes() -> Vec<u8> {
    encode(&sample_archive())
}
