use base64::{prelude::BASE64_STANDARD, Engine};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::core::{detect_media_type, is_plaintext_media_type};

/// Characters that cannot appear literally in a relative reference to an extracted file
const LOCAL_REFERENCE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Decoded contents of a `data:` URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub charset: String,
    pub data: Vec<u8>,
}

/// Builds a base64 `data:` URL
///
/// An empty `media_type` is sniffed from `data`, then from the file name in `url`.
/// `charset` is only kept for plaintext media types.
pub fn create_data_url(media_type: &str, charset: &str, data: &[u8], url: &str) -> String {
    let media_type: String = if media_type.is_empty() {
        detect_media_type(data, url)
    } else {
        media_type.to_string()
    };

    let charset: String = if !charset.is_empty() && is_plaintext_media_type(&media_type) {
        format!(";charset={}", charset)
    } else {
        String::new()
    };

    format!(
        "data:{}{};base64,{}",
        media_type,
        charset,
        BASE64_STANDARD.encode(data)
    )
}

pub fn is_data_url(url: &str) -> bool {
    url.get(..5)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Parses a `data:` URL, base64 or percent-encoded
pub fn parse_data_url(url: &str) -> Option<DataUrl> {
    if !is_data_url(url) {
        return None;
    }

    let (header, payload) = url[5..].split_once(',')?;
    let mut params = header.split(';');
    let mut media_type = params.next().unwrap_or_default().trim().to_lowercase();
    let mut charset = String::new();
    let mut is_base64 = false;

    for param in params {
        let param = param.trim();
        if param.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if let Some(value) = param.strip_prefix("charset=") {
            charset = value.to_string();
        }
    }

    if media_type.is_empty() {
        media_type = "text/plain".to_string();
    }

    let payload: Vec<u8> = percent_decode_str(payload).collect();
    let data = if is_base64 {
        BASE64_STANDARD.decode(&payload).ok()?
    } else {
        payload
    };

    Some(DataUrl {
        media_type,
        charset,
        data,
    })
}

/// Last path segment of `url`, still percent-encoded, without query or fragment
pub fn url_file_name(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Makes a relative file path safe to use as a URL reference
pub fn encode_local_reference(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, LOCAL_REFERENCE).to_string())
        .collect::<Vec<String>>()
        .join("/")
}
