use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::SchemaError;
use crate::plist::FormatError;

/// A required element is missing at the archive level
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("archive does not have a main resource")]
    MissingMainResource,
}

/// Represents errors that can occur while reading or extracting a webarchive
///
/// Unresolved URL references and malformed `srcset` entries are not errors;
/// they are passed through unchanged.
#[derive(Debug, Error)]
pub enum WebArchiveError {
    /// The binary container is structurally invalid
    #[error("invalid property list: {0}")]
    Format(#[from] FormatError),
    /// The decoded value tree does not follow the webarchive schema
    #[error("malformed webarchive: {0}")]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebArchiveError {
    pub fn is_format_error(&self) -> bool {
        matches!(self, WebArchiveError::Format(_))
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, WebArchiveError::Schema(_))
    }

    pub fn is_archive_error(&self) -> bool {
        matches!(self, WebArchiveError::Archive(_))
    }
}

pub type Result<T> = std::result::Result<T, WebArchiveError>;

/// What resolved references are substituted with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// One self-contained document, resources inlined as `data:` URLs (default)
    #[default]
    DataUri,
    /// The document plus one file per resource, referenced by relative paths
    LocalPaths,
}

/// Configuration options for extraction
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub mode: ExtractMode,
    /// Appended to the output file stem to name the resource directory
    pub subresource_dir_suffix: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            mode: ExtractMode::default(),
            subresource_dir_suffix: "_files".to_string(),
        }
    }
}

impl ExtractOptions {
    pub fn single_file() -> Self {
        ExtractOptions::default()
    }

    pub fn local_paths() -> Self {
        ExtractOptions {
            mode: ExtractMode::LocalPaths,
            ..ExtractOptions::default()
        }
    }
}

const FILE_SIGNATURES: [[&[u8]; 2]; 18] = [
    // Image
    [b"GIF87a", b"image/gif"],
    [b"GIF89a", b"image/gif"],
    [b"\xFF\xD8\xFF", b"image/jpeg"],
    [b"\x89PNG\x0D\x0A\x1A\x0A", b"image/png"],
    [b"<svg ", b"image/svg+xml"],
    [b"RIFF....WEBPVP8 ", b"image/webp"],
    [b"\x00\x00\x01\x00", b"image/x-icon"],
    // Audio
    [b"ID3", b"audio/mpeg"],
    [b"\xFF\x0E", b"audio/mpeg"],
    [b"\xFF\x0F", b"audio/mpeg"],
    [b"OggS", b"audio/ogg"],
    [b"RIFF....WAVEfmt ", b"audio/wav"],
    [b"fLaC", b"audio/x-flac"],
    // Video
    [b"RIFF....AVI LIST", b"video/avi"],
    [b"....ftyp", b"video/mp4"],
    [b"\x00\x00\x01\x0B", b"video/mpeg"],
    [b"....moov", b"video/quicktime"],
    [b"\x1A\x45\xDF\xA3", b"video/webm"],
];
// All known non-"text/..." plaintext media types
const PLAINTEXT_MEDIA_TYPES: &[&str] = &[
    "application/javascript",          // .js
    "application/json",                // .json
    "application/ld+json",             // .jsonld
    "application/x-javascript",        // .js
    "application/x-sh",                // .sh
    "application/xhtml+xml",           // .xhtml
    "application/xml",                 // .xml
    "application/vnd.mozilla.xul+xml", // .xul
    "image/svg+xml",                   // .svg
];
const HTML_MEDIA_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];
// Extensions browsers recognise for local files, which come without a Content-Type
const MEDIA_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("application/xhtml+xml", ".xhtml"),
    ("text/css", ".css"),
    ("text/javascript", ".js"),
    ("application/javascript", ".js"),
    ("application/x-javascript", ".js"),
    ("application/json", ".json"),
    ("text/plain", ".txt"),
    ("text/xml", ".xml"),
    ("application/xml", ".xml"),
    ("image/gif", ".gif"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/svg+xml", ".svg"),
    ("image/webp", ".webp"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/avif", ".avif"),
    ("image/bmp", ".bmp"),
    ("font/woff", ".woff"),
    ("font/woff2", ".woff2"),
    ("application/font-woff", ".woff"),
    ("application/x-font-woff", ".woff"),
    ("font/ttf", ".ttf"),
    ("font/otf", ".otf"),
    ("audio/mpeg", ".mp3"),
    ("audio/ogg", ".ogg"),
    ("audio/wav", ".wav"),
    ("audio/x-flac", ".flac"),
    ("video/mp4", ".mp4"),
    ("video/avi", ".avi"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
    ("video/mpeg", ".mpeg"),
    ("application/pdf", ".pdf"),
];

/// Determines the media type of data based on its content signature
pub fn detect_media_type(data: &[u8], url: &str) -> String {
    for signature in &FILE_SIGNATURES {
        if signature_matches(data, signature[0]) {
            return String::from_utf8_lossy(signature[1]).to_string();
        }
    }

    // Fall back to detecting by file extension
    let path = url.split(['?', '#']).next().unwrap_or_default();
    detect_media_type_by_file_name(path)
}

/// `.` in a signature matches any byte
fn signature_matches(data: &[u8], signature: &[u8]) -> bool {
    data.len() >= signature.len()
        && signature
            .iter()
            .zip(data)
            .all(|(expected, actual)| *expected == b'.' || expected == actual)
}

/// Determines the media type based on file extension
pub fn detect_media_type_by_file_name(filename: &str) -> String {
    let filename_lowercased = filename.to_lowercase();

    if filename_lowercased.ends_with(".css") {
        "text/css".to_string()
    } else if filename_lowercased.ends_with(".js") {
        "application/javascript".to_string()
    } else if filename_lowercased.ends_with(".html") || filename_lowercased.ends_with(".htm") {
        "text/html".to_string()
    } else if filename_lowercased.ends_with(".json") {
        "application/json".to_string()
    } else if filename_lowercased.ends_with(".svg") {
        "image/svg+xml".to_string()
    } else if filename_lowercased.ends_with(".png") {
        "image/png".to_string()
    } else if filename_lowercased.ends_with(".jpg") || filename_lowercased.ends_with(".jpeg") {
        "image/jpeg".to_string()
    } else if filename_lowercased.ends_with(".gif") {
        "image/gif".to_string()
    } else if filename_lowercased.ends_with(".webp") {
        "image/webp".to_string()
    } else if filename_lowercased.ends_with(".ico") {
        "image/x-icon".to_string()
    } else if filename_lowercased.ends_with(".woff") {
        "font/woff".to_string()
    } else if filename_lowercased.ends_with(".woff2") {
        "font/woff2".to_string()
    } else if filename_lowercased.ends_with(".mp3") {
        "audio/mpeg".to_string()
    } else if filename_lowercased.ends_with(".ogg") {
        "audio/ogg".to_string()
    } else if filename_lowercased.ends_with(".mp4") {
        "video/mp4".to_string()
    } else if filename_lowercased.ends_with(".webm") {
        "video/webm".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

/// File extension (with the leading dot) for a media type, if one is known
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    let (essence, _) = parse_content_type(media_type);
    MEDIA_TYPE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == essence)
        .map(|(_, extension)| *extension)
}

/// Splits a Content-Type value into its lower-cased essence and charset
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts.next().unwrap_or_default().trim().to_lowercase();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("charset=") {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}

/// Checks if the given media type represents plaintext content
pub fn is_plaintext_media_type(media_type: &str) -> bool {
    let (essence, _) = parse_content_type(media_type);
    essence.starts_with("text/") || PLAINTEXT_MEDIA_TYPES.contains(&essence.as_str())
}

/// HTML and XHTML count, plain XML does not
pub fn is_html_media_type(media_type: &str) -> bool {
    let (essence, _) = parse_content_type(media_type);
    HTML_MEDIA_TYPES.contains(&essence.as_str())
}

pub fn is_css_media_type(media_type: &str) -> bool {
    parse_content_type(media_type).0 == "text/css"
}

/// Default output path for an archive: same location, `.html` extension
pub fn default_output_path(archive_path: &Path) -> PathBuf {
    archive_path.with_extension("html")
}
