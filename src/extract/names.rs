use std::collections::{HashMap, HashSet};

use crate::archive::{ArchiveRef, Resource};
use crate::core::extension_for_media_type;
use crate::utils::url::{is_data_url, url_file_name};

/// Characters replaced in local file names
const UNSAFE_CHARACTERS: &[char] = &['%', '<', '>', ':', '"', '/', '\\', '|', '?', '*'];
/// Reserved DOS device names
const DEVICE_NAMES: &[&str] = &["con", "prn", "aux", "nul"];

/// File names chosen for the resources of one archive
///
/// Each URL receives a single name; later resources with the same URL share it.
#[derive(Debug, Default)]
pub struct LocalNames {
    by_url: HashMap<String, String>,
    // Lower-cased, so names stay distinct on case-insensitive file systems
    taken: HashSet<String>,
}

impl LocalNames {
    /// Names the main resource, subresources and subframe main resources, in that order
    pub fn for_archive(archive: ArchiveRef<'_>) -> LocalNames {
        let mut names = LocalNames::default();

        if let Some(main) = archive.main_resource() {
            names.allocate(main);
        }
        for resource in archive.subresources() {
            names.allocate(resource);
        }
        for subframe in archive.subframe_archives() {
            if let Some(main) = subframe.main_resource() {
                names.allocate(main);
            }
        }

        names
    }

    pub fn allocate(&mut self, resource: &Resource) -> &str {
        let url = resource.url();
        if !self.by_url.contains_key(url) {
            let name = self.unique_name(resource);
            self.taken.insert(name.to_lowercase());
            self.by_url.insert(url.to_string(), name);
        }

        &self.by_url[url]
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    fn unique_name(&self, resource: &Resource) -> String {
        let stem = file_stem(resource.url());
        let extension = extension_for_media_type(resource.mime_type()).unwrap_or_default();

        let mut name = format!("{}{}", stem, extension);
        let mut copy = 1;
        while self.taken.contains(&name.to_lowercase()) {
            copy += 1;
            name = format!("{}.{}{}", stem, copy, extension);
        }

        name
    }
}

/// Sanitized base name for a resource URL, extension removed
pub fn file_stem(url: &str) -> String {
    let stem = if is_data_url(url) {
        "data_url".to_string()
    } else {
        strip_extension(&url_file_name(url)).to_string()
    };

    let mut stem: String = stem
        .chars()
        .map(|c| if UNSAFE_CHARACTERS.contains(&c) { '_' } else { c })
        .collect();

    if stem.is_empty() {
        stem = "blank_url".to_string();
    }
    if is_device_name(&stem) {
        stem.push('_');
    }

    stem
}

/// `name` without its last extension; leading dots do not start one
fn strip_extension(name: &str) -> &str {
    let trimmed = name.trim_start_matches('.');
    let leading = name.len() - trimmed.len();

    match trimmed.rfind('.') {
        Some(index) => &name[..leading + index],
        None => name,
    }
}

fn is_device_name(stem: &str) -> bool {
    let lowercased = stem.to_ascii_lowercase();
    if DEVICE_NAMES.contains(&lowercased.as_str()) {
        return true;
    }

    let bytes = lowercased.as_bytes();
    bytes.len() == 4
        && (lowercased.starts_with("com") || lowercased.starts_with("lpt"))
        && bytes[3].is_ascii_digit()
}
