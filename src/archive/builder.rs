use thiserror::Error;
use tracing::debug;

use crate::plist::{Dictionary, Value};

use super::{Archive, ArchiveId, Resource, ResourceId, WebArchive};

pub const MAIN_RESOURCE_KEY: &str = "WebMainResource";
pub const SUBRESOURCES_KEY: &str = "WebSubresources";
pub const SUBFRAME_ARCHIVES_KEY: &str = "WebSubframeArchives";

pub const RESOURCE_URL_KEY: &str = "WebResourceURL";
pub const RESOURCE_DATA_KEY: &str = "WebResourceData";
pub const RESOURCE_MIME_TYPE_KEY: &str = "WebResourceMIMEType";
pub const RESOURCE_TEXT_ENCODING_KEY: &str = "WebResourceTextEncodingName";
pub const RESOURCE_FRAME_NAME_KEY: &str = "WebResourceFrameName";

/// The decoded value tree does not follow the webarchive schema
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("root object is a {0}, expected a dictionary")]
    RootNotDictionary(&'static str),
    #[error("missing required key \"{0}\"")]
    MissingKey(&'static str),
    #[error("\"{key}\" is a {found}, expected {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("subresource {index}: {source}")]
    Subresource {
        index: usize,
        #[source]
        source: Box<SchemaError>,
    },
    #[error("subframe archive {index}: {source}")]
    SubframeArchive {
        index: usize,
        #[source]
        source: Box<SchemaError>,
    },
}

/// Builds the resource graph from a decoded property list
///
/// Subframe archives are built depth-first and receive their parent's id as
/// they are created. URLs are neither deduplicated nor validated here.
pub fn build(root: Value) -> Result<WebArchive, SchemaError> {
    let dict = match root {
        Value::Dictionary(dict) => dict,
        other => return Err(SchemaError::RootNotDictionary(other.kind_name())),
    };

    let mut builder = GraphBuilder::default();
    builder.archive(dict, None)?;

    debug!(
        archives = builder.archives.len(),
        resources = builder.resources.len(),
        "built webarchive resource graph"
    );

    Ok(WebArchive {
        archives: builder.archives,
        resources: builder.resources,
    })
}

#[derive(Default)]
struct GraphBuilder {
    archives: Vec<Archive>,
    resources: Vec<Resource>,
}

impl GraphBuilder {
    fn archive(
        &mut self,
        mut dict: Dictionary,
        parent: Option<ArchiveId>,
    ) -> Result<ArchiveId, SchemaError> {
        let id = ArchiveId(self.archives.len());
        self.archives.push(Archive {
            parent,
            ..Archive::default()
        });

        let main = take_dictionary(&mut dict, MAIN_RESOURCE_KEY)?
            .ok_or(SchemaError::MissingKey(MAIN_RESOURCE_KEY))?;
        let main_id = self.resource(main, id)?;
        self.archives[id.0].main_resource = Some(main_id);

        if let Some(items) = take_array(&mut dict, SUBRESOURCES_KEY)? {
            for (index, item) in items.into_iter().enumerate() {
                let resource_id = expect_dictionary(item, SUBRESOURCES_KEY)
                    .and_then(|resource| self.resource(resource, id))
                    .map_err(|source| SchemaError::Subresource {
                        index,
                        source: Box::new(source),
                    })?;
                self.archives[id.0].subresources.push(resource_id);
            }
        }

        if let Some(items) = take_array(&mut dict, SUBFRAME_ARCHIVES_KEY)? {
            for (index, item) in items.into_iter().enumerate() {
                let child_id = expect_dictionary(item, SUBFRAME_ARCHIVES_KEY)
                    .and_then(|child| self.archive(child, Some(id)))
                    .map_err(|source| SchemaError::SubframeArchive {
                        index,
                        source: Box::new(source),
                    })?;
                self.archives[id.0].subframe_archives.push(child_id);
            }
        }

        Ok(id)
    }

    fn resource(
        &mut self,
        mut dict: Dictionary,
        owner: ArchiveId,
    ) -> Result<ResourceId, SchemaError> {
        let url = take_text(&mut dict, RESOURCE_URL_KEY)?
            .ok_or(SchemaError::MissingKey(RESOURCE_URL_KEY))?;
        let data = take_bytes(&mut dict, RESOURCE_DATA_KEY)?
            .ok_or(SchemaError::MissingKey(RESOURCE_DATA_KEY))?;
        let mime_type = take_text(&mut dict, RESOURCE_MIME_TYPE_KEY)?
            .ok_or(SchemaError::MissingKey(RESOURCE_MIME_TYPE_KEY))?;
        let text_encoding =
            take_text(&mut dict, RESOURCE_TEXT_ENCODING_KEY)?.map(|label| label.to_lowercase());
        let frame_name = take_text(&mut dict, RESOURCE_FRAME_NAME_KEY)?;

        let id = ResourceId(self.resources.len());
        self.resources.push(Resource {
            url,
            data,
            mime_type,
            text_encoding,
            frame_name,
            owner,
        });

        Ok(id)
    }
}

fn expect_dictionary(value: Value, key: &'static str) -> Result<Dictionary, SchemaError> {
    let found = value.kind_name();
    value.into_dictionary().ok_or(SchemaError::WrongType {
        key,
        expected: "dictionary",
        found,
    })
}

fn take_dictionary(
    dict: &mut Dictionary,
    key: &'static str,
) -> Result<Option<Dictionary>, SchemaError> {
    dict.remove(key)
        .map(|value| expect_dictionary(value, key))
        .transpose()
}

fn take_array(
    dict: &mut Dictionary,
    key: &'static str,
) -> Result<Option<Vec<Value>>, SchemaError> {
    dict.remove(key)
        .map(|value| {
            let found = value.kind_name();
            value.into_array().ok_or(SchemaError::WrongType {
                key,
                expected: "array",
                found,
            })
        })
        .transpose()
}

fn take_text(dict: &mut Dictionary, key: &'static str) -> Result<Option<String>, SchemaError> {
    dict.remove(key)
        .map(|value| {
            let found = value.kind_name();
            value.into_text().ok_or(SchemaError::WrongType {
                key,
                expected: "string",
                found,
            })
        })
        .transpose()
}

fn take_bytes(dict: &mut Dictionary, key: &'static str) -> Result<Option<Vec<u8>>, SchemaError> {
    dict.remove(key)
        .map(|value| {
            let found = value.kind_name();
            value.into_bytes().ok_or(SchemaError::WrongType {
                key,
                expected: "data",
                found,
            })
        })
        .transpose()
}
