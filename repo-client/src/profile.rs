use std::collections::HashMap;

use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;

use crate::client::parse_repository_date;
use crate::error::Result;

/// Default namespace of the access API's profile documents.
const ACCESS_NS: &str = "http://www.fedora.info/definitions/1/0/access/";
/// Default namespace of the management API's datastream documents.
const MANAGEMENT_NS: &str = "http://www.fedora.info/definitions/1/0/management/";

/// Resolves a profile field by name, trying the namespaced child first and
/// falling back to the same name without a namespace. Older servers emit
/// unprefixed documents, newer ones bind a default namespace; field values
/// are identical between the two shapes.
fn resolve_field(root: roxmltree::Node<'_, '_>, ns: &str, name: &str) -> Option<String> {
    let namespaced = root.children().find(|n| {
        n.is_element() && n.tag_name().name() == name && n.tag_name().namespace() == Some(ns)
    });
    let node = namespaced.or_else(|| {
        root.children().find(|n| {
            n.is_element() && n.tag_name().name() == name && n.tag_name().namespace().is_none()
        })
    });
    node.and_then(|n| n.text())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Read-only projection of an object profile document. All fields are
/// extracted once at parse time; a missing or unparsable field is None.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectProfile {
    pub label: Option<String>,
    pub owner_id: Option<String>,
    pub state: Option<String>,
    pub create_date: Option<DateTime<Utc>>,
    pub last_mod_date: Option<DateTime<Utc>>,
}

impl ObjectProfile {
    pub fn from_xml(xml: &str) -> Result<ObjectProfile> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        let field = |name: &str| resolve_field(root, ACCESS_NS, name);
        Ok(ObjectProfile {
            label: field("objLabel"),
            owner_id: field("objOwnerId"),
            state: field("objState"),
            create_date: field("objCreateDate").and_then(|s| parse_repository_date(&s).ok()),
            last_mod_date: field("objLastModDate").and_then(|s| parse_repository_date(&s).ok()),
        })
    }
}

/// Properties a datastream carries in its profile document, with their wire
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum DatastreamField {
    #[strum(serialize = "dsLabel")]
    Label,
    #[strum(serialize = "dsVersionID")]
    VersionId,
    #[strum(serialize = "dsCreateDate")]
    CreateDate,
    #[strum(serialize = "dsState")]
    State,
    #[strum(serialize = "dsMIME")]
    Mime,
    #[strum(serialize = "dsFormatURI")]
    FormatUri,
    #[strum(serialize = "dsControlGroup")]
    ControlGroup,
    #[strum(serialize = "dsSize")]
    Size,
    #[strum(serialize = "dsVersionable")]
    Versionable,
    #[strum(serialize = "dsInfoType")]
    InfoType,
    #[strum(serialize = "dsLocation")]
    Location,
    #[strum(serialize = "dsLocationType")]
    LocationType,
    #[strum(serialize = "dsChecksumType")]
    ChecksumType,
    #[strum(serialize = "dsChecksum")]
    Checksum,
}

/// Read-only projection of a datastream profile document, with the same
/// namespaced-first/bare-second field fallback as [`ObjectProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatastreamProfile {
    values: HashMap<DatastreamField, String>,
}

impl DatastreamProfile {
    pub fn from_xml(xml: &str) -> Result<DatastreamProfile> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        let mut values = HashMap::new();
        for field in DatastreamField::iter() {
            if let Some(value) = resolve_field(root, MANAGEMENT_NS, &field.to_string()) {
                values.insert(field, value);
            }
        }
        Ok(DatastreamProfile { values })
    }

    pub fn field(&self, field: DatastreamField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }
}
