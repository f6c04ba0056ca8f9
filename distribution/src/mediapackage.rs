use crate::error::{DistributionError, Result};

/// Kinds of assets a mediapackage bundles. Only tracks (audio/video essence)
/// are ever distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Track,
    Catalog,
    Attachment,
}

impl ElementType {
    fn tag(&self) -> &'static str {
        match self {
            ElementType::Track => "track",
            ElementType::Catalog => "catalog",
            ElementType::Attachment => "attachment",
        }
    }
}

/// One asset inside a mediapackage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: Option<String>,
    pub element_type: ElementType,
    pub uri: String,
    pub mime_type: Option<String>,
}

impl Element {
    pub fn is_track(&self) -> bool {
        self.element_type == ElementType::Track
    }

    /// Serializes the element back to its manifest XML form, the shape the
    /// job registry expects job results in.
    pub fn to_xml(&self) -> String {
        let tag = self.element_type.tag();
        let id_attr = match &self.id {
            Some(id) => format!(
                " id=\"{}\"",
                html_escape::encode_double_quoted_attribute(id)
            ),
            None => String::new(),
        };
        let mimetype = match &self.mime_type {
            Some(mime) => format!("<mimetype>{}</mimetype>", html_escape::encode_text(mime)),
            None => String::new(),
        };
        format!(
            "<{tag}{id_attr}>{mimetype}<url>{url}</url></{tag}>",
            tag = tag,
            id_attr = id_attr,
            mimetype = mimetype,
            url = html_escape::encode_text(&self.uri),
        )
    }
}

/// A structured bundle of media assets and metadata. Parsing covers only what
/// the distribution shim needs: the identifier, the title (which doubles as
/// the remote parent identifier) and the asset elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPackage {
    pub id: Option<String>,
    pub title: Option<String>,
    pub elements: Vec<Element>,
}

impl MediaPackage {
    pub fn from_xml(xml: &str) -> Result<MediaPackage> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|err| DistributionError::MediaPackage(err.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "mediapackage" {
            return Err(DistributionError::MediaPackage(format!(
                "root element is <{}>, expected <mediapackage>",
                root.tag_name().name()
            )));
        }
        let id = root.attribute("id").map(str::to_string);
        let title = root
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "title")
            .and_then(|n| n.text())
            .map(str::to_string);
        let mut elements = Vec::new();
        for node in root.descendants().filter(|n| n.is_element()) {
            let element_type = match node.tag_name().name() {
                "track" => ElementType::Track,
                "catalog" => ElementType::Catalog,
                "attachment" => ElementType::Attachment,
                _ => continue,
            };
            let uri = node
                .children()
                .find(|c| c.is_element() && c.tag_name().name() == "url")
                .and_then(|c| c.text())
                .ok_or_else(|| {
                    DistributionError::MediaPackage(format!(
                        "<{}> element without a <url>",
                        node.tag_name().name()
                    ))
                })?;
            let mime_type = node
                .children()
                .find(|c| c.is_element() && c.tag_name().name() == "mimetype")
                .and_then(|c| c.text())
                .map(str::to_string);
            elements.push(Element {
                id: node.attribute("id").map(str::to_string),
                element_type,
                uri: uri.to_string(),
                mime_type,
            });
        }
        Ok(MediaPackage {
            id,
            title,
            elements,
        })
    }

    pub fn element_by_id(&self, element_id: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|element| element.id.as_deref() == Some(element_id))
    }
}
