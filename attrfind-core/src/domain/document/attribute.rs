// attrfind-core/src/domain/document/attribute.rs

use crate::domain::document::SpatialString;
use serde::{Deserialize, Serialize};

/// A named extracted value with optional child attributes.
/// Rules emit unnamed attributes; the consuming field assigns the final name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub name: String,
    pub value: SpatialString,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub attribute_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_attributes: Vec<Attribute>,
}

impl Attribute {
    pub fn new(value: SpatialString) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, attribute_type: impl Into<String>) -> Self {
        self.attribute_type = attribute_type.into();
        self
    }

    pub fn push_sub_attribute(&mut self, child: Attribute) {
        self.sub_attributes.push(child);
    }

    pub fn find_sub_attribute(&self, name: &str) -> Option<&Attribute> {
        self.sub_attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_sub_attribute(&self, name: &str) -> bool {
        self.find_sub_attribute(name).is_some()
    }
}
