//! The subset of the OpenAPI schema object Gemini accepts as a
//! `responseSchema` for structured output.
use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    String,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub r#type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    // Gemini emits properties alphabetically unless told otherwise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_ordering: Vec<String>,
}

impl Schema {
    pub fn new(r#type: SchemaType) -> Self {
        Self {
            r#type,
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            property_ordering: Vec::new(),
        }
    }

    pub fn string(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Self::new(SchemaType::String)
        }
    }

    /// Add a required property, keeping declaration order.
    pub fn required_property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self.required.push(name.to_string());
        self.property_ordering.push(name.to_string());
        self
    }
}
