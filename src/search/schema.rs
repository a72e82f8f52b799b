use serde::Serialize;

/// Settings and mappings sent when an index is created. Field order matches
/// the body existing deployments were created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSchema {
    pub settings: IndexSettings,
    pub mappings: IndexMappings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexMappings {
    pub properties: DocumentProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentProperties {
    pub content: TextField,
    pub timestamp: DateField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextField {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub analyzer: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateField {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Full-text `content` plus a `timestamp` date. A different layout needs its
/// own constant rather than a parameter here.
pub const DOCUMENT_INDEX_SCHEMA: IndexSchema = IndexSchema {
    settings: IndexSettings {
        number_of_shards: 1,
        number_of_replicas: 0,
    },
    mappings: IndexMappings {
        properties: DocumentProperties {
            content: TextField {
                kind: "text",
                analyzer: "standard",
            },
            timestamp: DateField { kind: "date" },
        },
    },
};
