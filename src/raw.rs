use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CatalogError;

/// Atlas keys that identify the atlas rather than name a record group.
pub const RESERVED_GROUP_KEYS: [&str; 2] = ["htan_id", "htan_name"];

/// The denormalized catalogue as served by the fetch collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDataset {
    #[serde(default)]
    pub schemas: Vec<RawSchema>,
    #[serde(default)]
    pub atlases: Vec<RawAtlas>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSchema {
    pub data_schema: String,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAttribute {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAtlas {
    pub htan_id: String,
    #[serde(default)]
    pub htan_name: String,
    #[serde(flatten)]
    pub groups: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRecordGroup {
    pub data_schema: String,
    #[serde(default)]
    pub record_list: Vec<RawRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RawDataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        serde_json::from_slice(bytes).map_err(|err| CatalogError::DatasetParse(err.to_string()))
    }
}

impl RawAtlas {
    /// Record groups in source order.
    pub fn record_groups(
        &self,
    ) -> impl Iterator<Item = Result<(&str, RawRecordGroup), CatalogError>> + '_ {
        self.groups
            .iter()
            .filter(|(key, _)| !RESERVED_GROUP_KEYS.contains(&key.as_str()))
            .map(|(key, value)| {
                RawRecordGroup::deserialize(value)
                    .map(|group| (key.as_str(), group))
                    .map_err(|err| CatalogError::MalformedGroup {
                        atlas: self.htan_id.clone(),
                        group: key.clone(),
                        message: err.to_string(),
                    })
            })
    }
}
