use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{EntityField, EntityKind};

/// One decoded catalogue record, tagged with its owning atlas.
///
/// Entities are immutable once decoded; everything the pipeline derives is
/// kept beside them in [`crate::pipeline::FileAnnotations`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    #[serde(flatten)]
    fields: Map<String, Value>,
    atlasid: String,
}

impl Entity {
    pub fn new(fields: Map<String, Value>, atlas_id: impl Into<String>) -> Self {
        Self {
            fields,
            atlasid: atlas_id.into(),
        }
    }

    pub fn atlas_id(&self) -> &str {
        &self.atlasid
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Non-empty string value of a logical field.
    pub fn text(&self, field: EntityField) -> Option<&str> {
        self.fields
            .get(field.as_str())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn kind(&self) -> EntityKind {
        let has_file_identity = self.text(EntityField::Filename).is_some()
            || self.text(EntityField::DataFileId).is_some();
        EntityKind::classify(self.text(EntityField::Component), has_file_identity)
    }

    pub fn data_file_id(&self) -> Option<&str> {
        self.text(EntityField::DataFileId)
    }

    pub fn biospecimen_id(&self) -> Option<&str> {
        self.text(EntityField::BiospecimenId)
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.text(EntityField::ParticipantId)
    }
}
