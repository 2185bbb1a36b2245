use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CatalogError;
use crate::raw::RawAtlas;

/// Publication metadata for an atlas, supplied apart from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasMeta {
    pub htan_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AtlasMeta {
    pub fn list_from_slice(bytes: &[u8]) -> Result<Vec<AtlasMeta>, CatalogError> {
        serde_json::from_slice(bytes).map_err(|err| CatalogError::MetadataParse(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtlasRef {
    pub htan_id: String,
    pub htan_name: String,
}

impl From<&RawAtlas> for AtlasRef {
    fn from(raw: &RawAtlas) -> Self {
        Self {
            htan_id: raw.htan_id.clone(),
            htan_name: raw.htan_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Atlas {
    pub id: String,
    pub name: String,
    pub num_cases: usize,
    pub num_biospecimens: usize,
    pub external_metadata: Option<AtlasMeta>,
}

/// External metadata keyed by uppercased atlas id.
#[derive(Debug, Clone, Default)]
pub struct AtlasMetaIndex {
    by_id: HashMap<String, AtlasMeta>,
}

impl AtlasMetaIndex {
    pub fn new(metadata: &[AtlasMeta]) -> Self {
        let by_id = metadata
            .iter()
            .map(|meta| (meta.htan_id.to_uppercase(), meta.clone()))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, atlas_id: &str) -> Option<&AtlasMeta> {
        self.by_id.get(&atlas_id.to_uppercase())
    }

    /// Lookup by the atlas-id prefix before the first `_`, as carried on
    /// entity `atlasid` values such as `hta1_2021`.
    pub fn for_entity(&self, atlas_id: &str) -> Option<&AtlasMeta> {
        let prefix = atlas_id.split('_').next().unwrap_or(atlas_id);
        self.get(prefix)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Distinct participants and biospecimens seen per atlas.
#[derive(Debug, Clone, Default)]
pub struct AtlasTally {
    participants: HashMap<String, HashSet<String>>,
    biospecimens: HashMap<String, HashSet<String>>,
}

impl AtlasTally {
    pub fn record<'a>(
        &mut self,
        atlas_id: &str,
        participant_ids: impl IntoIterator<Item = &'a str>,
        biospecimen_ids: impl IntoIterator<Item = &'a str>,
    ) {
        self.participants
            .entry(atlas_id.to_string())
            .or_default()
            .extend(participant_ids.into_iter().map(str::to_string));
        self.biospecimens
            .entry(atlas_id.to_string())
            .or_default()
            .extend(biospecimen_ids.into_iter().map(str::to_string));
    }

    pub fn num_cases(&self, atlas_id: &str) -> usize {
        self.participants.get(atlas_id).map_or(0, HashSet::len)
    }

    pub fn num_biospecimens(&self, atlas_id: &str) -> usize {
        self.biospecimens.get(atlas_id).map_or(0, HashSet::len)
    }
}

/// Builds atlases in source order, dropping those without external metadata.
pub fn aggregate_atlases(
    atlases: &[RawAtlas],
    tally: &AtlasTally,
    metadata: &AtlasMetaIndex,
) -> Vec<Atlas> {
    atlases
        .iter()
        .filter_map(|raw| {
            let meta = metadata.get(&raw.htan_id)?;
            Some(Atlas {
                id: raw.htan_id.clone(),
                name: raw.htan_name.clone(),
                num_cases: tally.num_cases(&raw.htan_id),
                num_biospecimens: tally.num_biospecimens(&raw.htan_id),
                external_metadata: Some(meta.clone()),
            })
        })
        .collect()
}
