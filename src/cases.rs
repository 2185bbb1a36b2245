use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::domain::{EntityField, EntityKind, split_ids};
use crate::entity::Entity;

pub const BIOSPECIMEN_DELIMITERS: [char; 1] = [','];

/// Diagnosis and demographics of one participant merged into one record;
/// demographics values win on field collisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    #[serde(skip)]
    participant_id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
    atlasid: String,
}

impl Case {
    pub fn merge(participant_id: &str, diagnosis: &Entity, demographics: Option<&Entity>) -> Self {
        let mut fields = diagnosis.fields().clone();
        let mut atlasid = diagnosis.atlas_id().to_string();
        if let Some(demographics) = demographics {
            for (key, value) in demographics.fields() {
                fields.insert(key.clone(), value.clone());
            }
            atlasid = demographics.atlas_id().to_string();
        }
        Self {
            participant_id: participant_id.to_string(),
            fields,
            atlasid,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Entity positions joined onto one file, plus its merged cases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseJoin {
    pub biospecimens: Vec<usize>,
    pub diagnosis: Vec<usize>,
    pub demographics: Vec<usize>,
    pub cases: Vec<Case>,
}

pub struct CaseJoiner<'a> {
    entities: &'a [Entity],
    biospecimen_by_id: HashMap<&'a str, usize>,
    diagnosis_by_participant: HashMap<&'a str, usize>,
    demographics_by_participant: HashMap<&'a str, usize>,
    reported: HashSet<usize>,
    diagnostics: Diagnostics,
}

impl<'a> CaseJoiner<'a> {
    pub fn new(entities: &'a [Entity]) -> Self {
        let mut biospecimen_by_id = HashMap::new();
        let mut diagnosis_by_participant = HashMap::new();
        let mut demographics_by_participant = HashMap::new();
        for (pos, entity) in entities.iter().enumerate() {
            match entity.kind() {
                EntityKind::Biospecimen => {
                    if let Some(id) = entity.biospecimen_id() {
                        biospecimen_by_id.insert(id, pos);
                    }
                }
                EntityKind::Diagnosis => {
                    if let Some(id) = entity.participant_id() {
                        diagnosis_by_participant.insert(id, pos);
                    }
                }
                EntityKind::Demographics => {
                    if let Some(id) = entity.participant_id() {
                        demographics_by_participant.insert(id, pos);
                    }
                }
                EntityKind::File | EntityKind::Other => {}
            }
        }
        Self {
            entities,
            biospecimen_by_id,
            diagnosis_by_participant,
            demographics_by_participant,
            reported: HashSet::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn join(&mut self, file: usize, primary_parents: &[usize]) -> CaseJoin {
        let ancestors = if primary_parents.is_empty() {
            std::slice::from_ref(&file)
        } else {
            primary_parents
        };
        let biospecimens = self.biospecimens_of(ancestors);

        let mut diagnosis = Vec::new();
        let mut demographics = Vec::new();
        for &biospecimen in &biospecimens {
            let root = self.case_root(biospecimen);
            let found = root.and_then(|id| self.diagnosis_by_participant.get(id).copied());
            match found {
                Some(pos) => diagnosis.push(pos),
                None => self.report_missing_diagnosis(biospecimen, root),
            }
            if let Some(&pos) = root.and_then(|id| self.demographics_by_participant.get(id)) {
                demographics.push(pos);
            }
        }

        let cases = diagnosis
            .iter()
            .filter_map(|&pos| {
                let entity = &self.entities[pos];
                let participant = entity.participant_id()?;
                let demographics = self
                    .demographics_by_participant
                    .get(participant)
                    .map(|&demo| &self.entities[demo]);
                Some(Case::merge(participant, entity, demographics))
            })
            .collect();

        CaseJoin {
            biospecimens,
            diagnosis,
            demographics,
            cases,
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn biospecimens_of(&self, ancestors: &[usize]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut biospecimens = Vec::new();
        for &ancestor in ancestors {
            let declared = self.entities[ancestor]
                .text(EntityField::ParentBiospecimenId)
                .unwrap_or_default();
            for id in split_ids(declared, &BIOSPECIMEN_DELIMITERS) {
                if let Some(&pos) = self.biospecimen_by_id.get(id)
                    && seen.insert(id)
                {
                    biospecimens.push(pos);
                }
            }
        }
        biospecimens
    }

    /// Follows `HTANParentID` through known biospecimens; the first id that
    /// is not a biospecimen is the participant.
    pub fn case_root(&mut self, biospecimen: usize) -> Option<&'a str> {
        let entities = self.entities;
        let mut visited = HashSet::from([biospecimen]);
        let mut current = entities[biospecimen].text(EntityField::ParentId)?;
        while let Some(&next) = self.biospecimen_by_id.get(current) {
            if !visited.insert(next) {
                let start = entities[biospecimen].biospecimen_id().unwrap_or_default();
                warn!(
                    biospecimen = start,
                    revisited = current,
                    "biospecimen parent chain loops"
                );
                self.diagnostics
                    .push(DiagnosticKind::BiospecimenCycle, start, current);
                break;
            }
            current = entities[next].text(EntityField::ParentId)?;
        }
        Some(current)
    }

    fn report_missing_diagnosis(&mut self, biospecimen: usize, root: Option<&str>) {
        if !self.reported.insert(biospecimen) {
            return;
        }
        let id = self.entities[biospecimen]
            .biospecimen_id()
            .unwrap_or_default();
        let participant = root.unwrap_or_default();
        warn!(
            biospecimen = id,
            participant, "no diagnosis for biospecimen case root; dropped from join"
        );
        self.diagnostics
            .push(DiagnosticKind::MissingDiagnosis, id, participant);
    }
}
