use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::assay::classify_assay;
use crate::atlas::{Atlas, AtlasMeta, AtlasMetaIndex, AtlasRef, AtlasTally, aggregate_atlases};
use crate::cases::{Case, CaseJoin, CaseJoiner};
use crate::diagnostics::Diagnostics;
use crate::domain::{EntityField, EntityKind};
use crate::entity::Entity;
use crate::error::CatalogError;
use crate::extract::extract_entities;
use crate::lineage::LineageResolver;
use crate::raw::RawDataset;

/// Everything derived for one file during a run. Entity references are
/// positions in the run's flat entity list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileAnnotations {
    pub level: Option<String>,
    pub assay_name: Option<String>,
    pub atlas: Option<AtlasRef>,
    pub atlas_meta: Option<AtlasMeta>,
    pub primary_parents: Vec<usize>,
    pub join: CaseJoin,
}

/// A file entity with its derived fields attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFile {
    #[serde(flatten)]
    pub entity: Entity,
    pub level: Option<String>,
    pub assay_name: Option<String>,
    pub primary_parents: Vec<Entity>,
    pub biospecimen: Vec<Entity>,
    pub diagnosis: Vec<Entity>,
    pub demographics: Vec<Entity>,
    pub cases: Vec<Case>,
    pub atlas: Option<AtlasRef>,
    pub atlas_meta: Option<AtlasMeta>,
}

impl ResolvedFile {
    fn assemble(entities: &[Entity], file: usize, annotations: FileAnnotations) -> Self {
        let pick = |positions: &[usize]| {
            positions
                .iter()
                .map(|&pos| entities[pos].clone())
                .collect::<Vec<_>>()
        };
        Self {
            entity: entities[file].clone(),
            level: annotations.level,
            assay_name: annotations.assay_name,
            primary_parents: pick(&annotations.primary_parents),
            biospecimen: pick(&annotations.join.biospecimens),
            diagnosis: pick(&annotations.join.diagnosis),
            demographics: pick(&annotations.join.demographics),
            cases: annotations.join.cases,
            atlas: annotations.atlas,
            atlas_meta: annotations.atlas_meta,
        }
    }

    pub fn data_file_id(&self) -> Option<&str> {
        self.entity.data_file_id()
    }

    pub fn primary_parent_ids(&self) -> Vec<&str> {
        self.primary_parents
            .iter()
            .filter_map(Entity::data_file_id)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub entities: usize,
    pub files: usize,
    pub kept_files: usize,
    pub biospecimens: usize,
    pub diagnoses: usize,
    pub demographics: usize,
    pub atlases: usize,
    pub kept_atlases: usize,
    pub diagnostics: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogOutput {
    pub files: Vec<ResolvedFile>,
    pub atlases: Vec<Atlas>,
    pub diagnostics: Diagnostics,
    pub summary: PipelineSummary,
}

/// Runs extract, taxonomy, lineage, case join, file filter and atlas
/// aggregation over one dataset. The inputs are only read.
pub fn run_pipeline(
    dataset: &RawDataset,
    metadata: &[AtlasMeta],
) -> Result<CatalogOutput, CatalogError> {
    let entities = extract_entities(dataset)?;
    let meta_index = AtlasMetaIndex::new(metadata);
    let atlas_refs = dataset
        .atlases
        .iter()
        .map(|raw| (raw.htan_id.as_str(), AtlasRef::from(raw)))
        .collect::<HashMap<_, _>>();

    let mut summary = PipelineSummary {
        entities: entities.len(),
        atlases: dataset.atlases.len(),
        ..PipelineSummary::default()
    };
    let mut files = Vec::new();
    for (pos, entity) in entities.iter().enumerate() {
        match entity.kind() {
            EntityKind::File => files.push(pos),
            EntityKind::Biospecimen => summary.biospecimens += 1,
            EntityKind::Diagnosis => summary.diagnoses += 1,
            EntityKind::Demographics => summary.demographics += 1,
            EntityKind::Other => {}
        }
    }
    summary.files = files.len();
    info!(
        entities = summary.entities,
        files = summary.files,
        biospecimens = summary.biospecimens,
        "extracted catalogue entities"
    );

    let mut annotations = files
        .iter()
        .map(|&file| annotate_file(&entities[file], &atlas_refs, &meta_index))
        .collect::<Vec<_>>();

    let lineage = LineageResolver::new(&entities, &files).resolve_all(&files);
    let mut diagnostics = lineage.diagnostics;
    let mut joiner = CaseJoiner::new(&entities);
    for ((annotation, &file), primary_parents) in annotations
        .iter_mut()
        .zip(&files)
        .zip(lineage.primary_parents)
    {
        annotation.join = joiner.join(file, &primary_parents);
        annotation.primary_parents = primary_parents;
    }
    diagnostics.extend(joiner.into_diagnostics());

    let kept = files
        .into_iter()
        .zip(annotations)
        .filter(|(_, annotation)| !annotation.join.cases.is_empty())
        .collect::<Vec<_>>();

    let mut tally = AtlasTally::default();
    for (file, annotation) in &kept {
        tally.record(
            entities[*file].atlas_id(),
            annotation.join.cases.iter().map(Case::participant_id),
            annotation
                .join
                .biospecimens
                .iter()
                .filter_map(|&pos| entities[pos].biospecimen_id()),
        );
    }
    let atlases = aggregate_atlases(&dataset.atlases, &tally, &meta_index);

    summary.kept_files = kept.len();
    summary.kept_atlases = atlases.len();
    summary.diagnostics = diagnostics.len();
    info!(
        kept_files = summary.kept_files,
        kept_atlases = summary.kept_atlases,
        diagnostics = summary.diagnostics,
        "resolved catalogue"
    );

    let files = kept
        .into_iter()
        .map(|(file, annotation)| ResolvedFile::assemble(&entities, file, annotation))
        .collect();

    Ok(CatalogOutput {
        files,
        atlases,
        diagnostics,
        summary,
    })
}

fn annotate_file(
    entity: &Entity,
    atlas_refs: &HashMap<&str, AtlasRef>,
    meta_index: &AtlasMetaIndex,
) -> FileAnnotations {
    let assay = classify_assay(
        entity.text(EntityField::Component),
        entity.text(EntityField::ImagingAssayType),
        entity.text(EntityField::AssayType),
    );
    FileAnnotations {
        level: assay.level,
        assay_name: assay.assay_name,
        atlas: atlas_refs.get(entity.atlas_id()).cloned(),
        atlas_meta: meta_index.for_entity(entity.atlas_id()).cloned(),
        ..FileAnnotations::default()
    }
}
