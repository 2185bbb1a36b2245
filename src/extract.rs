use tracing::debug;

use crate::entity::Entity;
use crate::error::CatalogError;
use crate::raw::RawDataset;
use crate::schema::SchemaRegistry;

/// Decodes every record group of every atlas into a flat entity list, in
/// atlas order then group order then record order.
pub fn extract_entities(dataset: &RawDataset) -> Result<Vec<Entity>, CatalogError> {
    let registry = SchemaRegistry::compile(&dataset.schemas)?;
    extract_with_registry(dataset, &registry)
}

pub fn extract_with_registry(
    dataset: &RawDataset,
    registry: &SchemaRegistry,
) -> Result<Vec<Entity>, CatalogError> {
    let mut entities = Vec::new();
    for atlas in &dataset.atlases {
        for group in atlas.record_groups() {
            let (key, group) = group?;
            let Some(schema) = registry.get(&group.data_schema) else {
                debug!(
                    atlas = %atlas.htan_id,
                    group = key,
                    schema = %group.data_schema,
                    "skipping record group with unknown schema"
                );
                continue;
            };
            entities.extend(
                group
                    .record_list
                    .iter()
                    .map(|record| schema.decode(&record.values, &atlas.htan_id)),
            );
        }
    }
    Ok(entities)
}
