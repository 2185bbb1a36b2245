use assert_matches::assert_matches;
use serde_json::{Value, json};

use htan_catalog::domain::{EntityField, EntityKind};
use htan_catalog::error::CatalogError;
use htan_catalog::extract::extract_entities;
use htan_catalog::raw::RawDataset;

fn dataset(value: Value) -> RawDataset {
    serde_json::from_value(value).unwrap()
}

fn two_atlas_dataset() -> RawDataset {
    dataset(json!({
        "schemas": [
            { "data_schema": "bts:Biospecimen",
              "attributes": [{ "id": "bts:Component" }, { "id": "bts:HTANBiospecimenID" }] },
            { "data_schema": "bts:ScRNA-seqLevel1",
              "attributes": [{ "id": "bts:Component" }, { "id": "bts:Filename" }, { "id": "bts:HTANDataFileID" }] }
        ],
        "atlases": [
            {
                "htan_id": "hta1",
                "htan_name": "HTAN Alpha",
                "Biospecimen": { "data_schema": "bts:Biospecimen", "record_list": [
                    { "values": ["Biospecimen", "B1"] },
                    { "values": ["Biospecimen", "B2"] }
                ]},
                "ScRNA-seqLevel1": { "data_schema": "bts:ScRNA-seqLevel1", "record_list": [
                    { "values": ["ScRNA-seqLevel1", "a.fastq", "F1"] }
                ]}
            },
            {
                "htan_id": "hta2",
                "htan_name": "HTAN Beta",
                "Unregistered": { "data_schema": "bts:Unregistered", "record_list": [
                    { "values": ["Whatever"] }
                ]},
                "ScRNA-seqLevel1": { "data_schema": "bts:ScRNA-seqLevel1", "record_list": [
                    { "values": ["ScRNA-seqLevel1", "b.fastq", "F2"] },
                    { "values": ["ScRNA-seqLevel1", "c.fastq", "F3"] }
                ]}
            }
        ]
    }))
}

#[test]
fn extracts_every_record_of_known_schemas() {
    let entities = extract_entities(&two_atlas_dataset()).unwrap();
    // 2 + 1 in hta1, 2 in hta2; the unregistered group is skipped
    assert_eq!(entities.len(), 5);
}

#[test]
fn extraction_follows_source_order_and_tags_atlas() {
    let entities = extract_entities(&two_atlas_dataset()).unwrap();
    let ids = entities
        .iter()
        .map(|entity| {
            entity
                .biospecimen_id()
                .or(entity.text(EntityField::DataFileId))
                .unwrap()
        })
        .collect::<Vec<_>>();
    assert_eq!(ids, ["B1", "B2", "F1", "F2", "F3"]);

    let atlases = entities.iter().map(|entity| entity.atlas_id()).collect::<Vec<_>>();
    assert_eq!(atlases, ["hta1", "hta1", "hta1", "hta2", "hta2"]);
    assert_eq!(entities[0].kind(), EntityKind::Biospecimen);
    assert_eq!(entities[2].kind(), EntityKind::File);
}

#[test]
fn reserved_keys_are_not_record_groups() {
    let raw = two_atlas_dataset();
    let groups = raw.atlases[0]
        .record_groups()
        .map(|group| group.unwrap().0.to_string())
        .collect::<Vec<_>>();
    assert_eq!(groups, ["Biospecimen", "ScRNA-seqLevel1"]);
}

#[test]
fn malformed_group_fails_the_load() {
    let raw = dataset(json!({
        "schemas": [],
        "atlases": [{ "htan_id": "hta1", "htan_name": "HTAN Alpha", "Broken": "not a group" }]
    }));
    let err = extract_entities(&raw).unwrap_err();
    assert_matches!(err, CatalogError::MalformedGroup { ref group, .. } if group == "Broken");
}

#[test]
fn malformed_dataset_bytes_fail_to_parse() {
    let err = RawDataset::from_slice(b"{\"atlases\": 3}").unwrap_err();
    assert_matches!(err, CatalogError::DatasetParse(_));
}
