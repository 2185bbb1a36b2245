use assert_matches::assert_matches;
use serde_json::json;

use htan_catalog::domain::EntityField;
use htan_catalog::error::CatalogError;
use htan_catalog::raw::RawSchema;
use htan_catalog::schema::{CompiledSchema, SchemaRegistry};

fn schema(name: &str, ids: &[&str]) -> RawSchema {
    serde_json::from_value(json!({
        "data_schema": name,
        "attributes": ids.iter().map(|id| json!({ "id": id, "display_name": id })).collect::<Vec<_>>(),
    }))
    .unwrap()
}

#[test]
fn decode_strips_namespace() {
    let compiled = CompiledSchema::compile(&schema(
        "bts:Biospecimen",
        &["bts:Component", "bts:HTANBiospecimenID", "bts:HTANParentID"],
    ))
    .unwrap();
    assert_eq!(
        compiled.fields(),
        ["Component", "HTANBiospecimenID", "HTANParentID"]
    );

    let entity = compiled.decode(&[json!("Biospecimen"), json!("B1"), json!("P1")], "hta1");
    assert_eq!(entity.biospecimen_id(), Some("B1"));
    assert_eq!(entity.text(EntityField::ParentId), Some("P1"));
    assert_eq!(entity.atlas_id(), "hta1");
}

#[test]
fn decode_ignores_extra_values_and_leaves_missing_absent() {
    let compiled =
        CompiledSchema::compile(&schema("bts:Diagnosis", &["bts:Component", "bts:HTANParticipantID"]))
            .unwrap();

    let long = compiled.decode(&[json!("Diagnosis"), json!("P1"), json!("extra")], "hta1");
    assert_eq!(long.fields().len(), 2);

    let short = compiled.decode(&[json!("Diagnosis")], "hta1");
    assert_eq!(short.fields().len(), 1);
    assert!(short.get("HTANParticipantID").is_none());
}

#[test]
fn decode_keeps_values_untyped() {
    let compiled =
        CompiledSchema::compile(&schema("bts:Demographics", &["bts:HTANParticipantID", "bts:Age"]))
            .unwrap();
    let entity = compiled.decode(&[json!(7), json!(null)], "hta1");
    assert_eq!(entity.get("HTANParticipantID"), Some(&json!(7)));
    assert_eq!(entity.participant_id(), None);
    assert_eq!(entity.get("Age"), Some(&json!(null)));
}

#[test]
fn attribute_outside_namespace_is_rejected() {
    let err = CompiledSchema::compile(&schema("bts:Biospecimen", &["bts:Component", "Filename"]))
        .unwrap_err();
    assert_matches!(err, CatalogError::UnknownAttribute { ref id, .. } if id == "Filename");

    let err = SchemaRegistry::compile(&[schema("bts:Empty", &["bts:"])]).unwrap_err();
    assert_matches!(err, CatalogError::UnknownAttribute { .. });
}

#[test]
fn registry_lookup_by_name() {
    let registry = SchemaRegistry::compile(&[
        schema("bts:Biospecimen", &["bts:Component"]),
        schema("bts:Diagnosis", &["bts:Component", "bts:HTANParticipantID"]),
    ])
    .unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.get("bts:Diagnosis").is_some());
    assert!(registry.get("bts:Unregistered").is_none());
}
