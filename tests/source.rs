use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;

use htan_catalog::config::{RetryPolicy, SourceRequest};
use htan_catalog::domain::SourceLocation;
use htan_catalog::error::CatalogError;
use htan_catalog::http::HttpCatalogSource;
use htan_catalog::source::{CatalogSource, FileCatalogSource, gunzip};

const DATASET: &str = r#"{
    "schemas": [
        { "data_schema": "bts:Biospecimen",
          "attributes": [{ "id": "bts:Component" }, { "id": "bts:HTANBiospecimenID" }] }
    ],
    "atlases": [
        { "htan_id": "hta1", "htan_name": "HTAN Alpha",
          "Biospecimen": { "data_schema": "bts:Biospecimen",
                           "record_list": [{ "values": ["Biospecimen", "B1"] }] } }
    ]
}"#;

const METADATA: &str = r#"[{ "htan_id": "HTA1", "title": "Alpha atlas" }]"#;

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn local(path: std::path::PathBuf) -> SourceRequest {
    SourceRequest::new(SourceLocation::Path(
        Utf8PathBuf::from_path_buf(path).unwrap(),
    ))
}

#[test]
fn reads_plain_and_gzipped_files() {
    let temp = tempfile::tempdir().unwrap();
    let dataset_path = temp.path().join("processed.json.gz");
    let metadata_path = temp.path().join("atlas-meta.json");
    std::fs::write(&dataset_path, gzip(DATASET.as_bytes())).unwrap();
    std::fs::write(&metadata_path, METADATA).unwrap();

    let dataset = local(dataset_path);
    assert!(dataset.gzip);
    let source = FileCatalogSource::new(dataset, local(metadata_path));

    let raw = source.load_dataset().unwrap();
    assert_eq!(raw.schemas.len(), 1);
    assert_eq!(raw.atlases[0].htan_id, "hta1");

    let metadata = source.load_atlas_metadata().unwrap();
    assert_eq!(metadata[0].htan_id, "HTA1");
}

#[test]
fn missing_file_is_a_filesystem_error() {
    let temp = tempfile::tempdir().unwrap();
    let source = FileCatalogSource::new(
        local(temp.path().join("absent.json")),
        local(temp.path().join("absent-meta.json")),
    );
    assert_matches!(source.load_dataset(), Err(CatalogError::Filesystem(_)));
}

#[test]
fn file_source_rejects_urls() {
    let url = SourceRequest::new(SourceLocation::Url(
        "https://example.org/processed.json".to_string(),
    ));
    let source = FileCatalogSource::new(url.clone(), url);
    assert_matches!(source.load_atlas_metadata(), Err(CatalogError::InvalidLocation(_)));
}

#[test]
fn gunzip_rejects_plain_bytes() {
    assert_matches!(gunzip(b"not gzip"), Err(CatalogError::DatasetParse(_)));
}

#[test]
fn http_source_reads_local_locations_from_disk() {
    let temp = tempfile::tempdir().unwrap();
    let dataset_path = temp.path().join("processed.json");
    let metadata_path = temp.path().join("atlas-meta.json.gz");
    std::fs::write(&dataset_path, DATASET).unwrap();
    std::fs::write(&metadata_path, gzip(METADATA.as_bytes())).unwrap();

    let source = HttpCatalogSource::new(
        local(dataset_path),
        local(metadata_path),
        Duration::from_secs(5),
        RetryPolicy::default(),
    )
    .unwrap();

    assert_eq!(source.load_dataset().unwrap().atlases.len(), 1);
    assert_eq!(source.load_atlas_metadata().unwrap().len(), 1);
}
