//! Resolution of a denormalized HTAN catalogue into a file entity graph.
//!
//! [`pipeline::run_pipeline`] is the pure core: it decodes schema-described
//! records, resolves file lineage to primary parents, joins files to
//! biospecimens and cases, and aggregates per-atlas counts. Fetching the
//! inputs is the job of a [`source::CatalogSource`].

pub mod app;
pub mod assay;
pub mod atlas;
pub mod cases;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod entity;
pub mod error;
pub mod extract;
pub mod http;
pub mod lineage;
pub mod output;
pub mod pipeline;
pub mod raw;
pub mod schema;
pub mod source;
