use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("failed to parse catalogue dataset: {0}")]
    DatasetParse(String),

    #[error("failed to parse atlas metadata: {0}")]
    MetadataParse(String),

    #[error("schema {schema} declares attribute outside the bts namespace: {id:?}")]
    UnknownAttribute { schema: String, id: String },

    #[error("record group {group} in atlas {atlas} is malformed: {message}")]
    MalformedGroup {
        atlas: String,
        group: String,
        message: String,
    },

    #[error("invalid source location: {0:?}")]
    InvalidLocation(String),

    #[error("missing config file htan-catalog.json in current directory")]
    MissingConfig,

    #[error("config does not name a {0} source")]
    MissingSource(&'static str),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("unsupported config schema_version {found}; expected {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("catalogue request failed: {0}")]
    Http(String),

    #[error("catalogue server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },
}
