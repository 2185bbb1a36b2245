use std::fs;
use std::io::Read;

use camino::Utf8Path;
use flate2::read::GzDecoder;

use crate::atlas::AtlasMeta;
use crate::config::SourceRequest;
use crate::domain::SourceLocation;
use crate::error::CatalogError;
use crate::raw::RawDataset;

/// Supplies the two pipeline inputs. Implementations own all I/O; the
/// pipeline itself only sees the decoded values.
pub trait CatalogSource {
    fn load_dataset(&self) -> Result<RawDataset, CatalogError>;
    fn load_atlas_metadata(&self) -> Result<Vec<AtlasMeta>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    dataset: SourceRequest,
    atlas_metadata: SourceRequest,
}

impl FileCatalogSource {
    pub fn new(dataset: SourceRequest, atlas_metadata: SourceRequest) -> Self {
        Self {
            dataset,
            atlas_metadata,
        }
    }

    fn read(request: &SourceRequest) -> Result<Vec<u8>, CatalogError> {
        match &request.location {
            SourceLocation::Path(path) => read_local(path, request.gzip),
            SourceLocation::Url(url) => Err(CatalogError::InvalidLocation(url.clone())),
        }
    }
}

impl CatalogSource for FileCatalogSource {
    fn load_dataset(&self) -> Result<RawDataset, CatalogError> {
        RawDataset::from_slice(&Self::read(&self.dataset)?)
    }

    fn load_atlas_metadata(&self) -> Result<Vec<AtlasMeta>, CatalogError> {
        AtlasMeta::list_from_slice(&Self::read(&self.atlas_metadata)?)
    }
}

pub fn read_local(path: &Utf8Path, gzip: bool) -> Result<Vec<u8>, CatalogError> {
    let bytes =
        fs::read(path).map_err(|err| CatalogError::Filesystem(format!("read {path}: {err}")))?;
    if gzip { gunzip(&bytes) } else { Ok(bytes) }
}

pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, CatalogError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| CatalogError::DatasetParse(format!("gzip: {err}")))?;
    Ok(out)
}
