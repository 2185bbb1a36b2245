use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::error::CatalogError;

/// Where a catalogue document lives: a local file or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Path(Utf8PathBuf),
    Url(String),
}

impl SourceLocation {
    pub fn as_str(&self) -> &str {
        match self {
            SourceLocation::Path(path) => path.as_str(),
            SourceLocation::Url(url) => url.as_str(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Url(_))
    }

    pub fn looks_gzipped(&self) -> bool {
        self.as_str().ends_with(".gz")
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceLocation {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidLocation(value.to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(SourceLocation::Url(trimmed.to_string()));
        }
        if trimmed.contains("://") {
            return Err(CatalogError::InvalidLocation(value.to_string()));
        }
        Ok(SourceLocation::Path(Utf8PathBuf::from(trimmed)))
    }
}

/// Logical fields the engine reads from decoded entities.
///
/// Names are the schema attribute ids with the `bts:` namespace removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityField {
    Component,
    Filename,
    DataFileId,
    ParentDataFileId,
    BiospecimenId,
    ParentBiospecimenId,
    ParentId,
    ParticipantId,
    ImagingAssayType,
    AssayType,
}

impl EntityField {
    pub const ALL: [EntityField; 10] = [
        EntityField::Component,
        EntityField::Filename,
        EntityField::DataFileId,
        EntityField::ParentDataFileId,
        EntityField::BiospecimenId,
        EntityField::ParentBiospecimenId,
        EntityField::ParentId,
        EntityField::ParticipantId,
        EntityField::ImagingAssayType,
        EntityField::AssayType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityField::Component => "Component",
            EntityField::Filename => "Filename",
            EntityField::DataFileId => "HTANDataFileID",
            EntityField::ParentDataFileId => "HTANParentDataFileID",
            EntityField::BiospecimenId => "HTANBiospecimenID",
            EntityField::ParentBiospecimenId => "HTANParentBiospecimenID",
            EntityField::ParentId => "HTANParentID",
            EntityField::ParticipantId => "HTANParticipantID",
            EntityField::ImagingAssayType => "ImagingAssayType",
            EntityField::AssayType => "AssayType",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for EntityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    File,
    Biospecimen,
    Diagnosis,
    Demographics,
    Other,
}

impl EntityKind {
    /// Classifies by the `Component` discriminator; anything that is not a
    /// clinical or biospecimen record but names a file counts as a file.
    pub fn classify(component: Option<&str>, has_file_identity: bool) -> Self {
        match component {
            Some("Biospecimen") => EntityKind::Biospecimen,
            Some("Diagnosis") => EntityKind::Diagnosis,
            Some("Demographics") => EntityKind::Demographics,
            _ if has_file_identity => EntityKind::File,
            _ => EntityKind::Other,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::File => write!(f, "file"),
            EntityKind::Biospecimen => write!(f, "biospecimen"),
            EntityKind::Diagnosis => write!(f, "diagnosis"),
            EntityKind::Demographics => write!(f, "demographics"),
            EntityKind::Other => write!(f, "other"),
        }
    }
}

/// Splits a delimited identifier list, trimming and dropping empty segments.
pub fn split_ids<'a>(value: &'a str, delimiters: &'a [char]) -> impl Iterator<Item = &'a str> + 'a {
    value
        .split(move |ch: char| delimiters.contains(&ch))
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_location_url() {
        let location: SourceLocation = "https://example.org/data.json".parse().unwrap();
        assert!(location.is_remote());
    }

    #[test]
    fn parse_location_rejects_other_schemes() {
        let err = "ftp://example.org/data.json"
            .parse::<SourceLocation>()
            .unwrap_err();
        assert_matches!(err, CatalogError::InvalidLocation(_));
    }

    #[test]
    fn classify_by_component() {
        assert_eq!(
            EntityKind::classify(Some("Biospecimen"), false),
            EntityKind::Biospecimen
        );
        assert_eq!(
            EntityKind::classify(Some("ScRNA-seqLevel1"), true),
            EntityKind::File
        );
        assert_eq!(EntityKind::classify(None, false), EntityKind::Other);
    }
}
