use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A file names a parent file id that no file carries.
    MissingParentFile,
    /// A file's parent chain re-enters a file already on the traversal path.
    LineageCycle,
    /// A biospecimen's case root has no diagnosis record.
    MissingDiagnosis,
    /// A biospecimen's parent chain revisits a biospecimen.
    BiospecimenCycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub context: String,
    pub missing_id: String,
}

/// Unresolved references found during one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        context: impl Into<String>,
        missing_id: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            kind,
            context: context.into(),
            missing_id: missing_id.into(),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn missing_ids(&self, kind: DiagnosticKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.missing_id.as_str())
            .collect()
    }
}
