//! Table export destinations and the handles of the jobs they run.

use crate::export::error::ExportError;
use polars::prelude::LazyFrame;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    Csv,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// A lazy table and where it should land: `{folder}/{description}.{extension}`.
#[derive(Clone)]
pub struct ExportTable {
    frame: LazyFrame,
    description: String,
    folder: String,
    format: TableFormat,
}

impl ExportTable {
    pub fn csv(frame: LazyFrame, description: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            frame,
            description: description.into(),
            folder: folder.into(),
            format: TableFormat::Csv,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Checks both names can be used as single path components.
    pub fn validate(&self) -> Result<(), ExportError> {
        check_name("description", &self.description)?;
        check_name("folder", &self.folder)
    }

    /// Destination file of this table under `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(&self.folder)
            .join(format!("{}.{}", self.description, self.format.extension()))
    }

    pub fn into_frame(self) -> LazyFrame {
        self.frame
    }
}

fn check_name(field: &'static str, value: &str) -> Result<(), ExportError> {
    let usable = !value.trim().is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\']);
    if usable {
        Ok(())
    } else {
        Err(ExportError::InvalidName {
            field,
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Progress of a submitted export job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Accepted, not started yet.
    Submitted,
    Running,
    Completed { path: PathBuf, rows: usize },
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

/// Returned by [`TableSink::submit`]; identifies the job for status polling.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    id: JobId,
    description: String,
    destination: PathBuf,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, description: String, destination: PathBuf) -> Self {
        Self {
            id,
            description,
            destination,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// A destination that exports tables in the background.
///
/// `submit` only schedules the job and returns at once. Whether the table was written is
/// known only through the sink's own status reporting.
pub trait TableSink {
    fn submit(&self, table: ExportTable) -> Result<JobHandle, ExportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(description: &str, folder: &str) -> ExportTable {
        ExportTable::csv(DataFrame::empty().lazy(), description, folder)
    }

    #[test]
    fn test_name_validation() {
        assert!(table("Anabar__Saskylakh__Station_ERA5_Land", "GEE").validate().is_ok());
        for (description, folder) in [("", "GEE"), ("a/b", "GEE"), ("x", ".."), ("x", "a\\b"), ("  ", "GEE")] {
            assert!(
                matches!(table(description, folder).validate(), Err(ExportError::InvalidName { .. })),
                "{description:?} in {folder:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_destination() {
        let t = table("Anabar__Saskylakh__Basin_ERA5_Land", "GEE");
        assert_eq!(
            t.destination(Path::new("/exports")),
            PathBuf::from("/exports/GEE/Anabar__Saskylakh__Basin_ERA5_Land.csv")
        );
        assert_eq!(t.format().to_string(), "CSV");
    }

    #[test]
    fn test_finished_states() {
        assert!(!JobStatus::Submitted.is_finished());
        assert!(!JobStatus::Running.is_finished());
        assert!(JobStatus::Failed { reason: "x".into() }.is_finished());
        assert_eq!(JobId(3).to_string(), "job-3");
    }
}
