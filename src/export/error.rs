use thiserror::Error;

/// Failures detected while submitting an export. Failures of the job itself are
/// reported through [`JobStatus::Failed`](crate::export::sink::JobStatus::Failed).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export {field} '{value}': must be non-empty and free of path separators")]
    InvalidName { field: &'static str, value: String },

    #[error("Export jobs must be submitted from within a Tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}
