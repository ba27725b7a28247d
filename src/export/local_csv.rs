use crate::export::error::ExportError;
use crate::export::sink::{ExportTable, JobHandle, JobId, JobStatus, TableSink};
use crate::utils::{ensure_dir_exists, get_export_dir};
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::error::Error as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
enum JobFailure {
    #[error("could not create export folder '{0}'")]
    Folder(PathBuf, #[source] io::Error),

    #[error("could not evaluate table")]
    Collect(#[source] PolarsError),

    #[error("could not stage CSV in '{0}'")]
    Stage(PathBuf, #[source] io::Error),

    #[error("could not encode CSV")]
    Encode(#[source] PolarsError),

    #[error("export artifact '{0}' already exists")]
    AlreadyExists(PathBuf),

    #[error("could not persist export artifact '{0}'")]
    Persist(PathBuf, #[source] io::Error),

    #[error("export task failed")]
    TaskJoin(#[from] task::JoinError),
}

// The failure and each of its causes, outermost first.
fn failure_reason(failure: &JobFailure) -> String {
    let mut reason = failure.to_string();
    let mut source = failure.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

#[derive(Default)]
struct JobRegistry {
    statuses: HashMap<JobId, JobStatus>,
    forgotten: HashSet<JobId>,
}

/// Writes exported tables as CSV files under a local root directory.
///
/// Each submission becomes a Tokio task. Artifacts are created once: a job whose
/// destination file already exists fails and leaves the existing file untouched.
///
/// Statuses are kept for the lifetime of the sink. Call [`forget`](Self::forget) to drop
/// the record of a finished job.
pub struct LocalCsvSink {
    root: PathBuf,
    jobs: Arc<Mutex<JobRegistry>>,
    next_id: AtomicU64,
}

impl LocalCsvSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jobs: Arc::new(Mutex::new(JobRegistry::default())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Sink rooted in the platform data directory.
    pub fn with_default_root() -> Option<Self> {
        get_export_dir().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current status of a job, or `None` if this sink never issued `id` or it was forgotten.
    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        if id.0 >= self.next_id.load(Ordering::Acquire) {
            return None;
        }
        let jobs = self.jobs.lock().await;
        if jobs.forgotten.contains(id) {
            return None;
        }
        // Issued but not yet picked up by its task.
        Some(jobs.statuses.get(id).cloned().unwrap_or(JobStatus::Submitted))
    }

    /// Drops the record of a finished job and returns its final status.
    ///
    /// Jobs that have not finished are kept and `None` is returned.
    pub async fn forget(&self, id: &JobId) -> Option<JobStatus> {
        let mut jobs = self.jobs.lock().await;
        if !jobs.statuses.get(id).is_some_and(JobStatus::is_finished) {
            return None;
        }
        jobs.forgotten.insert(*id);
        jobs.statuses.remove(id)
    }

    /// Polls [`status`](Self::status) until the job has finished.
    pub async fn wait(&self, id: &JobId) -> Option<JobStatus> {
        loop {
            match self.status(id).await {
                Some(status) if !status.is_finished() => tokio::time::sleep(POLL_INTERVAL).await,
                other => return other,
            }
        }
    }
}

impl TableSink for LocalCsvSink {
    fn submit(&self, table: ExportTable) -> Result<JobHandle, ExportError> {
        table.validate()?;
        let runtime = Handle::try_current().map_err(ExportError::NoRuntime)?;

        let id = JobId(self.next_id.fetch_add(1, Ordering::AcqRel));
        let folder = self.root.join(table.folder());
        let destination = table.destination(&self.root);
        let handle = JobHandle::new(id, table.description().to_string(), destination.clone());
        info!("Submitted {} export {} to {:?}", table.format(), id, destination);

        let jobs = Arc::clone(&self.jobs);
        let frame = table.into_frame();
        runtime.spawn(async move {
            jobs.lock().await.statuses.insert(id, JobStatus::Running);
            debug!("Export {} running", id);
            let status = match run_job(frame, folder, destination).await {
                Ok((path, rows)) => {
                    info!("Export {} wrote {} rows to {:?}", id, rows, path);
                    JobStatus::Completed { path, rows }
                }
                Err(e) => {
                    let reason = failure_reason(&e);
                    warn!("Export {} failed: {}", id, reason);
                    JobStatus::Failed { reason }
                }
            };
            jobs.lock().await.statuses.insert(id, status);
        });
        Ok(handle)
    }
}

async fn run_job(
    frame: LazyFrame,
    folder: PathBuf,
    destination: PathBuf,
) -> Result<(PathBuf, usize), JobFailure> {
    ensure_dir_exists(&folder)
        .await
        .map_err(|e| JobFailure::Folder(folder.clone(), e))?;
    let rows = task::spawn_blocking({
        let destination = destination.clone();
        move || write_csv(frame, &folder, &destination)
    })
    .await??;
    Ok((destination, rows))
}

fn write_csv(frame: LazyFrame, folder: &Path, destination: &Path) -> Result<usize, JobFailure> {
    if destination.exists() {
        return Err(JobFailure::AlreadyExists(destination.to_path_buf()));
    }
    let mut df = frame.collect().map_err(JobFailure::Collect)?;

    let mut staged =
        NamedTempFile::new_in(folder).map_err(|e| JobFailure::Stage(folder.to_path_buf(), e))?;
    CsvWriter::new(staged.as_file_mut())
        .include_header(true)
        .finish(&mut df)
        .map_err(JobFailure::Encode)?;
    staged.persist_noclobber(destination).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            JobFailure::AlreadyExists(destination.to_path_buf())
        } else {
            JobFailure::Persist(destination.to_path_buf(), e.error)
        }
    })?;
    Ok(df.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_frame() -> LazyFrame {
        df!(
            "date" => ["2020-01-01", "2020-01-02"],
            "p1_temperature_2m" => [Some(250.5), None]
        )
        .unwrap()
        .lazy()
    }

    #[tokio::test]
    async fn test_export_writes_csv() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let sink = LocalCsvSink::new(dir.path());
        let handle = sink.submit(ExportTable::csv(station_frame(), "Anabar__Station", "GEE"))?;
        assert_eq!(handle.destination(), dir.path().join("GEE/Anabar__Station.csv"));

        let status = sink.wait(&handle.id()).await;
        assert_eq!(
            status,
            Some(JobStatus::Completed {
                path: handle.destination().to_path_buf(),
                rows: 2
            })
        );
        let written = std::fs::read_to_string(handle.destination())?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "date,p1_temperature_2m");
        assert_eq!(lines[1], "2020-01-01,250.5");
        assert_eq!(lines[2], "2020-01-02,");
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_artifact_is_never_overwritten() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("GEE"))?;
        let existing = dir.path().join("GEE/Anabar__Station.csv");
        std::fs::write(&existing, "keep me")?;

        let sink = LocalCsvSink::new(dir.path());
        let handle = sink.submit(ExportTable::csv(station_frame(), "Anabar__Station", "GEE"))?;
        let status = sink.wait(&handle.id()).await;
        assert!(matches!(status, Some(JobStatus::Failed { .. })));
        assert_eq!(std::fs::read_to_string(existing)?, "keep me");
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_plan_reports_through_status() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let sink = LocalCsvSink::new(dir.path());
        let broken = station_frame().select([col("not_a_column")]);
        let handle = sink.submit(ExportTable::csv(broken, "broken", "GEE"))?;
        match sink.wait(&handle.id()).await {
            Some(JobStatus::Failed { reason }) => {
                assert!(reason.starts_with("could not evaluate table: "));
                assert!(reason.contains("not_a_column"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!handle.destination().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_job_and_invalid_names() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let sink = LocalCsvSink::new(dir.path());
        assert_eq!(sink.status(&JobId(42)).await, None);
        let result = sink.submit(ExportTable::csv(station_frame(), "../escape", "GEE"));
        assert!(matches!(result, Err(ExportError::InvalidName { field: "description", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_forget_finished_job() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let sink = LocalCsvSink::new(dir.path());
        let handle = sink.submit(ExportTable::csv(station_frame(), "Anabar__Station", "GEE"))?;
        let finished = sink.wait(&handle.id()).await;
        assert!(matches!(finished, Some(JobStatus::Completed { rows: 2, .. })));

        assert_eq!(sink.forget(&handle.id()).await, finished);
        assert_eq!(sink.status(&handle.id()).await, None);
        assert_eq!(sink.forget(&handle.id()).await, None);
        assert!(handle.destination().exists());
        Ok(())
    }

    #[test]
    fn test_failure_message_names_cause_once() {
        let failure = JobFailure::Folder(PathBuf::from("GEE"), io::Error::other("disk full"));
        assert_eq!(failure.to_string(), "could not create export folder 'GEE'");
        let reason = failure_reason(&failure);
        assert_eq!(reason, "could not create export folder 'GEE': disk full");
        assert_eq!(reason.matches("disk full").count(), 1);
    }

    #[test]
    fn test_submit_outside_runtime() {
        let sink = LocalCsvSink::new(std::env::temp_dir());
        let result = sink.submit(ExportTable::csv(station_frame(), "x", "GEE"));
        assert!(matches!(result, Err(ExportError::NoRuntime(_))));
    }
}
