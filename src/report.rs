use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use futures_util::{Stream, TryStreamExt};

use crate::error::ExportError;
use crate::models::{AuditEvent, COLUMNS, ReportRow};
use crate::planner::report_key;
use crate::storage::ReportStore;

/// Serializes one day of events to CSV in a scratch directory, then uploads it.
pub struct ReportWriter {
    scratch_dir: PathBuf,
    key_prefix: String,
}

impl ReportWriter {
    pub fn new(scratch_dir: PathBuf, key_prefix: String) -> Self {
        Self { scratch_dir, key_prefix }
    }

    /// Returns the number of event rows written.
    ///
    /// Errors from `events` are passed through untouched. Local file failures
    /// surface as errors for which `ExportError::is_local_io` holds, and in that
    /// case nothing has been uploaded.
    pub async fn write<S, E>(&self, store: &S, date: NaiveDate, events: E) -> Result<usize, ExportError>
    where
        S: ReportStore + ?Sized,
        E: Stream<Item = Result<AuditEvent, ExportError>>,
    {
        let key = report_key(&self.key_prefix, date);
        let path = self.scratch_dir.join(&key);

        let rows = write_csv(&path, events).await?;

        let body = tokio::fs::read(&path)
            .await
            .map_err(|source| ExportError::LocalIo { path: path.clone(), source })?;

        store.put_report(&key, body).await?;

        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove scratch file {}: {}", path.display(), err);
        }

        Ok(rows)
    }
}

async fn write_csv<E>(path: &Path, events: E) -> Result<usize, ExportError>
where
    E: Stream<Item = Result<AuditEvent, ExportError>>,
{
    // header is written by hand so that a day without events still gets one
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(COLUMNS)?;

    let mut events = std::pin::pin!(events);
    let mut rows = 0;
    while let Some(event) = events.try_next().await? {
        writer.serialize(ReportRow::from_event(&event))?;
        rows += 1;
    }

    writer
        .flush()
        .map_err(|source| ExportError::LocalIo { path: path.to_path_buf(), source })?;

    Ok(rows)
}
