use chrono::NaiveDate;
use serde::Serialize;

use crate::audit_log::{self, AuditLog, EventQuery};
use crate::config::ExporterConfig;
use crate::error::ExportError;
use crate::planner;
use crate::report::ReportWriter;
use crate::storage::ReportStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedReport {
    pub date: NaiveDate,
    pub rows: usize,
}

/// What one run did. Dates in `skipped` had a local file failure and are picked up again next run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub exported: Vec<ExportedReport>,
    pub skipped: Vec<NaiveDate>,
}

pub struct DailyUsageExporter<L, S> {
    config: ExporterConfig,
    audit_log: L,
    store: S,
    writer: ReportWriter,
}

impl<L, S> DailyUsageExporter<L, S>
where
    L: AuditLog,
    S: ReportStore,
{
    pub fn new(config: ExporterConfig, audit_log: L, store: S) -> Self {
        let writer = ReportWriter::new(config.scratch_dir.clone(), config.key_prefix.clone());
        Self {
            config,
            audit_log,
            store,
            writer,
        }
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Exports every day in the lookback window before `today` that has no report yet.
    ///
    /// Audit log and storage failures abort the run. A date whose scratch file
    /// can't be written or read is logged, recorded as skipped, and the run moves on.
    pub async fn run(&self, today: NaiveDate) -> Result<ExportSummary, ExportError> {
        let window = planner::report_window(today, self.config.lookback_days);
        if let (Some(first), Some(last)) = (window.first(), window.last()) {
            tracing::info!("Checking reports from {} to {} in bucket {}", first, last, self.config.bucket);
        }

        let existing_keys = self.store.list_keys().await?;
        let pending = planner::pending_dates(&window, &existing_keys, &self.config.key_prefix);
        tracing::info!("{} of {} dates need a report", pending.len(), window.len());

        let mut summary = ExportSummary::default();

        for date in pending {
            let query = EventQuery::for_day(&self.config.event_source, date);
            let events = audit_log::events(&self.audit_log, &query);

            match self.writer.write(&self.store, date, events).await {
                Ok(rows) => {
                    tracing::info!("Exported {} events for {}", rows, date);
                    summary.exported.push(ExportedReport { date, rows });
                }
                Err(err) if err.is_local_io() => {
                    tracing::error!("Failed to create report for {}: {}", date, err);
                    summary.skipped.push(date);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(summary)
    }
}
