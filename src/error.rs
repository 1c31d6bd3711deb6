use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("audit log request failed: {0}")]
    AuditLog(#[source] BoxError),

    #[error("object storage request failed: {0}")]
    Storage(#[source] BoxError),

    #[error("local file error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    pub fn audit_log(err: impl Into<BoxError>) -> Self {
        ExportError::AuditLog(err.into())
    }

    pub fn storage(err: impl Into<BoxError>) -> Self {
        ExportError::Storage(err.into())
    }

    /// Errors raised while writing or reading the local scratch copy of a report.
    /// Nothing has been uploaded when these occur, so the date is retried on the next run.
    pub fn is_local_io(&self) -> bool {
        matches!(self, ExportError::LocalIo { .. } | ExportError::Csv(_))
    }
}
