use knxhub_domain::error::HubError;

/// Errors raised while appending to or reading the history file.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("history file io failed")]
    Io(#[from] std::io::Error),

    #[error("history row could not be written or read")]
    Csv(#[from] csv::Error),

    #[error("history row {line} is malformed")]
    Malformed { line: u64 },
}

impl From<CsvError> for HubError {
    fn from(err: CsvError) -> Self {
        Self::Storage(Box::new(err))
    }
}
