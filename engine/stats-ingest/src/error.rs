use event_impact::AnalyticsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The source has nothing for this request (unknown season, missing file, ...)
    #[error("Stats source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed stats data: {0}")]
    Malformed(String),

    #[error(transparent)]
    Core(#[from] AnalyticsError),
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Malformed(err.to_string())
    }
}
