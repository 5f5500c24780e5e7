use thiserror::Error;

/// The two failure kinds of the pipeline.
#[derive(Debug, Error)]
pub enum RainError {
    /// Loaded artifacts disagree with the schema the code assumes.
    /// Not recoverable by the user; startup should abort.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A single request could not be scored. The user may resubmit.
    #[error("prediction failed: {0:#}")]
    PredictionFailed(anyhow::Error),
}

pub type RainResult<T> = Result<T, RainError>;

impl RainError {
    pub fn schema(msg: impl Into<String>) -> Self {
        RainError::SchemaMismatch(msg.into())
    }

    pub fn prediction(cause: impl Into<anyhow::Error>) -> Self {
        RainError::PredictionFailed(cause.into())
    }

    /// Underlying cause of a failed prediction.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            RainError::PredictionFailed(cause) => Some(cause),
            RainError::SchemaMismatch(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RainError::SchemaMismatch(_))
    }
}
