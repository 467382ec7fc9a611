use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input was considered invalid due to error: {0}")]
    InvalidInput(#[from] anyhow::Error),
    #[error("Error while writing outputs: {0}")]
    ErrorInOutput(OutputError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}
