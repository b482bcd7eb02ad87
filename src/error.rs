use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid formula: {0}")]
    InvalidFormula(String),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("rejected: {0}")]
    Rejected(String),
}
