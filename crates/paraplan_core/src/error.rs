use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("invalid time window for {0}: start is after end")]
    InvalidTimeWindow(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vehicle {0} has a negative capacity")]
    NegativeCapacity(String),
}
