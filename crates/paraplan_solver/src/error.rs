use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    /// The model was assembled from inconsistent inputs; an internal bug
    /// rather than a property of the problem.
    #[error("invalid routing model: {0}")]
    Invalid(String),
}
