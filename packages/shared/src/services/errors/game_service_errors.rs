use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::services::ballot::BallotRejection;

#[derive(Debug)]
pub enum GameServiceError {
    /// No caller identity was supplied.
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    InvalidState(String),
    PreconditionFailed(String),
    ValidationError(String),
    BallotRejected(BallotRejection),
    Conflict(String),
    RepositoryError(GameRepositoryError),
}

impl std::fmt::Display for GameServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameServiceError::Unauthorized => write!(f, "Caller identity is missing"),
            GameServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            GameServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            GameServiceError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            GameServiceError::PreconditionFailed(msg) => {
                write!(f, "Precondition failed: {}", msg)
            }
            GameServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            GameServiceError::BallotRejected(rejection) => {
                write!(f, "Validation error: {}", rejection)
            }
            GameServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            GameServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for GameServiceError {}

impl From<GameRepositoryError> for GameServiceError {
    fn from(err: GameRepositoryError) -> Self {
        GameServiceError::RepositoryError(err)
    }
}

impl From<BallotRejection> for GameServiceError {
    fn from(rejection: BallotRejection) -> Self {
        GameServiceError::BallotRejected(rejection)
    }
}
