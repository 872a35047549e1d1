#[derive(Debug)]
pub enum GameRepositoryError {
    /// Another game already holds the join code.
    CodeTaken(String),
    /// The stored record moved past the version the write was based on.
    VersionConflict,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for GameRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameRepositoryError::CodeTaken(code) => write!(f, "Game code {} is already taken", code),
            GameRepositoryError::VersionConflict => {
                write!(f, "Game was modified by a concurrent request")
            }
            GameRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            GameRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for GameRepositoryError {}
