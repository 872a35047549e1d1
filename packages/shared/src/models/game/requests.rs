use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateGameRequest {
    pub title: String,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinGameRequest {
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StartGameRequest {
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

/// Ballot of participant ids the caller votes for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CastVoteRequest {
    pub targets: Vec<String>,
}
