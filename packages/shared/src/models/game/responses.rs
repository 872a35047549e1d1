use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::game::{Game, GameStatus};
use crate::models::participant::{Participant, ParticipantStatus, Rank};
use crate::services::ballot::max_votes;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub rank: Option<Rank>,
    pub vote_count: u32,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        ParticipantSummary {
            id: participant.id.clone(),
            user_id: participant.user_id.clone(),
            status: participant.status,
            rank: participant.rank,
            vote_count: participant.vote_count,
        }
    }
}

/// Game state as polled by clients. The vote ledger itself is not exposed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameDetails {
    pub id: String,
    pub code: String,
    pub title: String,
    pub status: GameStatus,
    pub time_limit_minutes: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    pub max_votes: usize,
    pub votes_cast: usize,
    pub participants: Vec<ParticipantSummary>,
}

impl From<&Game> for GameDetails {
    fn from(game: &Game) -> Self {
        GameDetails {
            id: game.id.clone(),
            code: game.code.clone(),
            title: game.title.clone(),
            status: game.status,
            time_limit_minutes: game.time_limit_minutes,
            start_time: game.start_time,
            end_time: game.end_time,
            host_id: game.host_id.clone(),
            created_at: game.created_at,
            max_votes: max_votes(game.participant_count()),
            votes_cast: game.votes.len(),
            participants: game.participants.iter().map(ParticipantSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SweepReport {
    pub completed_game_ids: Vec<String>,
    pub failed_game_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Machine-readable ballot rejection, e.g. `TOO_MANY_VOTES`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
