use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Joined,
    Voted,
    Abstained,
}

/// Letter rank handed out when a game completes. Ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    A,
    B,
    C,
    D,
    F,
}

impl Rank {
    /// Tiers a participant can earn with at least one vote.
    pub const EARNED: [Rank; 4] = [Rank::A, Rank::B, Rank::C, Rank::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::F => "F",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's membership in one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub game_id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub rank: Option<Rank>,
    /// Votes received, only ever incremented while the game is active.
    pub vote_count: u32,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(game_id: &str, user_id: &str) -> Self {
        Participant {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
            status: ParticipantStatus::Joined,
            rank: None,
            vote_count: 0,
            joined_at: Utc::now(),
        }
    }

    pub fn has_cast_ballot(&self) -> bool {
        self.status != ParticipantStatus::Joined
    }
}
