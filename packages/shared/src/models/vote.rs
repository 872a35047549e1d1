use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a game's append-only vote ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub game_id: String,
    pub from_participant_id: String,
    pub to_participant_id: String,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(game_id: &str, from_participant_id: &str, to_participant_id: &str) -> Self {
        Vote {
            game_id: game_id.to_string(),
            from_participant_id: from_participant_id.to_string(),
            to_participant_id: to_participant_id.to_string(),
            cast_at: Utc::now(),
        }
    }

    pub fn is_between(&self, from_participant_id: &str, to_participant_id: &str) -> bool {
        self.from_participant_id == from_participant_id
            && self.to_participant_id == to_participant_id
    }
}
