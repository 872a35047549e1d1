pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::participant::Participant;
use crate::models::vote::Vote;

pub const GAME_CODE_LENGTH: usize = 6;
const GAME_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    Active,
    Completed,
    Cancelled,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "WAITING",
            GameStatus::Active => "ACTIVE",
            GameStatus::Completed => "COMPLETED",
            GameStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Cancelled)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Random join code drawn from `0-9A-Z`.
pub fn generate_game_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GAME_CODE_LENGTH)
        .map(|_| GAME_CODE_ALPHABET[rng.gen_range(0..GAME_CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn normalize_game_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A game session together with its participants and vote ledger.
///
/// The whole record is stored as a single item and every write is conditioned
/// on `version`, which makes each game its own unit of consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub code: String,
    pub title: String,
    pub status: GameStatus,
    pub time_limit_minutes: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// User ids of every participant, kept flat so the store can filter on it.
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub version: u64,
}

impl Game {
    /// Creates a waiting game with the host already seated as its first participant.
    pub fn new(host_id: &str, title: &str, time_limit_minutes: u32) -> Self {
        let mut game = Game {
            id: Uuid::new_v4().to_string(),
            code: generate_game_code(),
            title: title.to_string(),
            status: GameStatus::Waiting,
            time_limit_minutes,
            start_time: None,
            end_time: None,
            host_id: host_id.to_string(),
            created_at: Utc::now(),
            participants: vec![],
            votes: vec![],
            member_ids: vec![],
            version: 0,
        };
        game.add_participant(host_id);
        game
    }

    pub fn regenerate_code(&mut self) {
        self.code = generate_game_code();
    }

    pub fn add_participant(&mut self, user_id: &str) -> &Participant {
        self.participants.push(Participant::new(&self.id, user_id));
        self.member_ids.push(user_id.to_string());
        &self.participants[self.participants.len() - 1]
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.is_host(user_id) || self.participant_for_user(user_id).is_some()
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_mut(&mut self, participant_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == participant_id)
    }

    pub fn participant_for_user(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn votes_from<'a>(&'a self, participant_id: &'a str) -> impl Iterator<Item = &'a Vote> + 'a {
        self.votes
            .iter()
            .filter(move |vote| vote.from_participant_id == participant_id)
    }

    pub fn has_vote(&self, from_participant_id: &str, to_participant_id: &str) -> bool {
        self.votes
            .iter()
            .any(|vote| vote.is_between(from_participant_id, to_participant_id))
    }

    /// True once an active game has run past its end time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == GameStatus::Active && self.end_time.map_or(false, |end| end <= now)
    }
}
