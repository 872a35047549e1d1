//! Rules a ballot has to satisfy before any of it is recorded.

use std::collections::HashSet;

use crate::models::game::Game;
use crate::models::participant::Participant;

pub const MAX_VOTES_CEILING: usize = 5;

/// Number of targets a voter may pick: 20% of the participants, rounded up,
/// never below 1 and never above [`MAX_VOTES_CEILING`].
pub fn max_votes(participant_count: usize) -> usize {
    participant_count.div_ceil(5).clamp(1, MAX_VOTES_CEILING)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallotRejection {
    EmptyBallot,
    TooManyVotes { submitted: usize, allowed: usize },
    DuplicateVote(String),
    SelfVote,
    InvalidTarget(String),
    AlreadyVoted,
}

impl BallotRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BallotRejection::EmptyBallot => "EMPTY_BALLOT",
            BallotRejection::TooManyVotes { .. } => "TOO_MANY_VOTES",
            BallotRejection::DuplicateVote(_) => "DUPLICATE_VOTE",
            BallotRejection::SelfVote => "SELF_VOTE",
            BallotRejection::InvalidTarget(_) => "INVALID_TARGET",
            BallotRejection::AlreadyVoted => "ALREADY_VOTED",
        }
    }
}

impl std::fmt::Display for BallotRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotRejection::EmptyBallot => write!(f, "At least one vote is required"),
            BallotRejection::TooManyVotes { submitted, allowed } => write!(
                f,
                "You can only vote for up to {} participant{} (got {})",
                allowed,
                if *allowed == 1 { "" } else { "s" },
                submitted
            ),
            BallotRejection::DuplicateVote(target) => {
                write!(f, "Participant {} appears more than once", target)
            }
            BallotRejection::SelfVote => write!(f, "You cannot vote for yourself"),
            BallotRejection::InvalidTarget(target) => {
                write!(f, "Participant {} is not part of this game", target)
            }
            BallotRejection::AlreadyVoted => write!(f, "You have already voted"),
        }
    }
}

impl std::error::Error for BallotRejection {}

/// Checks the shape of `targets` against the game roster. Whether the voter
/// may still vote at all is decided by the caller.
pub fn validate_ballot(
    game: &Game,
    voter: &Participant,
    targets: &[String],
) -> Result<(), BallotRejection> {
    if targets.is_empty() {
        return Err(BallotRejection::EmptyBallot);
    }

    let allowed = max_votes(game.participant_count());
    if targets.len() > allowed {
        return Err(BallotRejection::TooManyVotes {
            submitted: targets.len(),
            allowed,
        });
    }

    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.as_str()) {
            return Err(BallotRejection::DuplicateVote(target.clone()));
        }
    }

    if targets.iter().any(|target| *target == voter.id) {
        return Err(BallotRejection::SelfVote);
    }

    if let Some(stranger) = targets.iter().find(|target| game.participant(target).is_none()) {
        return Err(BallotRejection::InvalidTarget(stranger.clone()));
    }

    Ok(())
}
