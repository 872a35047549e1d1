//! Turns received-vote tallies into letter ranks.
//!
//! Scores are normalized against the best tally in the game, so the tiers stay
//! meaningful however the votes cluster:
//!
//! | share of top tally | rank |
//! |--------------------|------|
//! | >= 67%             | A    |
//! | >= 33%             | B    |
//! | >= 24%             | C    |
//! | > 0%               | D    |
//! | no votes/abstained | F    |
//!
//! Afterwards the populated tiers are pulled up so no vacant tier sits above
//! them (`{B, D}` becomes `{A, B}`). F is never promoted.

use std::collections::{BTreeSet, HashMap};

use crate::models::participant::{Participant, ParticipantStatus, Rank};

const A_THRESHOLD: u64 = 67;
const B_THRESHOLD: u64 = 33;
const C_THRESHOLD: u64 = 24;

/// Rank before gap closing. Percentages are compared in integers so 2 of 3
/// votes (66.6%) stays a B.
pub fn initial_rank(participant: &Participant, max_vote_count: u32) -> Rank {
    if participant.status == ParticipantStatus::Abstained
        || participant.vote_count == 0
        || max_vote_count == 0
    {
        return Rank::F;
    }

    let share = u64::from(participant.vote_count) * 100;
    let max = u64::from(max_vote_count);
    if share >= A_THRESHOLD * max {
        Rank::A
    } else if share >= B_THRESHOLD * max {
        Rank::B
    } else if share >= C_THRESHOLD * max {
        Rank::C
    } else {
        Rank::D
    }
}

pub fn close_gaps(ranks: &mut [Rank]) {
    let populated: BTreeSet<Rank> = ranks.iter().copied().filter(|r| *r != Rank::F).collect();
    let promotions: HashMap<Rank, Rank> = populated.into_iter().zip(Rank::EARNED).collect();

    for rank in ranks.iter_mut() {
        if let Some(promoted) = promotions.get(rank) {
            *rank = *promoted;
        }
    }
}

/// Final ranks, index-aligned with `participants`.
pub fn assign_ranks(participants: &[Participant]) -> Vec<Rank> {
    let max_vote_count = participants
        .iter()
        .map(|p| p.vote_count)
        .max()
        .unwrap_or(0);

    let mut ranks: Vec<Rank> = participants
        .iter()
        .map(|p| initial_rank(p, max_vote_count))
        .collect();
    close_gaps(&mut ranks);
    ranks
}

pub fn apply_ranks(participants: &mut [Participant]) {
    let ranks = assign_ranks(participants);
    for (participant, rank) in participants.iter_mut().zip(ranks) {
        participant.rank = Some(rank);
    }
}
