//! Game state machine.
//!
//! ```text
//! WAITING --start--> ACTIVE --complete/expiry--> COMPLETED
//!    |
//!    +--cancel--> CANCELLED
//! ```
//!
//! Every transition validates against the game it is handed before touching
//! it, so a rejected call leaves the game exactly as it was.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::game::{Game, GameStatus};
use crate::models::participant::{Participant, ParticipantStatus};
use crate::models::vote::Vote;
use crate::services::ballot::{validate_ballot, BallotRejection};
use crate::services::errors::game_service_errors::GameServiceError;
use crate::services::ranking::apply_ranks;

pub const MIN_PARTICIPANTS_TO_START: usize = 2;

/// Whether a transition modified the game and needs to be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

pub fn ensure_host(game: &Game, caller: &str, action: &str) -> Result<(), GameServiceError> {
    if game.is_host(caller) {
        Ok(())
    } else {
        Err(GameServiceError::Forbidden(format!(
            "Only the host can {} the game",
            action
        )))
    }
}

fn ensure_active(game: &Game) -> Result<(), GameServiceError> {
    if game.status == GameStatus::Active {
        Ok(())
    } else {
        Err(GameServiceError::InvalidState(format!(
            "Game is not active (status {})",
            game.status
        )))
    }
}

fn voter_for(game: &Game, caller: &str) -> Result<Participant, GameServiceError> {
    game.participant_for_user(caller).cloned().ok_or_else(|| {
        GameServiceError::Forbidden("You are not a participant in this game".to_string())
    })
}

pub fn join(game: &mut Game, user_id: &str) -> Result<Change, GameServiceError> {
    if game.status.is_finished() {
        return Err(GameServiceError::InvalidState(
            "This game has already ended".to_string(),
        ));
    }
    if game.participant_for_user(user_id).is_some() {
        return Err(GameServiceError::Conflict(
            "You have already joined this game".to_string(),
        ));
    }
    game.add_participant(user_id);
    Ok(Change::Applied)
}

pub fn start(
    game: &mut Game,
    caller: &str,
    time_limit_minutes: u32,
    now: DateTime<Utc>,
) -> Result<Change, GameServiceError> {
    ensure_host(game, caller, "start")?;
    if game.status != GameStatus::Waiting {
        return Err(GameServiceError::InvalidState(
            "Game has already started or ended".to_string(),
        ));
    }
    if game.participant_count() < MIN_PARTICIPANTS_TO_START {
        return Err(GameServiceError::PreconditionFailed(format!(
            "At least {} participants are required to start the game",
            MIN_PARTICIPANTS_TO_START
        )));
    }

    game.status = GameStatus::Active;
    game.time_limit_minutes = time_limit_minutes;
    game.start_time = Some(now);
    game.end_time = Some(now + Duration::minutes(i64::from(time_limit_minutes)));
    Ok(Change::Applied)
}

/// Same voter, exactly the targets already in the ledger: a client retry.
fn is_resubmission(game: &Game, voter: &Participant, targets: &[String]) -> bool {
    let recorded: HashSet<&str> = game
        .votes_from(&voter.id)
        .map(|vote| vote.to_participant_id.as_str())
        .collect();
    let submitted: HashSet<&str> = targets.iter().map(String::as_str).collect();
    !recorded.is_empty() && recorded == submitted && submitted.len() == targets.len()
}

pub fn cast_vote(
    game: &mut Game,
    caller: &str,
    targets: &[String],
) -> Result<Change, GameServiceError> {
    ensure_active(game)?;
    let voter = voter_for(game, caller)?;

    match voter.status {
        ParticipantStatus::Joined => {}
        ParticipantStatus::Voted if is_resubmission(game, &voter, targets) => {
            return Ok(Change::Unchanged);
        }
        ParticipantStatus::Voted | ParticipantStatus::Abstained => {
            return Err(BallotRejection::AlreadyVoted.into());
        }
    }

    validate_ballot(game, &voter, targets)?;

    for target in targets {
        if game.has_vote(&voter.id, target) {
            continue;
        }
        game.votes.push(Vote::new(&game.id, &voter.id, target));
        if let Some(recipient) = game.participant_mut(target) {
            recipient.vote_count += 1;
        }
    }
    if let Some(participant) = game.participant_mut(&voter.id) {
        participant.status = ParticipantStatus::Voted;
    }
    Ok(Change::Applied)
}

pub fn skip_vote(game: &mut Game, caller: &str) -> Result<Change, GameServiceError> {
    ensure_active(game)?;
    let voter = voter_for(game, caller)?;
    if voter.has_cast_ballot() {
        return Err(BallotRejection::AlreadyVoted.into());
    }

    if let Some(participant) = game.participant_mut(&voter.id) {
        participant.status = ParticipantStatus::Abstained;
    }
    Ok(Change::Applied)
}

/// Closes voting: anyone who has not voted abstains, then ranks are frozen.
pub fn complete(game: &mut Game, now: DateTime<Utc>) -> Result<Change, GameServiceError> {
    ensure_active(game)?;

    for participant in game
        .participants
        .iter_mut()
        .filter(|p| p.status == ParticipantStatus::Joined)
    {
        participant.status = ParticipantStatus::Abstained;
    }
    apply_ranks(&mut game.participants);

    game.status = GameStatus::Completed;
    game.end_time = Some(now);
    Ok(Change::Applied)
}

pub fn cancel(game: &mut Game, caller: &str) -> Result<Change, GameServiceError> {
    ensure_host(game, caller, "cancel")?;
    if game.status != GameStatus::Waiting {
        return Err(GameServiceError::InvalidState(
            "Only games that have not started can be cancelled".to_string(),
        ));
    }
    game.status = GameStatus::Cancelled;
    Ok(Change::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::participant::Rank;
    use rstest::{fixture, rstest};

    const HOST: &str = "user-0";

    fn game_with(count: usize) -> Game {
        let mut game = Game::new(HOST, "Lifecycle", 5);
        for i in 1..count {
            game.add_participant(&format!("user-{}", i));
        }
        game
    }

    fn started(count: usize) -> Game {
        let mut game = game_with(count);
        start(&mut game, HOST, 5, Utc::now()).unwrap();
        game
    }

    fn pid(game: &Game, index: usize) -> String {
        game.participants[index].id.clone()
    }

    fn user(index: usize) -> String {
        format!("user-{}", index)
    }

    #[fixture]
    fn five_player_game() -> Game {
        started(5)
    }

    #[test]
    fn test_start_sets_timing() {
        let mut game = game_with(2);
        let now = Utc::now();

        assert_eq!(start(&mut game, HOST, 10, now).unwrap(), Change::Applied);
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.start_time, Some(now));
        assert_eq!(game.end_time, Some(now + Duration::minutes(10)));
        assert_eq!(game.time_limit_minutes, 10);
    }

    #[test]
    fn test_start_requires_host() {
        let mut game = game_with(3);
        let err = start(&mut game, &user(1), 5, Utc::now()).unwrap_err();

        assert!(matches!(err, GameServiceError::Forbidden(_)));
        assert_eq!(game.status, GameStatus::Waiting);
    }

    #[test]
    fn test_start_requires_two_participants() {
        let mut game = game_with(1);
        let err = start(&mut game, HOST, 5, Utc::now()).unwrap_err();

        assert!(matches!(err, GameServiceError::PreconditionFailed(_)));
        assert!(game.start_time.is_none());
    }

    #[rstest]
    #[case(GameStatus::Active)]
    #[case(GameStatus::Completed)]
    #[case(GameStatus::Cancelled)]
    fn test_start_requires_waiting(#[case] status: GameStatus) {
        let mut game = game_with(3);
        game.status = status;

        let err = start(&mut game, HOST, 5, Utc::now()).unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));
    }

    #[test]
    fn test_join_adds_participant_while_waiting_or_active() {
        let mut game = game_with(1);
        assert_eq!(join(&mut game, "late").unwrap(), Change::Applied);

        game.status = GameStatus::Active;
        assert_eq!(join(&mut game, "later").unwrap(), Change::Applied);
        assert_eq!(game.participant_count(), 3);
    }

    #[test]
    fn test_join_twice_conflicts() {
        let mut game = game_with(2);
        let err = join(&mut game, &user(1)).unwrap_err();

        assert!(matches!(err, GameServiceError::Conflict(_)));
        assert_eq!(game.participant_count(), 2);
    }

    #[rstest]
    #[case(GameStatus::Completed)]
    #[case(GameStatus::Cancelled)]
    fn test_join_finished_game_rejected(#[case] status: GameStatus) {
        let mut game = game_with(2);
        game.status = status;

        let err = join(&mut game, "late").unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));
    }

    #[rstest]
    fn test_single_vote_in_five_player_game(mut five_player_game: Game) {
        let target = pid(&five_player_game, 2);

        cast_vote(&mut five_player_game, &user(1), &[target.clone()]).unwrap();

        let recipient = five_player_game.participant(&target).unwrap();
        assert_eq!(recipient.vote_count, 1);
        assert_eq!(
            five_player_game.participants[1].status,
            ParticipantStatus::Voted
        );
        assert_eq!(five_player_game.votes.len(), 1);
        assert!(five_player_game.has_vote(&pid(&five_player_game, 1), &target));
    }

    #[rstest]
    fn test_second_ballot_is_already_voted(mut five_player_game: Game) {
        let first = pid(&five_player_game, 2);
        let second = pid(&five_player_game, 3);
        cast_vote(&mut five_player_game, &user(1), &[first]).unwrap();

        let err = cast_vote(&mut five_player_game, &user(1), &[second.clone()]).unwrap_err();

        assert!(matches!(
            err,
            GameServiceError::BallotRejected(BallotRejection::AlreadyVoted)
        ));
        assert_eq!(five_player_game.participant(&second).unwrap().vote_count, 0);
        assert_eq!(five_player_game.votes.len(), 1);
    }

    #[rstest]
    fn test_resubmitting_same_ballot_is_noop(mut five_player_game: Game) {
        let target = pid(&five_player_game, 2);
        cast_vote(&mut five_player_game, &user(1), &[target.clone()]).unwrap();
        let before = five_player_game.clone();

        let change = cast_vote(&mut five_player_game, &user(1), &[target]).unwrap();

        assert_eq!(change, Change::Unchanged);
        assert_eq!(five_player_game, before);
    }

    #[test]
    fn test_too_many_votes_in_ten_player_game() {
        let mut game = started(10);
        let targets = vec![pid(&game, 1), pid(&game, 2), pid(&game, 3)];
        let before = game.clone();

        let err = cast_vote(&mut game, HOST, &targets).unwrap_err();

        assert!(matches!(
            err,
            GameServiceError::BallotRejected(BallotRejection::TooManyVotes {
                submitted: 3,
                allowed: 2
            })
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_partial_ballot_never_recorded() {
        let mut game = started(10);
        let targets = vec![pid(&game, 1), "not-a-participant".to_string()];
        let before = game.clone();

        let err = cast_vote(&mut game, HOST, &targets).unwrap_err();

        assert!(matches!(
            err,
            GameServiceError::BallotRejected(BallotRejection::InvalidTarget(_))
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_vote_requires_active_game() {
        let mut game = game_with(3);
        let target = pid(&game, 1);

        let err = cast_vote(&mut game, HOST, &[target]).unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));
    }

    #[rstest]
    fn test_vote_by_outsider_forbidden(mut five_player_game: Game) {
        let target = pid(&five_player_game, 1);

        let err = cast_vote(&mut five_player_game, "stranger", &[target]).unwrap_err();
        assert!(matches!(err, GameServiceError::Forbidden(_)));
    }

    #[rstest]
    fn test_skip_marks_abstained(mut five_player_game: Game) {
        assert_eq!(
            skip_vote(&mut five_player_game, &user(3)).unwrap(),
            Change::Applied
        );
        assert_eq!(
            five_player_game.participants[3].status,
            ParticipantStatus::Abstained
        );

        let err = skip_vote(&mut five_player_game, &user(3)).unwrap_err();
        assert!(matches!(
            err,
            GameServiceError::BallotRejected(BallotRejection::AlreadyVoted)
        ));
    }

    #[test]
    fn test_skip_allowed_with_larger_vote_allowance() {
        let mut game = started(12);
        skip_vote(&mut game, &user(4)).unwrap();

        assert_eq!(game.participants[4].status, ParticipantStatus::Abstained);
    }

    #[rstest]
    fn test_abstainer_cannot_vote_afterwards(mut five_player_game: Game) {
        skip_vote(&mut five_player_game, &user(1)).unwrap();
        let target = pid(&five_player_game, 2);

        let err = cast_vote(&mut five_player_game, &user(1), &[target]).unwrap_err();
        assert!(matches!(
            err,
            GameServiceError::BallotRejected(BallotRejection::AlreadyVoted)
        ));
    }

    #[rstest]
    fn test_complete_forces_abstain_and_ranks_everyone(mut five_player_game: Game) {
        let game = &mut five_player_game;
        // Four ballots land; user-4 never votes.
        let (p0, p1, p2, p4) = (pid(game, 0), pid(game, 1), pid(game, 2), pid(game, 4));
        cast_vote(game, &user(0), &[p1.clone()]).unwrap();
        cast_vote(game, &user(1), &[p0.clone()]).unwrap();
        cast_vote(game, &user(2), &[p1.clone()]).unwrap();
        cast_vote(game, &user(3), &[p4.clone()]).unwrap();
        let now = Utc::now();

        complete(game, now).unwrap();

        assert_eq!(game.status, GameStatus::Completed);
        assert_eq!(game.end_time, Some(now));
        let straggler = game.participant(&p4).unwrap();
        assert_eq!(straggler.status, ParticipantStatus::Abstained);
        assert_eq!(straggler.rank, Some(Rank::F));
        assert!(game.participants.iter().all(|p| p.rank.is_some()));
        assert_eq!(game.participant(&p1).unwrap().rank, Some(Rank::A));
        assert_eq!(game.participant(&p0).unwrap().rank, Some(Rank::B));
        assert_eq!(game.participant(&p2).unwrap().rank, Some(Rank::F));
    }

    #[test]
    fn test_complete_requires_active() {
        let mut game = game_with(3);
        let err = complete(&mut game, Utc::now()).unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));

        let mut game = started(3);
        complete(&mut game, Utc::now()).unwrap();
        let frozen = game.clone();
        let err = complete(&mut game, Utc::now()).unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));
        assert_eq!(game, frozen);
    }

    #[test]
    fn test_cancel_only_from_waiting_by_host() {
        let mut game = game_with(2);
        let err = cancel(&mut game, &user(1)).unwrap_err();
        assert!(matches!(err, GameServiceError::Forbidden(_)));

        cancel(&mut game, HOST).unwrap();
        assert_eq!(game.status, GameStatus::Cancelled);

        let mut game = started(2);
        let err = cancel(&mut game, HOST).unwrap_err();
        assert!(matches!(err, GameServiceError::InvalidState(_)));
    }
}
