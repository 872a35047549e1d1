use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::GameSettings;
use crate::models::game::requests::CreateGameRequest;
use crate::models::game::responses::SweepReport;
use crate::models::game::{normalize_game_code, Game};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::GameRepository;
use crate::services::errors::game_service_errors::GameServiceError;
use crate::services::lifecycle::{self, Change};

pub const MAX_TITLE_LENGTH: usize = 100;

#[derive(Clone)]
pub struct GameService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    settings: GameSettings,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>, settings: GameSettings) -> Self {
        GameService {
            repository,
            settings,
        }
    }

    pub async fn create_game(
        &self,
        caller: &str,
        request: &CreateGameRequest,
    ) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let title = validate_title(&request.title)?;
        let time_limit = self.resolve_time_limit(request.time_limit_minutes)?;

        let mut game = Game::new(caller, &title, time_limit);
        for attempt in 1..=self.settings.max_write_attempts {
            match self.repository.create_game(&game).await {
                Ok(()) => {
                    info!(
                        "Created game {} with code {} for host {}",
                        game.id, game.code, caller
                    );
                    return Ok(game);
                }
                Err(GameRepositoryError::CodeTaken(code)) => {
                    debug!("Game code {} taken on attempt {}, drawing another", code, attempt);
                    game.regenerate_code();
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!("Could not reserve a unique game code for host {}", caller);
        Err(GameServiceError::Conflict(
            "Could not allocate a unique game code".to_string(),
        ))
    }

    pub async fn join_game(&self, caller: &str, code: &str) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let code = normalize_game_code(code);
        if code.is_empty() {
            return Err(GameServiceError::ValidationError(
                "Game code is required".to_string(),
            ));
        }

        let game = self
            .repository
            .get_game_by_code(&code)
            .await?
            .ok_or_else(|| GameServiceError::NotFound(format!("No game with code {}", code)))?;

        let (game, _) = self
            .update_with(&game.id, |game| lifecycle::join(game, caller))
            .await?;
        info!("User {} joined game {}", caller, game.id);
        Ok(game)
    }

    pub async fn get_game(&self, caller: &str, game_id: &str) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let game = self.load(game_id).await?;
        if !game.is_member(caller) {
            return Err(GameServiceError::Forbidden(
                "You are not a member of this game".to_string(),
            ));
        }
        Ok(game)
    }

    /// Games the caller hosts or plays in, newest first.
    pub async fn list_games(&self, caller: &str) -> Result<Vec<Game>, GameServiceError> {
        require_caller(caller)?;
        Ok(self.repository.list_games_for_user(caller).await?)
    }

    pub async fn start_game(
        &self,
        caller: &str,
        game_id: &str,
        time_limit_minutes: Option<u32>,
    ) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        if let Some(requested) = time_limit_minutes {
            self.resolve_time_limit(Some(requested))?;
        }

        let (game, _) = self
            .update_with(game_id, |game| {
                let time_limit = time_limit_minutes.unwrap_or(game.time_limit_minutes);
                lifecycle::start(game, caller, time_limit, Utc::now())
            })
            .await?;
        info!(
            "Game {} started by {} with {} participants, ends at {:?}",
            game.id,
            caller,
            game.participant_count(),
            game.end_time
        );
        Ok(game)
    }

    pub async fn cast_vote(
        &self,
        caller: &str,
        game_id: &str,
        targets: &[String],
    ) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let (game, change) = self
            .update_with(game_id, |game| lifecycle::cast_vote(game, caller, targets))
            .await?;
        match change {
            Change::Applied => info!(
                "User {} cast {} vote(s) in game {}",
                caller,
                targets.len(),
                game_id
            ),
            Change::Unchanged => debug!("Ignoring repeated ballot from {} in game {}", caller, game_id),
        }
        Ok(game)
    }

    pub async fn skip_vote(&self, caller: &str, game_id: &str) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let (game, _) = self
            .update_with(game_id, |game| lifecycle::skip_vote(game, caller))
            .await?;
        info!("User {} abstained in game {}", caller, game_id);
        Ok(game)
    }

    pub async fn complete_game(
        &self,
        caller: &str,
        game_id: &str,
    ) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let (game, _) = self
            .update_with(game_id, |game| {
                lifecycle::ensure_host(game, caller, "complete")?;
                lifecycle::complete(game, Utc::now())
            })
            .await?;
        info!("Game {} completed by host {}", game_id, caller);
        Ok(game)
    }

    pub async fn cancel_game(&self, caller: &str, game_id: &str) -> Result<Game, GameServiceError> {
        require_caller(caller)?;
        let (game, _) = self
            .update_with(game_id, |game| lifecycle::cancel(game, caller))
            .await?;
        info!("Game {} cancelled by host {}", game_id, caller);
        Ok(game)
    }

    pub async fn sweep_expired_games(&self) -> Result<SweepReport, GameServiceError> {
        self.sweep_expired_games_at(Utc::now()).await
    }

    /// Completes every active game whose end time is at or before `now`.
    ///
    /// A game that finishes some other way between the scan and its update is
    /// skipped. Per-game failures are reported rather than aborting the sweep.
    pub async fn sweep_expired_games_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, GameServiceError> {
        let expired: Vec<Game> = self
            .repository
            .list_active_games()
            .await?
            .into_iter()
            .filter(|game| game.is_expired(now))
            .collect();
        debug!("Found {} expired games", expired.len());

        let mut report = SweepReport::default();
        for game in expired {
            let result = self
                .update_with(&game.id, |game| {
                    if game.is_expired(now) {
                        lifecycle::complete(game, now)
                    } else {
                        Ok(Change::Unchanged)
                    }
                })
                .await;

            match result {
                Ok((_, Change::Applied)) => {
                    info!("Completed expired game {}", game.id);
                    report.completed_game_ids.push(game.id);
                }
                Ok((_, Change::Unchanged)) => {
                    debug!("Game {} already left the active state", game.id);
                }
                Err(err) => {
                    error!("Failed to complete expired game {}: {}", game.id, err);
                    report.failed_game_ids.push(game.id);
                }
            }
        }

        Ok(report)
    }

    async fn load(&self, game_id: &str) -> Result<Game, GameServiceError> {
        self.repository
            .get_game(game_id)
            .await?
            .ok_or_else(|| GameServiceError::NotFound(format!("Game {} not found", game_id)))
    }

    /// Loads the game, applies `transition` and writes it back conditioned on
    /// the version that was read. Lost races reload and re-apply.
    async fn update_with<F>(
        &self,
        game_id: &str,
        mut transition: F,
    ) -> Result<(Game, Change), GameServiceError>
    where
        F: FnMut(&mut Game) -> Result<Change, GameServiceError> + Send,
    {
        for attempt in 1..=self.settings.max_write_attempts {
            let mut game = self.load(game_id).await?;
            let expected_version = game.version;

            if transition(&mut game)? == Change::Unchanged {
                return Ok((game, Change::Unchanged));
            }
            game.version = expected_version + 1;

            match self.repository.update_game(&game, expected_version).await {
                Ok(()) => return Ok((game, Change::Applied)),
                Err(GameRepositoryError::VersionConflict) => {
                    debug!(
                        "Version conflict on game {} at version {} (attempt {})",
                        game_id, expected_version, attempt
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(
            "Giving up on game {} after {} conflicting writes",
            game_id, self.settings.max_write_attempts
        );
        Err(GameServiceError::Conflict(
            "The game was modified concurrently, please retry".to_string(),
        ))
    }

    fn resolve_time_limit(&self, requested: Option<u32>) -> Result<u32, GameServiceError> {
        let time_limit = requested.unwrap_or(self.settings.default_time_limit_minutes);
        if time_limit == 0 || time_limit > self.settings.max_time_limit_minutes {
            return Err(GameServiceError::ValidationError(format!(
                "Time limit must be between 1 and {} minutes",
                self.settings.max_time_limit_minutes
            )));
        }
        Ok(time_limit)
    }
}

fn require_caller(caller: &str) -> Result<(), GameServiceError> {
    if caller.trim().is_empty() {
        Err(GameServiceError::Unauthorized)
    } else {
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<String, GameServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(GameServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(GameServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}
