use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::game::{Game, GameStatus};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::GameRepository;

#[derive(Default)]
struct Inner {
    games: HashMap<String, Game>,
    /// Join code to game id.
    codes: HashMap<String, String>,
}

/// Process-local store with the same uniqueness and version checks as the
/// DynamoDB tables. Used by tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryGameRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.codes.contains_key(&game.code) {
            return Err(GameRepositoryError::CodeTaken(game.code.clone()));
        }
        inner.codes.insert(game.code.clone(), game.id.clone());
        inner.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self.inner.read().await.games.get(game_id).cloned())
    }

    async fn get_game_by_code(&self, code: &str) -> Result<Option<Game>, GameRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .codes
            .get(code)
            .and_then(|game_id| inner.games.get(game_id))
            .cloned())
    }

    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let mut inner = self.inner.write().await;
        let stored_version = inner.games.get(&game.id).map(|stored| stored.version);
        if stored_version != Some(expected_version) {
            return Err(GameRepositoryError::VersionConflict);
        }
        inner.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn list_games_for_user(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
        let inner = self.inner.read().await;
        let mut games: Vec<Game> = inner
            .games
            .values()
            .filter(|game| game.host_id == user_id || game.member_ids.iter().any(|m| m == user_id))
            .cloned()
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(games)
    }

    async fn list_active_games(&self) -> Result<Vec<Game>, GameRepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .games
            .values()
            .filter(|game| game.status == GameStatus::Active)
            .cloned()
            .collect())
    }
}
