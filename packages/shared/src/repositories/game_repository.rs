use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::debug;

use crate::config::AppConfig;
use crate::models::game::{Game, GameStatus};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Stores a new game and reserves its join code. Fails with
    /// [`GameRepositoryError::CodeTaken`] when the code is in use.
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError>;

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError>;

    async fn get_game_by_code(&self, code: &str) -> Result<Option<Game>, GameRepositoryError>;

    /// Replaces the stored game only if it is still at `expected_version`.
    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError>;

    /// Games the user hosts or participates in.
    async fn list_games_for_user(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError>;

    async fn list_active_games(&self) -> Result<Vec<Game>, GameRepositoryError>;
}

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub games_table: String,
    pub codes_table: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            games_table: config.games_table.clone(),
            codes_table: config.game_codes_table.clone(),
        }
    }

    async fn scan_games(
        &self,
        filter_expression: &str,
        names: HashMap<String, String>,
        values: HashMap<String, AttributeValue>,
    ) -> Result<Vec<Game>, GameRepositoryError> {
        let mut games = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.games_table)
                .filter_expression(filter_expression)
                .set_expression_attribute_names(Some(names.clone()))
                .set_expression_attribute_values(Some(values.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

            if let Some(items) = output.items {
                for item in items {
                    let game: Game = from_item(item)
                        .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                    games.push(game);
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(games)
    }
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let game_item =
            to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
        let code_item = HashMap::from([
            ("code".to_string(), AttributeValue::S(game.code.clone())),
            ("game_id".to_string(), AttributeValue::S(game.id.clone())),
        ]);

        let reserve_code = Put::builder()
            .table_name(&self.codes_table)
            .set_item(Some(code_item))
            .condition_expression("attribute_not_exists(code)")
            .build()
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;
        let put_game = Put::builder()
            .table_name(&self.games_table)
            .set_item(Some(game_item))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

        let result = self
            .client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(reserve_code).build())
            .transact_items(TransactWriteItem::builder().put(put_game).build())
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                // Game ids are fresh v4 uuids, so a cancelled transaction means the code clashed.
                if service_error.is_transaction_canceled_exception() {
                    debug!("Game code {} already reserved", game.code);
                    Err(GameRepositoryError::CodeTaken(game.code.clone()))
                } else {
                    Err(GameRepositoryError::DynamoDb(
                        DisplayErrorContext(&service_error).to_string(),
                    ))
                }
            }
        }
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.games_table)
            .key("id", AttributeValue::S(game_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        match output.item {
            Some(item) => {
                let game: Game = from_item(item)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(game))
            }
            None => Ok(None),
        }
    }

    async fn get_game_by_code(&self, code: &str) -> Result<Option<Game>, GameRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.codes_table)
            .key("code", AttributeValue::S(code.to_string()))
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        let game_id = output
            .item
            .as_ref()
            .and_then(|item| item.get("game_id"))
            .and_then(|value| value.as_s().ok())
            .cloned();

        match game_id {
            Some(game_id) => self.get_game(&game_id).await,
            None => Ok(None),
        }
    }

    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        let result = self
            .client
            .put_item()
            .table_name(&self.games_table)
            .set_item(Some(item))
            .condition_expression("#version = :expected_version")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(
                ":expected_version",
                AttributeValue::N(expected_version.to_string()),
            )
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    Err(GameRepositoryError::VersionConflict)
                } else {
                    Err(GameRepositoryError::DynamoDb(
                        DisplayErrorContext(&service_error).to_string(),
                    ))
                }
            }
        }
    }

    async fn list_games_for_user(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
        let names = HashMap::from([
            ("#host".to_string(), "host_id".to_string()),
            ("#members".to_string(), "member_ids".to_string()),
        ]);
        let values = HashMap::from([(":user".to_string(), AttributeValue::S(user_id.to_string()))]);

        let mut games = self
            .scan_games("#host = :user OR contains(#members, :user)", names, values)
            .await?;
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(games)
    }

    async fn list_active_games(&self) -> Result<Vec<Game>, GameRepositoryError> {
        let names = HashMap::from([("#status".to_string(), "status".to_string())]);
        let values = HashMap::from([(
            ":status".to_string(),
            AttributeValue::S(GameStatus::Active.as_str().to_string()),
        )]);

        self.scan_games("#status = :status", names, values).await
    }
}
