use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error};

mod sweeper;

use shared::config::AppConfig;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::services::game_service::GameService;
use sweeper::Sweeper;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let app_config = AppConfig::from_env()?;
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let repository = Arc::new(DynamoDbGameRepository::new(client, &app_config));
    let sweeper = Sweeper::new(GameService::new(repository, app_config.game));

    run(service_fn(
        move |event: lambda_runtime::LambdaEvent<serde_json::Value>| {
            let sweeper = sweeper.clone();
            async move { sweeper.process_event(event).await }
        },
    ))
    .await
}
