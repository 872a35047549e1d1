use axum::{routing::get, Router};
use lambda_http::{run, tracing, Error};
use std::env::set_var;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use shared::config::AppConfig;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::services::auth_service::AuthService;
use shared::services::game_service::GameService;

pub fn app(app_state: state::AppState) -> Router {
    // ToDo: Tighten this up
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::games::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    let app_config = AppConfig::from_env()?;
    let auth_service = Arc::new(AuthService::from_env()?);

    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);

    let game_repository = Arc::new(DynamoDbGameRepository::new(client, &app_config));
    let game_service = Arc::new(GameService::new(game_repository, app_config.game.clone()));

    tracing::info!(
        "Serving games from {} (codes in {})",
        app_config.games_table,
        app_config.game_codes_table
    );

    let app_state = state::AppState {
        auth_service,
        game_service,
    };

    run(app(app_state)).await
}
