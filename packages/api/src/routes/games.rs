use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lambda_http::tracing::{debug, error};

use crate::{
    error::ApiError,
    middleware::{auth::AuthenticatedUser, json::ApiJson},
    state::AppState,
};
use shared::models::game::requests::{
    CastVoteRequest, CreateGameRequest, JoinGameRequest, StartGameRequest,
};
use shared::models::game::responses::GameDetails;
use shared::models::game::Game;
use shared::services::errors::game_service_errors::GameServiceError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/join", post(join_game))
        .route("/games/{game_id}", get(get_game))
        .route("/games/{game_id}/start", post(start_game))
        .route("/games/{game_id}/vote", post(cast_vote))
        .route("/games/{game_id}/vote/skip", post(skip_vote))
        .route("/games/{game_id}/complete", post(complete_game))
        .route("/games/{game_id}/cancel", post(cancel_game))
}

fn details(game: Game) -> Json<GameDetails> {
    Json(GameDetails::from(&game))
}

fn log_failure(action: &str, user_id: &str, game: &str, err: GameServiceError) -> ApiError {
    let api_error = ApiError::from(err);
    if api_error.status().is_server_error() {
        error!("Failed to {} game {} for {}: {:?}", action, game, user_id, api_error);
    } else {
        debug!("Rejected {} of game {} for {}: {:?}", action, game, user_id, api_error);
    }
    api_error
}

async fn list_games(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<Vec<GameDetails>>, ApiError> {
    let games = state
        .game_service
        .list_games(&authenticated_user.user_id)
        .await
        .map_err(|e| log_failure("list", &authenticated_user.user_id, "*", e))?;
    Ok(Json(games.iter().map(GameDetails::from).collect()))
}

async fn create_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    ApiJson(payload): ApiJson<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameDetails>), ApiError> {
    let game = state
        .game_service
        .create_game(&authenticated_user.user_id, &payload)
        .await
        .map_err(|e| log_failure("create", &authenticated_user.user_id, "-", e))?;
    debug!("Game created: {}", game.id);
    Ok((StatusCode::CREATED, details(game)))
}

async fn join_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    ApiJson(payload): ApiJson<JoinGameRequest>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .join_game(&authenticated_user.user_id, &payload.code)
        .await
        .map(details)
        .map_err(|e| log_failure("join", &authenticated_user.user_id, &payload.code, e))
}

async fn get_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .get_game(&authenticated_user.user_id, &game_id)
        .await
        .map(details)
        .map_err(|e| log_failure("fetch", &authenticated_user.user_id, &game_id, e))
}

async fn start_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
    payload: Option<ApiJson<StartGameRequest>>,
) -> Result<Json<GameDetails>, ApiError> {
    let request = payload.map(|ApiJson(request)| request).unwrap_or_default();
    state
        .game_service
        .start_game(
            &authenticated_user.user_id,
            &game_id,
            request.time_limit_minutes,
        )
        .await
        .map(details)
        .map_err(|e| log_failure("start", &authenticated_user.user_id, &game_id, e))
}

async fn cast_vote(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
    ApiJson(payload): ApiJson<CastVoteRequest>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .cast_vote(&authenticated_user.user_id, &game_id, &payload.targets)
        .await
        .map(details)
        .map_err(|e| log_failure("vote in", &authenticated_user.user_id, &game_id, e))
}

async fn skip_vote(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .skip_vote(&authenticated_user.user_id, &game_id)
        .await
        .map(details)
        .map_err(|e| log_failure("skip vote in", &authenticated_user.user_id, &game_id, e))
}

async fn complete_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .complete_game(&authenticated_user.user_id, &game_id)
        .await
        .map(details)
        .map_err(|e| log_failure("complete", &authenticated_user.user_id, &game_id, e))
}

async fn cancel_game(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetails>, ApiError> {
    state
        .game_service
        .cancel_game(&authenticated_user.user_id, &game_id)
        .await
        .map(details)
        .map_err(|e| log_failure("cancel", &authenticated_user.user_id, &game_id, e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app;
    use crate::state::AppState;
    use shared::config::GameSettings;
    use shared::repositories::in_memory_game_repository::InMemoryGameRepository;
    use shared::services::auth_service::{AuthService, AuthServiceTrait};
    use shared::services::game_service::GameService;

    const SECRET: &str = "route-test-secret";

    fn test_app() -> Router {
        let repository = Arc::new(InMemoryGameRepository::new());
        app(AppState {
            auth_service: Arc::new(AuthService::with_jwt_secret(SECRET.to_string())),
            game_service: Arc::new(GameService::new(repository, GameSettings::default())),
        })
    }

    fn token(user_id: &str) -> String {
        AuthService::with_jwt_secret(SECRET.to_string())
            .generate_token(user_id)
            .unwrap()
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let app = test_app();
        let (status, _) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_games_require_bearer_token() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/games", None, None).await;

        assert_eq!(status, 401);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_full_game_over_http() {
        let app = test_app();

        let (status, created) = call(
            &app,
            "POST",
            "/games",
            Some("host"),
            Some(json!({"title": "Office party"})),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(created["status"], "WAITING");
        let game_id = created["id"].as_str().unwrap().to_string();
        let code = created["code"].as_str().unwrap().to_lowercase();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/games/{}/start", game_id),
            Some("host"),
            None,
        )
        .await;
        assert_eq!(status, 412);
        assert_eq!(body["error"], "PreconditionFailed");

        let (status, joined) = call(
            &app,
            "POST",
            "/games/join",
            Some("guest"),
            Some(json!({"code": code})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(joined["participants"].as_array().unwrap().len(), 2);

        let (status, _) = call(
            &app,
            "GET",
            &format!("/games/{}", game_id),
            Some("stranger"),
            None,
        )
        .await;
        assert_eq!(status, 403);

        let (status, started) = call(
            &app,
            "POST",
            &format!("/games/{}/start", game_id),
            Some("host"),
            Some(json!({"time_limit_minutes": 10})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(started["status"], "ACTIVE");
        assert_eq!(started["time_limit_minutes"], 10);

        let host_pid = started["participants"][0]["id"].as_str().unwrap().to_string();
        let (status, body) = call(
            &app,
            "POST",
            &format!("/games/{}/vote", game_id),
            Some("guest"),
            Some(json!({"targets": [host_pid.clone(), host_pid.clone()]})),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["reason"], "TOO_MANY_VOTES");

        let (status, voted) = call(
            &app,
            "POST",
            &format!("/games/{}/vote", game_id),
            Some("guest"),
            Some(json!({"targets": [host_pid]})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(voted["participants"][0]["vote_count"], 1);
        let guest_pid = voted["participants"][1]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/games/{}/vote/skip", game_id),
            Some("guest"),
            None,
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["reason"], "ALREADY_VOTED");

        let (status, _) = call(
            &app,
            "POST",
            &format!("/games/{}/vote", game_id),
            Some("host"),
            Some(json!({"targets": [guest_pid]})),
        )
        .await;
        assert_eq!(status, 200);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/games/{}/complete", game_id),
            Some("guest"),
            None,
        )
        .await;
        assert_eq!(status, 403);

        let (status, completed) = call(
            &app,
            "POST",
            &format!("/games/{}/complete", game_id),
            Some("host"),
            None,
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(completed["status"], "COMPLETED");
        assert_eq!(completed["participants"][0]["rank"], "A");
        assert_eq!(completed["participants"][1]["rank"], "A");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/games/{}/cancel", game_id),
            Some("host"),
            None,
        )
        .await;
        assert_eq!(status, 409);
        assert_eq!(body["error"], "InvalidState");

        let (status, listed) = call(&app, "GET", "/games", Some("guest"), None).await;
        assert_eq!(status, 200);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    async fn send_raw(
        app: &Router,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (u16, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token("host")));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let app = test_app();
        let (status, body) =
            send_raw(&app, "/games", Some("application/json"), r#"{"title":5}"#).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "ValidationError");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_body_without_content_type_is_validation_error() {
        let app = test_app();
        let (status, body) = send_raw(&app, "/games", None, r#"{"title":"Office"}"#).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let app = test_app();
        let (status, body) = send_raw(
            &app,
            "/games/join",
            Some("application/json"),
            r#"{"code":"#,
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/games/missing", Some("host"), None).await;

        assert_eq!(status, 404);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_join_with_unknown_code() {
        let app = test_app();
        let (status, body) = call(
            &app,
            "POST",
            "/games/join",
            Some("guest"),
            Some(json!({"code": "ZZZZZZ"})),
        )
        .await;

        assert_eq!(status, 404);
        assert_eq!(body["error"], "NotFound");
    }
}
