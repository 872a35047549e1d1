use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lambda_http::tracing::error;
use shared::models::game::responses::ErrorResponse;
use shared::services::errors::{
    auth_service_errors::AuthServiceError, game_service_errors::GameServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    AuthService(AuthServiceError),
    GameService(GameServiceError),
    /// Request body missing, not JSON, or not the expected shape.
    InvalidBody(String),
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status_and_kind().0
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "ValidationError"),

            ApiError::AuthService(AuthServiceError::JwtError(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal")
            }
            ApiError::AuthService(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),

            ApiError::GameService(GameServiceError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            ApiError::GameService(GameServiceError::Forbidden(_)) => {
                (StatusCode::FORBIDDEN, "Forbidden")
            }
            ApiError::GameService(GameServiceError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NotFound")
            }
            ApiError::GameService(GameServiceError::InvalidState(_)) => {
                (StatusCode::CONFLICT, "InvalidState")
            }
            ApiError::GameService(GameServiceError::PreconditionFailed(_)) => {
                (StatusCode::PRECONDITION_FAILED, "PreconditionFailed")
            }
            ApiError::GameService(
                GameServiceError::ValidationError(_) | GameServiceError::BallotRejected(_),
            ) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::GameService(GameServiceError::Conflict(_)) => {
                (StatusCode::CONFLICT, "Conflict")
            }
            ApiError::GameService(GameServiceError::RepositoryError(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {:?}", self);
            "Internal server error".to_string()
        } else {
            match &self {
                ApiError::InvalidBody(msg) => format!("Invalid request body: {}", msg),
                ApiError::AuthService(err) => err.to_string(),
                ApiError::GameService(GameServiceError::BallotRejected(rejection)) => {
                    rejection.to_string()
                }
                ApiError::GameService(err) => err.to_string(),
            }
        };
        let reason = match &self {
            ApiError::GameService(GameServiceError::BallotRejected(rejection)) => {
                Some(rejection.code().to_string())
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: kind.to_string(),
            message,
            reason,
        };
        (status, Json(body)).into_response()
    }
}
