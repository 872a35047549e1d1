use std::sync::Arc;

use shared::services::auth_service::AuthService;
use shared::services::game_service::GameService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub game_service: Arc<GameService>,
}
