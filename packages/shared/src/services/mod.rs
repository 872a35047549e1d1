pub mod auth_service;
pub mod ballot;
pub mod errors;
pub mod game_service;
pub mod lifecycle;
pub mod ranking;
