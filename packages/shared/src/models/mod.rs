pub mod auth;
pub mod game;
pub mod participant;
pub mod vote;
