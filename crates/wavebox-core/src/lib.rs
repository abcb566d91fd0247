pub mod config;
pub mod platform;
pub mod player;
pub mod state;
