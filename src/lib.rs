pub mod audit;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod notify;
pub mod state;
