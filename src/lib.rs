pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod episodes;
pub mod error;
pub mod extract;
pub mod mail;
pub mod medications;
pub mod state;
pub mod triggers;
pub mod users;
