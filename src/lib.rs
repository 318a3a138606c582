// Shared by the server and the cms-tools binaries.
pub mod app;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod newsletter;
pub mod scraper;
pub mod utils;
