pub mod app;
pub mod config;
pub mod enrich;
pub mod episode;
pub mod error;
pub mod lookup;
pub mod models;
pub mod resolve;
pub mod tmdb;
