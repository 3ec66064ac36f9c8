//! Generate SQLite fixture databases with random `users`, `tags` and
//! `user_tags` rows.

pub mod config;
pub mod db;
pub mod generator;
pub mod logger;

pub use config::GeneratorConfig;
pub use generator::{GenerationStats, Generator};
