pub mod cli;
pub mod config;
pub mod database;
pub mod export;
pub mod launcher;
pub mod models;
pub mod stats;
pub mod tags;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{Item, ItemKind, ItemPayload, Mood};
pub use utils::Profile;
