pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{seed_if_empty, SeedOutcome};
pub use repositories::{InMemoryMenuRepository, MenuRepository, RepositoryError, SqlMenuRepository};
