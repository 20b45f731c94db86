use async_trait::async_trait;
use thiserror::Error;

use forno_core::menu::MenuItem;

pub mod memory;
pub mod menu;

pub use memory::InMemoryMenuRepository;
pub use menu::SqlMenuRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Every item in insertion order; empty when the store is unseeded.
    async fn list_all(&self) -> Result<Vec<MenuItem>, RepositoryError>;
    /// Case-insensitive substring match on `name`. No match is an empty vec,
    /// never an error.
    async fn find_by_name(&self, query: &str) -> Result<Vec<MenuItem>, RepositoryError>;
}
