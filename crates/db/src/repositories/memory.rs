use forno_core::menu::MenuItem;

use super::{MenuRepository, RepositoryError};

/// Menu held in process memory. Used by tests and as the degraded-mode
/// fallback when the database cannot be reached at startup: the service keeps
/// serving chat and the tools answer with empty results.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMenuRepository {
    items: Vec<MenuItem>,
}

impl InMemoryMenuRepository {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self { items }
    }
}

#[async_trait::async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn list_all(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        Ok(self.items.clone())
    }

    async fn find_by_name(&self, query: &str) -> Result<Vec<MenuItem>, RepositoryError> {
        let needle = query.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
