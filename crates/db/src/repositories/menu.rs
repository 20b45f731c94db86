use forno_core::menu::MenuItem;
use sqlx::Row;

use super::{MenuRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMenuRepository {
    pool: DbPool,
}

impl SqlMenuRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<MenuItem, RepositoryError> {
    Ok(MenuItem {
        id: row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        name: row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ingredients: row
            .try_get("ingredients")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        price_cents: row
            .try_get("price_cents")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl MenuRepository for SqlMenuRepository {
    async fn list_all(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, ingredients, price_cents FROM menu_item ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_item).collect()
    }

    async fn find_by_name(&self, query: &str) -> Result<Vec<MenuItem>, RepositoryError> {
        // SQLite LIKE is case-insensitive for ASCII by default. `%` and `_`
        // in user input are escaped so the query stays a plain substring
        // match.
        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let rows = sqlx::query(
            "SELECT id, name, ingredients, price_cents FROM menu_item \
             WHERE name LIKE '%' || ?1 || '%' ESCAPE '\\' \
             ORDER BY id",
        )
        .bind(escaped)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_item).collect()
    }
}
