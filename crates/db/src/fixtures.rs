use tracing::info;

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Fixed catalog inserted on first start. Names and prices are part of the
/// compatibility contract with the ordering client.
const SEED_MENU: &[(&str, &str, i64)] = &[
    ("Calabresa", "Molho, queijo, calabresa e cebola", 4000),
    ("Mussarela", "Molho, queijo mussarela e orégano", 3500),
    ("Portuguesa", "Molho, queijo, presunto, ovo, cebola e azeitona", 4500),
    ("Quatro Queijos", "Molho, mussarela, provolone, parmesão e gorgonzola", 5000),
    ("Frango com Catupiry", "Molho, frango desfiado e catupiry original", 4200),
    ("Marguerita", "Molho, mussarela, tomate e manjericão fresco", 3800),
    ("Pepperoni", "Molho, mussarela e fatias de pepperoni", 4800),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { inserted: usize },
    AlreadyPopulated { existing: i64 },
}

/// Inserts the fixed catalog when the menu table is empty. Idempotent: safe to
/// call on every process start.
pub async fn seed_if_empty(pool: &DbPool) -> Result<SeedOutcome, RepositoryError> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_item")
        .fetch_one(pool)
        .await
        .map_err(RepositoryError::Database)?;

    if existing > 0 {
        return Ok(SeedOutcome::AlreadyPopulated { existing });
    }

    let mut tx = pool.begin().await.map_err(RepositoryError::Database)?;
    for (name, ingredients, price_cents) in SEED_MENU.iter().copied() {
        sqlx::query("INSERT INTO menu_item (name, ingredients, price_cents) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(ingredients)
            .bind(price_cents)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::Database)?;
    }
    tx.commit().await.map_err(RepositoryError::Database)?;

    info!(
        event_name = "system.db.menu_seeded",
        inserted = SEED_MENU.len(),
        "menu catalog seeded"
    );
    Ok(SeedOutcome::Seeded { inserted: SEED_MENU.len() })
}
