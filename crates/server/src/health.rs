use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use forno_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: Option<DbPool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub menu_store: MenuStoreHealth,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuStoreHealth {
    pub status: &'static str,
    pub detail: String,
    /// Rows in the catalog, when the store answered the probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_items: Option<i64>,
}

pub fn router(db_pool: Option<DbPool>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let menu_store = probe_menu_store(state.db_pool.as_ref()).await;
    let ready = menu_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        menu_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn probe_menu_store(pool: Option<&DbPool>) -> MenuStoreHealth {
    let Some(pool) = pool else {
        return MenuStoreHealth {
            status: "degraded",
            detail: "menu store was unreachable at startup, chat runs without menu data"
                .to_string(),
            menu_items: None,
        };
    };

    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM menu_item").fetch_one(pool).await {
        Ok(count) => MenuStoreHealth {
            status: "ready",
            detail: "menu store reachable".to_string(),
            menu_items: Some(count),
        },
        Err(error) => MenuStoreHealth {
            status: "degraded",
            detail: format!("menu store probe failed: {error}"),
            menu_items: None,
        },
    }
}
