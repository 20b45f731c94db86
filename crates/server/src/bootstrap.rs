use std::sync::Arc;

use forno_agent::llm::OpenAiChatModel;
use forno_agent::runtime::AgentRuntime;
use forno_agent::session::SessionStore;
use forno_core::config::{AppConfig, ConfigError, DatabaseConfig, LoadOptions};
use forno_db::repositories::InMemoryMenuRepository;
use forno_db::{connect_with_settings, fixtures, migrations, DbPool, MenuRepository, SqlMenuRepository};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    /// Absent in degraded mode (menu store unreachable at startup).
    pub db_pool: Option<DbPool>,
    pub menu: Arc<dyn MenuRepository>,
    pub agent_runtime: Arc<AgentRuntime>,
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client initialization failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let model = OpenAiChatModel::from_config(&config.llm).map_err(BootstrapError::Llm)?;

    // Menu store failure degrades the service instead of refusing to start:
    // chat keeps working, the tools answer with empty results.
    let (db_pool, menu): (Option<DbPool>, Arc<dyn MenuRepository>) =
        match prepare_menu_store(&config.database).await {
            Ok(pool) => {
                let menu: Arc<dyn MenuRepository> = Arc::new(SqlMenuRepository::new(pool.clone()));
                (Some(pool), menu)
            }
            Err(error) => {
                warn!(
                    event_name = "system.bootstrap.store_degraded",
                    correlation_id = "bootstrap",
                    error = %error,
                    "menu store unavailable, continuing with empty in-memory menu"
                );
                (None, Arc::new(InMemoryMenuRepository::empty()))
            }
        };

    let agent_runtime = Arc::new(AgentRuntime::for_menu(Arc::new(model), menu.clone()));

    Ok(Application {
        config,
        db_pool,
        menu,
        agent_runtime,
        sessions: Arc::new(SessionStore::new()),
    })
}

async fn prepare_menu_store(database: &DatabaseConfig) -> anyhow::Result<DbPool> {
    let pool =
        connect_with_settings(&database.url, database.max_connections, database.timeout_secs)
            .await?;
    migrations::run_pending(&pool).await?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connected and migrations applied"
    );

    // Seeding failure is survivable: the table exists, the catalog is just empty.
    if let Err(error) = fixtures::seed_if_empty(&pool).await {
        warn!(
            event_name = "system.bootstrap.seed_failed",
            correlation_id = "bootstrap",
            error = %error,
            "menu seed failed, continuing with whatever the table holds"
        );
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use forno_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_seeds_menu_on_fresh_database() {
        let app = bootstrap(overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");

        let pool = app.db_pool.clone().expect("pool present");
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_item")
            .fetch_one(&pool)
            .await
            .expect("count seeded rows");
        assert_eq!(count, 7);

        let listed = app.menu.list_all().await.expect("list");
        assert_eq!(listed.len(), 7);
        assert_eq!(listed[0].name, "Calabresa");

        pool.close().await;
    }

    #[tokio::test]
    async fn unreachable_store_degrades_instead_of_failing() {
        let app = bootstrap(overrides("sqlite:///proc/forno/nope/forno.db"))
            .await
            .expect("bootstrap must survive a broken store");

        assert!(app.db_pool.is_none());
        assert!(app.menu.list_all().await.expect("degraded list").is_empty());
    }

    #[tokio::test]
    async fn invalid_config_fails_fast() {
        let result = bootstrap(overrides("postgres://not-sqlite")).await;
        assert!(result.is_err());
    }

    #[test]
    fn default_config_targets_chat_port() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
    }
}
