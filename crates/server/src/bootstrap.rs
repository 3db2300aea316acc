use std::sync::Arc;

use redress_agent::ComplaintAgent;
use redress_core::config::{AppConfig, ConfigError, LoadOptions};
use redress_core::errors::AgentError;
use redress_db::{connect_with_settings, migrations, seed_if_empty, DbPool, SeedError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub agent: Arc<ComplaintAgent>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("database seeding failed: {0}")]
    Seed(#[from] SeedError),
    #[error("agent construction failed: {0}")]
    Agent(#[source] AgentError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let seeded = seed_if_empty(&db_pool, &config.catalog.data_dir).await?;
    info!(
        event_name = "system.bootstrap.seeded",
        orders = seeded.orders,
        complaints = seeded.complaints,
        policies = seeded.policies,
        "seed data applied to empty database"
    );

    let agent = ComplaintAgent::from_config(config.clone(), db_pool.clone())
        .map_err(BootstrapError::Agent)?;

    Ok(Application { config, db_pool, agent: Arc::new(agent) })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use redress_core::config::{ConfigOverrides, LoadOptions};
    use tempfile::TempDir;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str, data_dir: &TempDir) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                oracle_endpoint: Some("https://unit.test".to_string()),
                oracle_api_key: Some("test-key".to_string()),
                oracle_api_version: Some("2024-06-01".to_string()),
                oracle_deployment: Some("gpt-chat".to_string()),
                embeddings_local_model: Some("hash-256".to_string()),
                data_dir: Some(data_dir.path().to_path_buf()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_oracle_credentials() {
        let data_dir = TempDir::new().expect("tempdir");
        let mut options = valid_overrides("sqlite::memory:", &data_dir);
        options.overrides.oracle_api_key = None;

        let result = bootstrap(options).await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("oracle.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_seeds_an_empty_database() {
        let data_dir = TempDir::new().expect("tempdir");
        fs::write(
            data_dir.path().join("orders.json"),
            r#"[{"order_id": "ZOM-1", "items": "Veg Biryani x1", "status": "delivered",
                 "delivered_at": "2025-03-01T12:00:00Z"}]"#,
        )
        .expect("write orders seed");

        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared", &data_dir))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('orders', 'complaints', 'policies')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema present after bootstrap");
        assert_eq!(table_count, 3);

        let (order_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&app.db_pool)
            .await
            .expect("orders seeded");
        assert_eq!(order_count, 1);

        app.db_pool.close().await;
    }
}
