use async_trait::async_trait;
use sqlx::Row;
use thiserror::Error;

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only order lookup. The agent only ever needs the formatted
/// one-line projection, so that is the whole contract.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Formatted summary for an exact order id, or `None` when unknown.
    async fn summary(&self, order_id: &str) -> Result<Option<String>, RepositoryError>;
}

#[derive(Clone)]
pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn summary(&self, order_id: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query(
            "SELECT order_id, items, status, delivered_at FROM orders WHERE order_id = ?",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order_id: String = row.try_get("order_id")?;
        let items: String = row.try_get("items")?;
        let status: String = row.try_get("status")?;
        let delivered_at: Option<String> = row.try_get("delivered_at")?;

        Ok(Some(format!(
            "Order {order_id} | items: {items} | status: {status} | delivered_at: {}",
            delivered_at.as_deref().unwrap_or("unknown")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{OrderRepository, SqlOrderRepository};
    use crate::{connect_with_settings, migrations};

    async fn seeded_pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        sqlx::query(
            "INSERT INTO orders (order_id, items, status, delivered_at) \
             VALUES ('ZOM-123', 'Paneer Tikka x1', 'delivered', '2025-01-12T19:04:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert order");
        pool
    }

    #[tokio::test]
    async fn known_order_formats_fixed_projection() {
        let pool = seeded_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let summary = repo.summary("ZOM-123").await.expect("query").expect("present");
        assert_eq!(
            summary,
            "Order ZOM-123 | items: Paneer Tikka x1 | status: delivered | \
             delivered_at: 2025-01-12T19:04:00Z"
        );
        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_order_is_absent_not_an_error() {
        let pool = seeded_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let summary = repo.summary("ZOM-999").await.expect("query");
        assert_eq!(summary, None);
        pool.close().await;
    }

    #[tokio::test]
    async fn null_delivered_at_renders_as_unknown() {
        let pool = seeded_pool().await;
        sqlx::query(
            "INSERT INTO orders (order_id, items, status, delivered_at) \
             VALUES ('ZOM-124', 'Dal Makhani x2', 'in_transit', NULL)",
        )
        .execute(&pool)
        .await
        .expect("insert order");

        let repo = SqlOrderRepository::new(pool.clone());
        let summary = repo.summary("ZOM-124").await.expect("query").expect("present");
        assert!(summary.ends_with("delivered_at: unknown"));
        pool.close().await;
    }
}
