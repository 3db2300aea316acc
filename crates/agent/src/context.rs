use redress_db::{is_safe_select, DbPool, OrderRepository, SqlOrderRepository, ALLOWED_TABLES};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};
use tracing::warn;

use crate::llm::{ChatMessage, ChatOracle};

/// Fetches per-order context: the order summary row and, via the constrained
/// text-to-SQL translator, any prior complaint history.
///
/// Every path here degrades to `None` instead of failing the exchange - a
/// missing summary or history is a valid "not available" state.
pub struct ContextAssembler {
    orders: SqlOrderRepository,
    pool: DbPool,
}

const TEXT_TO_SQL_INSTRUCTIONS: &str = "\
You translate a question into exactly one read-only SQLite SELECT statement.

Schema:
  orders(order_id TEXT PRIMARY KEY, items TEXT, status TEXT, delivered_at TEXT)
  complaints(id INTEGER PRIMARY KEY, order_id TEXT, complaint_type TEXT, resolution TEXT, created_at TEXT)
  policies(policy_id TEXT PRIMARY KEY, scenario TEXT, default_resolution TEXT)

Respond with the SQL statement only: no explanations, no Markdown, no trailing text.";

impl ContextAssembler {
    pub fn new(pool: DbPool) -> Self {
        Self { orders: SqlOrderRepository::new(pool.clone()), pool }
    }

    pub async fn order_summary(&self, order_id: &str) -> Option<String> {
        match self.orders.summary(order_id).await {
            Ok(summary) => summary,
            Err(error) => {
                warn!(
                    event_name = "context.order_summary.degraded",
                    order_id,
                    error = %error,
                    "order lookup failed, continuing without summary"
                );
                None
            }
        }
    }

    /// Asks the oracle for a SELECT answering the complaint-history question,
    /// vets it with the allow-list guard, and runs it. Any rejection or
    /// failure along the way is "no history available", never an error.
    pub async fn complaint_history(
        &self,
        oracle: &dyn ChatOracle,
        order_id: &str,
    ) -> Option<String> {
        let question =
            format!("Find any complaint history related to order_id {order_id}");
        let request =
            [ChatMessage::system(TEXT_TO_SQL_INSTRUCTIONS), ChatMessage::user(question)];

        let raw = match oracle.decide(&request).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "context.text_to_sql.degraded",
                    order_id,
                    error = %error,
                    "text-to-sql oracle call failed, continuing without history"
                );
                return None;
            }
        };

        let sql = raw.replace("SQLQuery:", "").trim().to_string();
        if !is_safe_select(&sql, ALLOWED_TABLES) {
            warn!(
                event_name = "context.text_to_sql.rejected",
                order_id,
                "generated statement failed the safety guard, treating as no history"
            );
            return None;
        }

        match sqlx::query(&sql).fetch_all(&self.pool).await {
            Ok(rows) if rows.is_empty() => None,
            Ok(rows) => Some(render_rows(&rows)),
            Err(error) => {
                warn!(
                    event_name = "context.text_to_sql.query_failed",
                    order_id,
                    error = %error,
                    "generated statement failed to execute, continuing without history"
                );
                None
            }
        }
    }
}

fn render_rows(rows: &[SqliteRow]) -> String {
    rows.iter()
        .map(|row| {
            row.columns()
                .iter()
                .enumerate()
                .map(|(position, column)| {
                    format!("{}: {}", column.name(), render_value(row, position))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// SQLite columns are dynamically typed; try the likely decodings in order.
fn render_value(row: &SqliteRow, position: usize) -> String {
    if let Ok(value) = row.try_get::<Option<String>, _>(position) {
        return value.unwrap_or_else(|| "null".to_string());
    }
    if let Ok(value) = row.try_get::<i64, _>(position) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<f64, _>(position) {
        return value.to_string();
    }
    "?".to_string()
}
