use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not read seed file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse seed file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub orders: usize,
    pub complaints: usize,
    pub policies: usize,
}

#[derive(Debug, Deserialize)]
struct OrderSeed {
    order_id: String,
    items: String,
    status: String,
    delivered_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComplaintSeed {
    order_id: String,
    complaint_type: String,
    resolution: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct PolicyRowSeed {
    policy_id: String,
    scenario: String,
    default_resolution: String,
}

/// Loads `orders.json` / `complaints.json` / `policies.json` from the data
/// dir into the relational store. A missing file is treated as an empty
/// dataset so partial fixture sets still seed.
pub async fn seed_from_dir(pool: &DbPool, data_dir: &Path) -> Result<SeedSummary, SeedError> {
    let orders: Vec<OrderSeed> = load_optional(&data_dir.join("orders.json"))?;
    let complaints: Vec<ComplaintSeed> = load_optional(&data_dir.join("complaints.json"))?;
    let policies: Vec<PolicyRowSeed> = load_optional(&data_dir.join("policies.json"))?;

    let mut tx = pool.begin().await?;

    for order in &orders {
        sqlx::query(
            "INSERT OR REPLACE INTO orders (order_id, items, status, delivered_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&order.order_id)
        .bind(&order.items)
        .bind(&order.status)
        .bind(&order.delivered_at)
        .execute(&mut *tx)
        .await?;
    }

    for complaint in &complaints {
        sqlx::query(
            "INSERT INTO complaints (order_id, complaint_type, resolution, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&complaint.order_id)
        .bind(&complaint.complaint_type)
        .bind(&complaint.resolution)
        .bind(&complaint.created_at)
        .execute(&mut *tx)
        .await?;
    }

    for policy in &policies {
        sqlx::query(
            "INSERT OR REPLACE INTO policies (policy_id, scenario, default_resolution) \
             VALUES (?, ?, ?)",
        )
        .bind(&policy.policy_id)
        .bind(&policy.scenario)
        .bind(&policy.default_resolution)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let summary = SeedSummary {
        orders: orders.len(),
        complaints: complaints.len(),
        policies: policies.len(),
    };
    info!(
        event_name = "db.seed.applied",
        orders = summary.orders,
        complaints = summary.complaints,
        policies = summary.policies,
        "seed dataset applied"
    );
    Ok(summary)
}

/// Seeds only when the orders table is empty, so restarts do not duplicate
/// complaint rows.
pub async fn seed_if_empty(pool: &DbPool, data_dir: &Path) -> Result<SeedSummary, SeedError> {
    let (order_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(pool).await?;
    if order_count > 0 {
        return Ok(SeedSummary::default());
    }
    seed_from_dir(pool, data_dir).await
}

fn load_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, SeedError> {
    if !path.exists() {
        warn!(event_name = "db.seed.missing_file", path = %path.display(), "seed file absent, skipping");
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)
        .map_err(|source| SeedError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| SeedError::Parse { path: path.to_path_buf(), source })
}
