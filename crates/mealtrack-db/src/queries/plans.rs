//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Plan;

/// Insert a new template plan row (unowned, immutable after seeding).
pub async fn insert_template_plan(pool: &PgPool, name: &str, description: &str) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (name, description, is_template) \
         VALUES ($1, $2, TRUE) \
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
    .context("failed to insert template plan")?;

    Ok(plan)
}

/// Insert a new user-owned plan row. `start_date` is set to now so the
/// two-week cycle is anchored at creation time.
pub async fn insert_user_plan(
    pool: &PgPool,
    name: &str,
    description: &str,
    owner_id: Uuid,
) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (name, description, owner_id, is_template, start_date) \
         VALUES ($1, $2, $3, FALSE, now()) \
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .context("failed to insert user plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch a plan by ID, restricted to templates.
///
/// Returns `None` both when the ID does not exist and when it refers to a
/// non-template plan -- callers cannot clone user plans by guessing IDs.
pub async fn get_template_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan =
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 AND is_template = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch template plan")?;

    Ok(plan)
}

/// List all template plans, oldest first.
pub async fn list_template_plans(pool: &PgPool) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE is_template = TRUE ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list template plans")?;

    Ok(plans)
}

/// List all plans owned by a user, newest first.
pub async fn list_plans_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans for owner")?;

    Ok(plans)
}

/// List all non-template plans, oldest first. Used by the two-week data
/// migration sweep.
pub async fn list_user_plans(pool: &PgPool) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE is_template = FALSE ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list user plans")?;

    Ok(plans)
}
