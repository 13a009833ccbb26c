//! Database query functions for the `days` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Day, DayOfWeek};

/// Insert a new day row under a plan.
pub async fn insert_day(
    pool: &PgPool,
    plan_id: Uuid,
    day_of_week: DayOfWeek,
    total_calories: Option<i32>,
) -> Result<Day> {
    let day = sqlx::query_as::<_, Day>(
        "INSERT INTO days (plan_id, day_of_week, total_calories) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(day_of_week)
    .bind(total_calories)
    .fetch_one(pool)
    .await
    .context("failed to insert day")?;

    Ok(day)
}

/// Fetch a single day by ID.
pub async fn get_day(pool: &PgPool, id: Uuid) -> Result<Option<Day>> {
    let day = sqlx::query_as::<_, Day>("SELECT * FROM days WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch day")?;

    Ok(day)
}

/// List all days for a plan, ordered by creation time.
pub async fn list_days_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<Day>> {
    let days =
        sqlx::query_as::<_, Day>("SELECT * FROM days WHERE plan_id = $1 ORDER BY created_at ASC")
            .bind(plan_id)
            .fetch_all(pool)
            .await
            .context("failed to list days for plan")?;

    Ok(days)
}

/// Fetch the day of a plan matching a weekday name, if any.
pub async fn get_day_by_weekday(
    pool: &PgPool,
    plan_id: Uuid,
    day_of_week: DayOfWeek,
) -> Result<Option<Day>> {
    let day = sqlx::query_as::<_, Day>(
        "SELECT * FROM days WHERE plan_id = $1 AND day_of_week = $2 \
         ORDER BY created_at ASC LIMIT 1",
    )
    .bind(plan_id)
    .bind(day_of_week)
    .fetch_optional(pool)
    .await
    .context("failed to fetch day by weekday")?;

    Ok(day)
}
