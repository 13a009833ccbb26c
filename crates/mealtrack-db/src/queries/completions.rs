//! Database query functions for the `meal_completions` and
//! `food_completions` tables.
//!
//! Both tables carry a UNIQUE constraint on their scope key, and every
//! write is a single `INSERT ... ON CONFLICT DO UPDATE`, so at most one
//! record exists per scope even under concurrent toggles.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DayOfWeek, FoodCompletion, MealCompletion, MealType};

/// Upsert a meal completion record keyed by
/// `(user_id, plan_id, day_of_week, meal_type)`.
///
/// `completed_at` is set to now when completing and cleared when
/// un-completing.
pub async fn upsert_meal_completion(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    day_of_week: DayOfWeek,
    meal_type: MealType,
    completed: bool,
) -> Result<MealCompletion> {
    let record = sqlx::query_as::<_, MealCompletion>(
        "INSERT INTO meal_completions (user_id, plan_id, day_of_week, meal_type, completed, completed_at) \
         VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN now() END) \
         ON CONFLICT (user_id, plan_id, day_of_week, meal_type) \
         DO UPDATE SET completed = EXCLUDED.completed, completed_at = EXCLUDED.completed_at \
         RETURNING *",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(day_of_week)
    .bind(meal_type)
    .bind(completed)
    .fetch_one(pool)
    .await
    .context("failed to upsert meal completion")?;

    Ok(record)
}

/// Fetch a meal completion record by its scope key.
pub async fn get_meal_completion(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    day_of_week: DayOfWeek,
    meal_type: MealType,
) -> Result<Option<MealCompletion>> {
    let record = sqlx::query_as::<_, MealCompletion>(
        "SELECT * FROM meal_completions \
         WHERE user_id = $1 AND plan_id = $2 AND day_of_week = $3 AND meal_type = $4",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(day_of_week)
    .bind(meal_type)
    .fetch_optional(pool)
    .await
    .context("failed to fetch meal completion")?;

    Ok(record)
}

/// Upsert a food completion record keyed by `(user_id, food_item_id)`.
pub async fn upsert_food_completion(
    pool: &PgPool,
    user_id: Uuid,
    food_item_id: Uuid,
    completed: bool,
) -> Result<FoodCompletion> {
    let record = sqlx::query_as::<_, FoodCompletion>(
        "INSERT INTO food_completions (user_id, food_item_id, completed, completed_at) \
         VALUES ($1, $2, $3, CASE WHEN $3 THEN now() END) \
         ON CONFLICT (user_id, food_item_id) \
         DO UPDATE SET completed = EXCLUDED.completed, completed_at = EXCLUDED.completed_at \
         RETURNING *",
    )
    .bind(user_id)
    .bind(food_item_id)
    .bind(completed)
    .fetch_one(pool)
    .await
    .context("failed to upsert food completion")?;

    Ok(record)
}

/// Fetch a food completion record by its scope key.
pub async fn get_food_completion(
    pool: &PgPool,
    user_id: Uuid,
    food_item_id: Uuid,
) -> Result<Option<FoodCompletion>> {
    let record = sqlx::query_as::<_, FoodCompletion>(
        "SELECT * FROM food_completions WHERE user_id = $1 AND food_item_id = $2",
    )
    .bind(user_id)
    .bind(food_item_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch food completion")?;

    Ok(record)
}

/// Count a user's completion records for a single food item.
///
/// Exists for tests asserting the at-most-one-record-per-scope property.
pub async fn count_food_completions(
    pool: &PgPool,
    user_id: Uuid,
    food_item_id: Uuid,
) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM food_completions WHERE user_id = $1 AND food_item_id = $2",
    )
    .bind(user_id)
    .bind(food_item_id)
    .fetch_one(pool)
    .await
    .context("failed to count food completions")?;

    Ok(count.0)
}

/// Whether every food item of a meal is marked complete for a user.
///
/// Items with no completion record count as incomplete. A meal with no
/// items is not considered complete.
pub async fn all_meal_items_completed(pool: &PgPool, user_id: Uuid, meal_id: Uuid) -> Result<bool> {
    let (total, done): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE fc.completed) \
         FROM food_items fi \
         LEFT JOIN food_completions fc \
             ON fc.food_item_id = fi.id AND fc.user_id = $1 \
         WHERE fi.meal_id = $2",
    )
    .bind(user_id)
    .bind(meal_id)
    .fetch_one(pool)
    .await
    .context("failed to check meal item completion")?;

    Ok(total > 0 && total == done)
}
