//! Database query functions for the `meals` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Meal, MealType};

/// Insert a new meal row under a day.
pub async fn insert_meal(pool: &PgPool, day_id: Uuid, meal_type: MealType) -> Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        "INSERT INTO meals (day_id, meal_type) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(day_id)
    .bind(meal_type)
    .fetch_one(pool)
    .await
    .context("failed to insert meal")?;

    Ok(meal)
}

/// Fetch a single meal by ID.
pub async fn get_meal(pool: &PgPool, id: Uuid) -> Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal")?;

    Ok(meal)
}

/// List all meals for a day, ordered by creation time.
pub async fn list_meals_for_day(pool: &PgPool, day_id: Uuid) -> Result<Vec<Meal>> {
    let meals =
        sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE day_id = $1 ORDER BY created_at ASC")
            .bind(day_id)
            .fetch_all(pool)
            .await
            .context("failed to list meals for day")?;

    Ok(meals)
}

/// Fetch the meal of a given type under a day, if any.
pub async fn get_meal_by_type(
    pool: &PgPool,
    day_id: Uuid,
    meal_type: MealType,
) -> Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(
        "SELECT * FROM meals WHERE day_id = $1 AND meal_type = $2 \
         ORDER BY created_at ASC LIMIT 1",
    )
    .bind(day_id)
    .bind(meal_type)
    .fetch_optional(pool)
    .await
    .context("failed to fetch meal by type")?;

    Ok(meal)
}
