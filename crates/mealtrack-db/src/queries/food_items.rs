//! Database query functions for the `food_items` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{FoodItem, NewFoodItem};

/// Insert a new food item row under a meal. `completed` always starts false.
pub async fn insert_food_item(
    pool: &PgPool,
    meal_id: Uuid,
    item: &NewFoodItem<'_>,
) -> Result<FoodItem> {
    let food = sqlx::query_as::<_, FoodItem>(
        "INSERT INTO food_items \
             (meal_id, food_name, calories, carbohydrates, sugars, protein, fat, quantity, unit, week) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(meal_id)
    .bind(item.food_name)
    .bind(item.calories)
    .bind(item.carbohydrates)
    .bind(item.sugars)
    .bind(item.protein)
    .bind(item.fat)
    .bind(item.quantity)
    .bind(item.unit)
    .bind(item.week)
    .fetch_one(pool)
    .await
    .context("failed to insert food item")?;

    Ok(food)
}

/// Fetch a single food item by ID.
pub async fn get_food_item(pool: &PgPool, id: Uuid) -> Result<Option<FoodItem>> {
    let food = sqlx::query_as::<_, FoodItem>("SELECT * FROM food_items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch food item")?;

    Ok(food)
}

/// List all food items for a meal, ordered by creation time.
pub async fn list_food_items_for_meal(pool: &PgPool, meal_id: Uuid) -> Result<Vec<FoodItem>> {
    let foods = sqlx::query_as::<_, FoodItem>(
        "SELECT * FROM food_items WHERE meal_id = $1 ORDER BY created_at ASC",
    )
    .bind(meal_id)
    .fetch_all(pool)
    .await
    .context("failed to list food items for meal")?;

    Ok(foods)
}

/// Mirror a completion flag onto the food item row itself.
///
/// The completion log is the source of truth; this denormalized column
/// exists for read-path convenience and must be written on every toggle.
pub async fn set_food_item_completed(pool: &PgPool, id: Uuid, completed: bool) -> Result<()> {
    let result = sqlx::query("UPDATE food_items SET completed = $1 WHERE id = $2")
        .bind(completed)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update food item completed flag")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("food item {id} not found");
    }

    Ok(())
}

/// Whether a meal has any week-2 food items.
pub async fn meal_has_week_two(pool: &PgPool, meal_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM food_items WHERE meal_id = $1 AND week = 2)",
    )
    .bind(meal_id)
    .fetch_one(pool)
    .await
    .context("failed to check for week-2 food items")?;

    Ok(exists)
}

/// Duplicate a meal's week-1 food items as week-2 rows.
///
/// Returns the number of rows copied. The copies start uncompleted.
pub async fn duplicate_week_one_items(pool: &PgPool, meal_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "INSERT INTO food_items \
             (meal_id, food_name, calories, carbohydrates, sugars, protein, fat, quantity, unit, week) \
         SELECT meal_id, food_name, calories, carbohydrates, sugars, protein, fat, quantity, unit, 2 \
         FROM food_items WHERE meal_id = $1 AND week = 1",
    )
    .bind(meal_id)
    .execute(pool)
    .await
    .context("failed to duplicate week-1 food items")?;

    Ok(result.rows_affected())
}

/// Per-day calorie totals for a plan.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DayCalorieTotal {
    pub day_id: Uuid,
    pub day_of_week: String,
    pub total_calories: i64,
}

/// Sum food-item calories per day across a plan, week 1 rows only (the two
/// weeks of a cycle carry the same items unless a migration diverged them,
/// in which case callers can sum per week separately).
pub async fn plan_calorie_totals(pool: &PgPool, plan_id: Uuid) -> Result<Vec<DayCalorieTotal>> {
    let totals = sqlx::query_as::<_, DayCalorieTotal>(
        "SELECT d.id AS day_id, d.day_of_week, COALESCE(SUM(f.calories), 0)::BIGINT AS total_calories \
         FROM days d \
         LEFT JOIN meals m ON m.day_id = d.id \
         LEFT JOIN food_items f ON f.meal_id = m.id AND f.week = 1 \
         WHERE d.plan_id = $1 \
         GROUP BY d.id, d.day_of_week \
         ORDER BY MIN(d.created_at) ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to sum plan calories")?;

    Ok(totals)
}
