//! The completion service: per-user meal and food-item toggles with the
//! cascade rules between them.
//!
//! A meal toggle fans out to its food items; a food toggle re-checks its
//! siblings and rolls the result up to the meal record. The sibling
//! re-check is read-then-write by design (last write wins); the UNIQUE
//! constraints in the store guarantee no duplicate records under race.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use mealtrack_db::models::{DayOfWeek, MealType};
use mealtrack_db::queries::{completions, days, food_items, meals};

/// Mark a meal slot complete or incomplete for a user.
///
/// Upserts the meal completion record, then cascades the flag onto every
/// food item of the matching meal (both the per-user completion record
/// and the denormalized `food_items.completed` column).
///
/// The meal is addressed by `(plan_id, day, meal_type)` rather than meal
/// id because that is the scope the completion record carries; a plan
/// without a matching day or meal still gets its completion record
/// written (the slot may be filled in later).
pub async fn set_meal_completion(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    day: DayOfWeek,
    meal_type: MealType,
    completed: bool,
) -> Result<()> {
    completions::upsert_meal_completion(pool, user_id, plan_id, day, meal_type, completed)
        .await
        .context("failed to record meal completion")?;

    // Cascade onto the meal's food items, when the slot exists.
    let Some(day_row) = days::get_day_by_weekday(pool, plan_id, day).await? else {
        debug!(plan = %plan_id, %day, "no day row for meal completion; nothing to cascade");
        return Ok(());
    };
    let Some(meal) = meals::get_meal_by_type(pool, day_row.id, meal_type).await? else {
        debug!(day = %day_row.id, %meal_type, "no meal row; nothing to cascade");
        return Ok(());
    };

    let items = food_items::list_food_items_for_meal(pool, meal.id).await?;
    for item in &items {
        completions::upsert_food_completion(pool, user_id, item.id, completed)
            .await
            .with_context(|| format!("failed to cascade completion to food item {}", item.id))?;
        food_items::set_food_item_completed(pool, item.id, completed).await?;
    }

    info!(
        user = %user_id,
        plan = %plan_id,
        %day,
        %meal_type,
        completed,
        items = items.len(),
        "meal completion recorded"
    );
    Ok(())
}

/// Mark a single food item complete or incomplete for a user.
///
/// Upserts the per-user completion record, mirrors the flag onto the
/// item's own `completed` column, then re-checks the item's siblings: when
/// every item of the meal is complete the parent meal record is marked
/// complete, otherwise incomplete.
pub async fn set_food_completion(
    pool: &PgPool,
    user_id: Uuid,
    food_item_id: Uuid,
    completed: bool,
) -> Result<()> {
    let Some(item) = food_items::get_food_item(pool, food_item_id).await? else {
        bail!("food item {food_item_id} not found");
    };

    completions::upsert_food_completion(pool, user_id, food_item_id, completed)
        .await
        .context("failed to record food completion")?;
    food_items::set_food_item_completed(pool, food_item_id, completed).await?;

    // Roll the result up to the meal record.
    let Some(meal) = meals::get_meal(pool, item.meal_id).await? else {
        // Orphaned item; the completion record alone is all we can write.
        return Ok(());
    };
    let Some(day) = days::get_day(pool, meal.day_id).await? else {
        return Ok(());
    };

    let all_done = completions::all_meal_items_completed(pool, user_id, meal.id).await?;
    completions::upsert_meal_completion(
        pool,
        user_id,
        day.plan_id,
        day.day_of_week,
        meal.meal_type,
        all_done,
    )
    .await
    .context("failed to roll food completion up to the meal")?;

    info!(
        user = %user_id,
        food_item = %food_item_id,
        completed,
        meal_complete = all_done,
        "food completion recorded"
    );
    Ok(())
}
