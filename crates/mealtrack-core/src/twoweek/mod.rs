//! One-shot data migration from single-week to two-week plans.
//!
//! Adds the `week` column to `food_items` when a pre-migration database
//! lacks it, then sweeps every non-template plan and duplicates each
//! meal's week-1 food items as week-2 rows. Idempotent per
//! `(plan, day, meal_type)` group: groups that already carry week-2 rows
//! are skipped. Like the clone orchestrator, the sweep is fail-soft per
//! group -- one broken group does not stop the rest.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use mealtrack_db::models::{DayOfWeek, MealType};
use mealtrack_db::queries::{days, food_items, meals, plans};

/// What happened to one `(plan, day, meal_type)` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Week-1 rows were duplicated as week-2.
    Success,
    /// The group already had week-2 rows.
    Skipped,
    /// The duplication failed; see `error`.
    Error,
}

/// Per-group outcome of the migration sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOutcome {
    pub plan_id: Uuid,
    pub day: DayOfWeek,
    pub meal_type: MealType,
    pub status: GroupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the two-week migration across all non-template plans.
///
/// Returns one outcome per `(plan, day, meal_type)` group visited.
pub async fn run_two_week_migration(pool: &PgPool) -> Result<Vec<GroupOutcome>> {
    ensure_week_column(pool).await?;

    let user_plans = plans::list_user_plans(pool)
        .await
        .context("failed to list plans for two-week migration")?;

    info!(plans = user_plans.len(), "starting two-week migration sweep");

    let mut outcomes = Vec::new();

    for plan in &user_plans {
        let plan_days = match days::list_days_for_plan(pool, plan.id).await {
            Ok(days) => days,
            Err(err) => {
                warn!(plan = %plan.id, error = %format!("{err:#}"), "day sweep failed");
                continue;
            }
        };

        for day in &plan_days {
            let day_meals = match meals::list_meals_for_day(pool, day.id).await {
                Ok(meals) => meals,
                Err(err) => {
                    warn!(day = %day.id, error = %format!("{err:#}"), "meal sweep failed");
                    continue;
                }
            };

            for meal in &day_meals {
                let outcome = migrate_group(pool, plan.id, day.day_of_week, meal).await;
                outcomes.push(outcome);
            }
        }
    }

    let migrated = outcomes
        .iter()
        .filter(|o| o.status == GroupStatus::Success)
        .count();
    info!(
        groups = outcomes.len(),
        migrated, "two-week migration sweep finished"
    );

    Ok(outcomes)
}

/// Migrate one meal group, converting any error into an `Error` outcome.
async fn migrate_group(
    pool: &PgPool,
    plan_id: Uuid,
    day: DayOfWeek,
    meal: &mealtrack_db::models::Meal,
) -> GroupOutcome {
    let result = async {
        if food_items::meal_has_week_two(pool, meal.id).await? {
            return Ok(GroupStatus::Skipped);
        }
        food_items::duplicate_week_one_items(pool, meal.id).await?;
        Ok::<_, anyhow::Error>(GroupStatus::Success)
    }
    .await;

    match result {
        Ok(status) => GroupOutcome {
            plan_id,
            day,
            meal_type: meal.meal_type,
            status,
            error: None,
        },
        Err(err) => {
            warn!(meal = %meal.id, error = %format!("{err:#}"), "group migration failed");
            GroupOutcome {
                plan_id,
                day,
                meal_type: meal.meal_type,
                status: GroupStatus::Error,
                error: Some(format!("{err:#}")),
            }
        }
    }
}

/// Add the `week` column to `food_items` if a pre-migration schema lacks
/// it. The only schema-altering statement issued outside the embedded
/// migrations.
async fn ensure_week_column(pool: &PgPool) -> Result<()> {
    sqlx::query("ALTER TABLE food_items ADD COLUMN IF NOT EXISTS week INTEGER NOT NULL DEFAULT 1")
        .execute(pool)
        .await
        .context("failed to ensure food_items.week column")?;
    Ok(())
}
