//! The template-clone orchestrator.
//!
//! Deep-copies a template plan's tree (days -> meals -> food items) into a
//! brand-new plan owned by the requesting user. The copy is best-effort:
//! no transaction spans the tree, each insert is its own atomic unit, and
//! a fault in one branch below the day level is recorded and skipped
//! rather than rolled up. Callers receive the new plan together with the
//! list of branch diagnostics; a non-empty list means partial success.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use mealtrack_db::models::{NewFoodItem, Plan};

use crate::store::PlanStore;

/// Fail-fast failures that abort the whole clone.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("template plan {0} not found")]
    TemplateNotFound(Uuid),

    #[error("failed to look up template plan")]
    TemplateLookupFailed(#[source] anyhow::Error),

    /// The new-plan insert failed. This is the single step after which a
    /// non-retryable partial artifact (an empty plan) may exist.
    #[error("failed to create the cloned plan")]
    CreatePlanFailed(#[source] anyhow::Error),

    #[error("failed to fetch the template's days")]
    FetchDaysFailed(#[source] anyhow::Error),
}

/// A fail-soft diagnostic for one branch of the tree.
///
/// Serializes to the legacy wire shape, e.g.
/// `{"type": "meal", "templateMealId": "...", "error": "..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BranchError {
    /// Inserting the cloned day failed; the whole day subtree was skipped.
    Day {
        #[serde(rename = "templateDayId")]
        template_day_id: Uuid,
        error: String,
    },
    /// Fetching the template day's meals failed; the day subtree was
    /// skipped (the cloned day row itself exists).
    Meals {
        #[serde(rename = "templateDayId")]
        template_day_id: Uuid,
        error: String,
    },
    /// Inserting a cloned meal failed; that meal's subtree was skipped.
    Meal {
        #[serde(rename = "templateMealId")]
        template_meal_id: Uuid,
        error: String,
    },
    /// Fetching a template meal's food items failed.
    Foods {
        #[serde(rename = "templateMealId")]
        template_meal_id: Uuid,
        error: String,
    },
    /// Inserting one cloned food item failed.
    Food {
        #[serde(rename = "templateFoodId")]
        template_food_id: Uuid,
        error: String,
    },
}

impl BranchError {
    /// The wire-level `type` discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Day { .. } => "day",
            Self::Meals { .. } => "meals",
            Self::Meal { .. } => "meal",
            Self::Foods { .. } => "foods",
            Self::Food { .. } => "food",
        }
    }
}

/// Result of a clone: the new plan plus any branch diagnostics.
#[derive(Debug)]
pub struct CloneOutcome {
    pub plan: Plan,
    pub errors: Vec<BranchError>,
}

impl CloneOutcome {
    /// True when at least one branch of the tree failed to copy.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Clone a template plan's full tree into a new plan owned by
/// `requesting_user`.
///
/// Preconditions fail fast with a [`CloneError`]; everything below the day
/// level is fail-soft and collected into the outcome's error list. A
/// template with zero days clones successfully to an empty plan.
pub async fn clone_template(
    store: &dyn PlanStore,
    template_id: Uuid,
    requesting_user: Uuid,
) -> Result<CloneOutcome, CloneError> {
    // 1. The source must exist and be a template.
    let template = store
        .get_template_plan(template_id)
        .await
        .map_err(CloneError::TemplateLookupFailed)?
        .ok_or(CloneError::TemplateNotFound(template_id))?;

    info!(
        template = %template_id,
        user = %requesting_user,
        "cloning template plan"
    );

    // 2. Create the user-owned plan row.
    let plan = store
        .insert_user_plan(&template.name, &template.description, requesting_user)
        .await
        .map_err(CloneError::CreatePlanFailed)?;

    // 3. Read the template's days. Zero days is a valid (empty) template.
    let template_days = store
        .list_days(template_id)
        .await
        .map_err(CloneError::FetchDaysFailed)?;

    let mut errors = Vec::new();

    // 4. Copy each day subtree independently.
    for template_day in &template_days {
        let day = match store
            .insert_day(plan.id, template_day.day_of_week, template_day.total_calories)
            .await
        {
            Ok(day) => day,
            Err(err) => {
                warn!(template_day = %template_day.id, error = %err, "day clone failed");
                errors.push(BranchError::Day {
                    template_day_id: template_day.id,
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        let template_meals = match store.list_meals(template_day.id).await {
            Ok(meals) => meals,
            Err(err) => {
                warn!(template_day = %template_day.id, error = %err, "meal fetch failed");
                errors.push(BranchError::Meals {
                    template_day_id: template_day.id,
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        for template_meal in &template_meals {
            let meal = match store.insert_meal(day.id, template_meal.meal_type).await {
                Ok(meal) => meal,
                Err(err) => {
                    warn!(template_meal = %template_meal.id, error = %err, "meal clone failed");
                    errors.push(BranchError::Meal {
                        template_meal_id: template_meal.id,
                        error: format!("{err:#}"),
                    });
                    continue;
                }
            };

            let template_foods = match store.list_food_items(template_meal.id).await {
                Ok(foods) => foods,
                Err(err) => {
                    warn!(template_meal = %template_meal.id, error = %err, "food fetch failed");
                    errors.push(BranchError::Foods {
                        template_meal_id: template_meal.id,
                        error: format!("{err:#}"),
                    });
                    continue;
                }
            };

            for template_food in &template_foods {
                // Nutrition fields are copied; the completion flag always
                // starts false on the clone.
                let new_item = NewFoodItem {
                    food_name: &template_food.food_name,
                    calories: template_food.calories,
                    carbohydrates: template_food.carbohydrates,
                    sugars: template_food.sugars,
                    protein: template_food.protein,
                    fat: template_food.fat,
                    quantity: template_food.quantity,
                    unit: &template_food.unit,
                    week: template_food.week,
                };
                if let Err(err) = store.insert_food_item(meal.id, &new_item).await {
                    warn!(template_food = %template_food.id, error = %err, "food clone failed");
                    errors.push(BranchError::Food {
                        template_food_id: template_food.id,
                        error: format!("{err:#}"),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        info!(plan = %plan.id, days = template_days.len(), "clone complete");
    } else {
        warn!(
            plan = %plan.id,
            error_count = errors.len(),
            "clone completed partially"
        );
    }

    Ok(CloneOutcome { plan, errors })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
