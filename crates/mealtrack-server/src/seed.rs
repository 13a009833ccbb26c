//! Template seeding from TOML definition files.
//!
//! Templates are immutable once created; `mealtrack seed` is the only
//! write path for them. A definition file describes the full tree:
//!
//! ```toml
//! [template]
//! name = "Balanced"
//! description = "A balanced fortnight"
//!
//! [[days]]
//! day = "Monday"
//! total_calories = 1800
//!
//! [[days.meals]]
//! type = "breakfast"
//!
//! [[days.meals.foods]]
//! name = "Oats"
//! calories = 150
//! carbohydrates = 27.0
//! protein = 5.0
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use mealtrack_db::models::{DayOfWeek, MealType, NewFoodItem, Plan};
use mealtrack_db::queries::{days, food_items, meals, plans};

// -----------------------------------------------------------------------
// TOML format types
// -----------------------------------------------------------------------

/// Top-level structure of a template definition file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TemplateToml {
    /// Template metadata.
    pub template: TemplateMeta,
    /// Days within the template.
    #[serde(default)]
    pub days: Vec<DayToml>,
}

/// Template-level metadata in `[template]`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TemplateMeta {
    /// Human-readable template name.
    pub name: String,
    /// Longer description shown in the template gallery.
    #[serde(default)]
    pub description: String,
}

/// A single `[[days]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DayToml {
    /// Capitalized weekday name, e.g. "Monday".
    pub day: DayOfWeek,
    /// Optional calorie target for the day.
    #[serde(default)]
    pub total_calories: Option<i32>,
    /// Meals within the day.
    #[serde(default)]
    pub meals: Vec<MealToml>,
}

/// A single `[[days.meals]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MealToml {
    /// Meal slot: breakfast, lunch, snack, or dinner.
    #[serde(rename = "type")]
    pub meal_type: MealType,
    /// Food items within the meal.
    #[serde(default)]
    pub foods: Vec<FoodToml>,
}

/// A single `[[days.meals.foods]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FoodToml {
    pub name: String,
    pub calories: i32,
    #[serde(default)]
    pub carbohydrates: f32,
    #[serde(default)]
    pub sugars: f32,
    #[serde(default)]
    pub protein: f32,
    #[serde(default)]
    pub fat: f32,
    #[serde(default = "default_quantity")]
    pub quantity: f32,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_quantity() -> f32 {
    1.0
}

fn default_unit() -> String {
    "g".to_string()
}

// -----------------------------------------------------------------------
// Parsing and validation
// -----------------------------------------------------------------------

/// Parse and validate a template definition from TOML text.
pub fn parse_template(toml_str: &str) -> Result<TemplateToml> {
    let template: TemplateToml =
        toml::from_str(toml_str).context("failed to parse template TOML")?;
    validate_template(&template)?;
    Ok(template)
}

/// Structural validation beyond what serde enforces.
fn validate_template(template: &TemplateToml) -> Result<()> {
    if template.template.name.trim().is_empty() {
        bail!("template name must not be empty");
    }

    let mut seen_days = HashSet::new();
    for day in &template.days {
        if !seen_days.insert(day.day) {
            bail!("duplicate day {:?} in template", day.day.to_string());
        }

        let mut seen_meals = HashSet::new();
        for meal in &day.meals {
            if !seen_meals.insert(meal.meal_type) {
                bail!(
                    "duplicate meal type {:?} on {}",
                    meal.meal_type.to_string(),
                    day.day
                );
            }
            for food in &meal.foods {
                if food.name.trim().is_empty() {
                    bail!("food item with empty name on {}", day.day);
                }
                if food.calories < 0 {
                    bail!("food item {:?} has negative calories", food.name);
                }
            }
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Seeding
// -----------------------------------------------------------------------

/// Read a template definition file and insert the full tree.
pub async fn seed_template_from_file(pool: &PgPool, path: &Path) -> Result<Plan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template file {}", path.display()))?;
    let template = parse_template(&contents)?;
    seed_template(pool, &template).await
}

/// Insert a validated template tree. Returns the new template plan.
///
/// Inserts run parent-first (a day before its meals, a meal before its
/// foods); any failure aborts the seed with the partial tree left in
/// place for inspection.
pub async fn seed_template(pool: &PgPool, template: &TemplateToml) -> Result<Plan> {
    let plan = plans::insert_template_plan(
        pool,
        &template.template.name,
        &template.template.description,
    )
    .await?;

    let mut food_count = 0usize;
    for day_toml in &template.days {
        let day = days::insert_day(pool, plan.id, day_toml.day, day_toml.total_calories)
            .await
            .with_context(|| format!("failed to seed {}", day_toml.day))?;

        for meal_toml in &day_toml.meals {
            let meal = meals::insert_meal(pool, day.id, meal_toml.meal_type)
                .await
                .with_context(|| {
                    format!("failed to seed {} {}", day_toml.day, meal_toml.meal_type)
                })?;

            for food_toml in &meal_toml.foods {
                food_items::insert_food_item(
                    pool,
                    meal.id,
                    &NewFoodItem {
                        food_name: &food_toml.name,
                        calories: food_toml.calories,
                        carbohydrates: food_toml.carbohydrates,
                        sugars: food_toml.sugars,
                        protein: food_toml.protein,
                        fat: food_toml.fat,
                        quantity: food_toml.quantity,
                        unit: &food_toml.unit,
                        week: 1,
                    },
                )
                .await
                .with_context(|| format!("failed to seed food item {:?}", food_toml.name))?;
                food_count += 1;
            }
        }
    }

    info!(
        template = %plan.id,
        name = %plan.name,
        days = template.days.len(),
        foods = food_count,
        "template seeded"
    );
    Ok(plan)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
