//! The `PlanStore` trait -- the storage interface the clone orchestrator
//! is written against.
//!
//! The production implementation is [`PgPlanStore`] over a `sqlx::PgPool`.
//! The trait exists so the store handle is an explicit constructor
//! argument rather than ambient state, and so tests can substitute a fake
//! store with injected faults (there is no way to make one specific
//! insert fail mid-tree against a real database).

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use mealtrack_db::models::{Day, DayOfWeek, FoodItem, Meal, MealType, NewFoodItem, Plan};
use mealtrack_db::queries::{days, food_items, meals, plans};

/// Storage operations the clone orchestrator needs.
///
/// # Object Safety
///
/// This trait is object-safe so callers can hold `Box<dyn PlanStore>` or
/// `&dyn PlanStore` without committing to a concrete backend.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Fetch a plan by id, restricted to templates.
    async fn get_template_plan(&self, id: Uuid) -> Result<Option<Plan>>;

    /// Insert a new user-owned plan.
    async fn insert_user_plan(
        &self,
        name: &str,
        description: &str,
        owner_id: Uuid,
    ) -> Result<Plan>;

    /// List the days of a plan.
    async fn list_days(&self, plan_id: Uuid) -> Result<Vec<Day>>;

    /// Insert a day under a plan.
    async fn insert_day(
        &self,
        plan_id: Uuid,
        day_of_week: DayOfWeek,
        total_calories: Option<i32>,
    ) -> Result<Day>;

    /// List the meals of a day.
    async fn list_meals(&self, day_id: Uuid) -> Result<Vec<Meal>>;

    /// Insert a meal under a day.
    async fn insert_meal(&self, day_id: Uuid, meal_type: MealType) -> Result<Meal>;

    /// List the food items of a meal.
    async fn list_food_items(&self, meal_id: Uuid) -> Result<Vec<FoodItem>>;

    /// Insert a food item under a meal.
    async fn insert_food_item(&self, meal_id: Uuid, item: &NewFoodItem<'_>) -> Result<FoodItem>;
}

// Compile-time assertion: PlanStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};

/// The PostgreSQL-backed store, delegating to the `mealtrack-db` queries.
#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn get_template_plan(&self, id: Uuid) -> Result<Option<Plan>> {
        plans::get_template_plan(&self.pool, id).await
    }

    async fn insert_user_plan(
        &self,
        name: &str,
        description: &str,
        owner_id: Uuid,
    ) -> Result<Plan> {
        plans::insert_user_plan(&self.pool, name, description, owner_id).await
    }

    async fn list_days(&self, plan_id: Uuid) -> Result<Vec<Day>> {
        days::list_days_for_plan(&self.pool, plan_id).await
    }

    async fn insert_day(
        &self,
        plan_id: Uuid,
        day_of_week: DayOfWeek,
        total_calories: Option<i32>,
    ) -> Result<Day> {
        days::insert_day(&self.pool, plan_id, day_of_week, total_calories).await
    }

    async fn list_meals(&self, day_id: Uuid) -> Result<Vec<Meal>> {
        meals::list_meals_for_day(&self.pool, day_id).await
    }

    async fn insert_meal(&self, day_id: Uuid, meal_type: MealType) -> Result<Meal> {
        meals::insert_meal(&self.pool, day_id, meal_type).await
    }

    async fn list_food_items(&self, meal_id: Uuid) -> Result<Vec<FoodItem>> {
        food_items::list_food_items_for_meal(&self.pool, meal_id).await
    }

    async fn insert_food_item(&self, meal_id: Uuid, item: &NewFoodItem<'_>) -> Result<FoodItem> {
        food_items::insert_food_item(&self.pool, meal_id, item).await
    }
}
