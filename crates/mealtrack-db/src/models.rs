use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Type of a meal within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealType {
    /// All meal types in the order they appear within a day.
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Snack, Self::Dinner];
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snack => "snack",
            Self::Dinner => "dinner",
        };
        f.write_str(s)
    }
}

impl FromStr for MealType {
    type Err = MealTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "snack" => Ok(Self::Snack),
            "dinner" => Ok(Self::Dinner),
            other => Err(MealTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`MealType`] string.
#[derive(Debug, Clone)]
pub struct MealTypeParseError(pub String);

impl fmt::Display for MealTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid meal type: {:?}", self.0)
    }
}

impl std::error::Error for MealTypeParseError {}

// ---------------------------------------------------------------------------

/// Day of the week, stored as its capitalized English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All days in week order, Monday first.
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for DayOfWeek {
    type Err = DayOfWeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Monday" => Ok(Self::Monday),
            "Tuesday" => Ok(Self::Tuesday),
            "Wednesday" => Ok(Self::Wednesday),
            "Thursday" => Ok(Self::Thursday),
            "Friday" => Ok(Self::Friday),
            "Saturday" => Ok(Self::Saturday),
            "Sunday" => Ok(Self::Sunday),
            other => Err(DayOfWeekParseError(other.to_owned())),
        }
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// Error returned when parsing an invalid [`DayOfWeek`] string.
#[derive(Debug, Clone)]
pub struct DayOfWeekParseError(pub String);

impl fmt::Display for DayOfWeekParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day of week: {:?}", self.0)
    }
}

impl std::error::Error for DayOfWeekParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A diet plan -- either an immutable unowned template or a user-owned clone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Option<Uuid>,
    pub is_template: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A day within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Day {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub total_calories: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A meal within a day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub day_id: Uuid,
    pub meal_type: MealType,
    pub created_at: DateTime<Utc>,
}

/// A food item within a meal, carrying its nutrition facts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_name: String,
    pub calories: i32,
    pub carbohydrates: f32,
    pub sugars: f32,
    pub protein: f32,
    pub fat: f32,
    pub quantity: f32,
    pub unit: String,
    pub week: i32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user completion record for a meal slot within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-user completion record for a single food item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_item_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The fields copied or defaulted when inserting a food item.
///
/// Used by the seed path and the clone orchestrator so the long insert
/// signature is spelled once.
#[derive(Debug, Clone)]
pub struct NewFoodItem<'a> {
    pub food_name: &'a str,
    pub calories: i32,
    pub carbohydrates: f32,
    pub sugars: f32,
    pub protein: f32,
    pub fat: f32,
    pub quantity: f32,
    pub unit: &'a str,
    pub week: i32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
