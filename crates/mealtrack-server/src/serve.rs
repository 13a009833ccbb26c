use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use mealtrack_core::clone::{BranchError, CloneError, clone_template};
use mealtrack_core::completion;
use mealtrack_core::schedule;
use mealtrack_core::store::PgPlanStore;
use mealtrack_core::token::{TokenClaims, TokenConfig, validate_token};
use mealtrack_core::twoweek;
use mealtrack_db::models::{Day, DayOfWeek, FoodItem, Meal, MealType, Plan};
use mealtrack_db::queries::{days as day_db, food_items as food_db, meals as meal_db, plans as plan_db};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Validate the `Authorization: Bearer` header and return the claims.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<TokenClaims, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("malformed Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("expected a Bearer token"))?;

    validate_token(&state.tokens, token)
        .map_err(|err| AppError::unauthorized(format!("invalid token: {err}")))
}

/// Like [`authenticate`], but additionally require the admin role.
fn authenticate_admin(state: &AppState, headers: &HeaderMap) -> Result<TokenClaims, AppError> {
    let claims = authenticate(state, headers)?;
    if !claims.is_admin() {
        return Err(AppError::forbidden("admin token required"));
    }
    Ok(claims)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneResponse {
    pub success: bool,
    pub diet_plan_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<BranchError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MealCompletionRequest {
    user_id: Uuid,
    diet_plan_id: Uuid,
    day: DayOfWeek,
    meal_type: MealType,
    completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodCompletionRequest {
    user_id: Uuid,
    food_item_id: Uuid,
    completed: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemView {
    pub id: Uuid,
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
}

impl From<FoodItem> for FoodItemView {
    fn from(item: FoodItem) -> Self {
        Self {
            id: item.id,
            food_name: item.food_name,
            calories: item.calories,
            carbohydrates: item.carbohydrates,
            sugars: item.sugars,
            protein: item.protein,
            fat: item.fat,
            quantity: item.quantity,
            unit: item.unit,
            week: item.week,
            completed: item.completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealView {
    pub id: Uuid,
    pub meal_type: MealType,
    pub food_items: Vec<FoodItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub id: Uuid,
    pub day_of_week: DayOfWeek,
    pub total_calories: Option<i32>,
    pub meals: Vec<MealView>,
}

/// Where the user currently is in the two-week cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSlotView {
    pub week: i32,
    pub day: DayOfWeek,
    pub week_day_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub current: CurrentSlotView,
    pub days: Vec<DayView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAnalytics {
    pub day_id: Uuid,
    pub day: String,
    pub total_calories: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub plan_id: Uuid,
    pub days: Vec<DayAnalytics>,
    pub plan_total: i64,
}

#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    pub success: bool,
    pub results: Vec<twoweek::GroupOutcome>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/templates", get(list_templates))
        .route("/api/plans", get(list_my_plans))
        .route("/api/plans/{id}", get(get_plan_detail))
        .route("/api/plans/{id}/analytics", get(get_plan_analytics))
        .route("/api/clone", post(clone_handler))
        .route("/api/meal-completion", post(meal_completion_handler))
        .route("/api/food-completion", post(food_completion_handler))
        .route("/api/admin/migrate-to-two-week", post(migrate_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("mealtrack serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mealtrack serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn clone_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let template_id = body
        .get("templateId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::bad_request("missing templateId"))?;
    let template_id = Uuid::parse_str(template_id)
        .map_err(|_| AppError::bad_request(format!("invalid templateId: {template_id:?}")))?;

    let store = PgPlanStore::new(state.pool.clone());
    let outcome = clone_template(&store, template_id, claims.user_id)
        .await
        .map_err(|err| match err {
            CloneError::TemplateNotFound(id) => {
                AppError::not_found(format!("template {id} not found"))
            }
            other => AppError::internal(other.into()),
        })?;

    let status = if outcome.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };
    let response = CloneResponse {
        success: true,
        diet_plan_id: outcome.plan.id,
        partial: outcome.is_partial().then_some(true),
        errors: outcome.is_partial().then_some(outcome.errors),
    };

    Ok((status, Json(response)).into_response())
}

async fn meal_completion_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let request: MealCompletionRequest = serde_json::from_value(body)
        .map_err(|err| AppError::bad_request(format!("invalid request body: {err}")))?;

    // The legacy body carries the user id; it must match the token.
    if request.user_id != claims.user_id {
        return Err(AppError::forbidden("userId does not match the bearer token"));
    }

    completion::set_meal_completion(
        &state.pool,
        request.user_id,
        request.diet_plan_id,
        request.day,
        request.meal_type,
        request.completed,
    )
    .await
    .map_err(AppError::internal)?;

    Ok(Json(CompletionResponse {
        success: true,
        message: format!(
            "{} {} marked {}",
            request.day,
            request.meal_type,
            if request.completed { "complete" } else { "incomplete" },
        ),
    })
    .into_response())
}

async fn food_completion_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let request: FoodCompletionRequest = serde_json::from_value(body)
        .map_err(|err| AppError::bad_request(format!("invalid request body: {err}")))?;

    if request.user_id != claims.user_id {
        return Err(AppError::forbidden("userId does not match the bearer token"));
    }

    completion::set_food_completion(
        &state.pool,
        request.user_id,
        request.food_item_id,
        request.completed,
    )
    .await
    .map_err(AppError::internal)?;

    Ok(Json(CompletionResponse {
        success: true,
        message: format!(
            "food item marked {}",
            if request.completed { "complete" } else { "incomplete" },
        ),
    })
    .into_response())
}

async fn migrate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<axum::response::Response, AppError> {
    authenticate_admin(&state, &headers)?;

    let results = twoweek::run_two_week_migration(&state.pool)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(MigrateResponse {
        success: true,
        results,
    })
    .into_response())
}

async fn list_templates(
    State(state): State<AppState>,
) -> Result<axum::response::Response, AppError> {
    let templates = plan_db::list_template_plans(&state.pool)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(templates).into_response())
}

async fn list_my_plans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let plans = plan_db::list_plans_for_owner(&state.pool, claims.user_id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(plans).into_response())
}

/// A plan is visible to its owner and, for templates, to any
/// authenticated user. Anything else reads as not-found so plan IDs
/// cannot be probed.
fn check_plan_visibility(plan: &Plan, claims: &TokenClaims) -> Result<(), AppError> {
    if plan.is_template || plan.owner_id == Some(claims.user_id) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("plan {} not found", plan.id)))
    }
}

async fn get_plan_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let plan = plan_db::get_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    check_plan_visibility(&plan, &claims)?;

    let slot = schedule::current_week_and_day(plan.start_date, Utc::now());
    let current = CurrentSlotView {
        week: slot.week,
        day: slot.day,
        week_day_key: schedule::format_week_day(slot.week, slot.day),
    };

    let day_rows = day_db::list_days_for_plan(&state.pool, plan.id)
        .await
        .map_err(AppError::internal)?;

    let mut days = Vec::with_capacity(day_rows.len());
    for day in day_rows {
        days.push(build_day_view(&state.pool, day).await?);
    }

    Ok(Json(PlanDetailResponse {
        plan,
        current,
        days,
    })
    .into_response())
}

async fn build_day_view(pool: &PgPool, day: Day) -> Result<DayView, AppError> {
    let meal_rows = meal_db::list_meals_for_day(pool, day.id)
        .await
        .map_err(AppError::internal)?;

    let mut meals = Vec::with_capacity(meal_rows.len());
    for meal in meal_rows {
        meals.push(build_meal_view(pool, meal).await?);
    }

    Ok(DayView {
        id: day.id,
        day_of_week: day.day_of_week,
        total_calories: day.total_calories,
        meals,
    })
}

async fn build_meal_view(pool: &PgPool, meal: Meal) -> Result<MealView, AppError> {
    let items = food_db::list_food_items_for_meal(pool, meal.id)
        .await
        .map_err(AppError::internal)?;

    Ok(MealView {
        id: meal.id,
        meal_type: meal.meal_type,
        food_items: items.into_iter().map(FoodItemView::from).collect(),
    })
}

async fn get_plan_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let claims = authenticate(&state, &headers)?;

    let plan = plan_db::get_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    check_plan_visibility(&plan, &claims)?;

    let totals = food_db::plan_calorie_totals(&state.pool, plan.id)
        .await
        .map_err(AppError::internal)?;

    let plan_total = totals.iter().map(|t| t.total_calories).sum();
    let days = totals
        .into_iter()
        .map(|t| DayAnalytics {
            day_id: t.day_id,
            day: t.day_of_week,
            total_calories: t.total_calories,
        })
        .collect();

    Ok(Json(AnalyticsResponse {
        plan_id: plan.id,
        days,
        plan_total,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use mealtrack_core::token::{Role, TokenConfig, generate_token};
    use mealtrack_db::models::{DayOfWeek, MealType, NewFoodItem};
    use mealtrack_db::queries::{days, food_items, meals, plans};
    use mealtrack_test_utils::{create_test_db, drop_test_db};

    use super::AppState;

    fn test_state(pool: PgPool) -> AppState {
        AppState {
            pool,
            tokens: TokenConfig::new(b"serve-test-secret".to_vec()),
        }
    }

    fn user_token(state: &AppState, user_id: Uuid) -> String {
        generate_token(&state.tokens, user_id, Role::User)
    }

    fn admin_token(state: &AppState, user_id: Uuid) -> String {
        generate_token(&state.tokens, user_id, Role::Admin)
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        state: AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let app = super::build_router(state);
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Seed a coffee-and-toast template. Returns (template_id, item count).
    async fn seed_template(pool: &PgPool) -> Uuid {
        let plan = plans::insert_template_plan(pool, "Starter", "Two items")
            .await
            .unwrap();
        let day = days::insert_day(pool, plan.id, DayOfWeek::Monday, Some(1500))
            .await
            .unwrap();
        let meal = meals::insert_meal(pool, day.id, MealType::Breakfast)
            .await
            .unwrap();
        for (name, calories) in [("Coffee", 5), ("Toast", 80)] {
            food_items::insert_food_item(
                pool,
                meal.id,
                &NewFoodItem {
                    food_name: name,
                    calories,
                    carbohydrates: 5.0,
                    sugars: 1.0,
                    protein: 2.0,
                    fat: 1.0,
                    quantity: 1.0,
                    unit: "g",
                    week: 1,
                },
            )
            .await
            .unwrap();
        }
        plan.id
    }

    // -----------------------------------------------------------------------
    // Clone route
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn clone_requires_auth() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());

        let resp = send(
            state,
            "POST",
            "/api/clone",
            None,
            Some(serde_json::json!({"templateId": Uuid::new_v4().to_string()})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn clone_rejects_missing_template_id() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/clone",
            Some(&token),
            Some(serde_json::json!({})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn clone_rejects_malformed_template_id() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/clone",
            Some(&token),
            Some(serde_json::json!({"templateId": "not-a-uuid"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn clone_unknown_template_is_404() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/clone",
            Some(&token),
            Some(serde_json::json!({"templateId": Uuid::new_v4().to_string()})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn clone_happy_path_returns_plan_id() {
        let (pool, db_name) = create_test_db().await;
        let template_id = seed_template(&pool).await;
        let state = test_state(pool.clone());
        let user = Uuid::new_v4();
        let token = user_token(&state, user);

        let resp = send(
            state,
            "POST",
            "/api/clone",
            Some(&token),
            Some(serde_json::json!({"templateId": template_id.to_string()})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert!(json.get("partial").is_none(), "full success has no partial flag");

        let new_plan_id: Uuid = json["dietPlanId"].as_str().unwrap().parse().unwrap();
        let plan = plans::get_plan(&pool, new_plan_id).await.unwrap().unwrap();
        assert_eq!(plan.owner_id, Some(user));
        assert!(!plan.is_template);

        let cloned_days = days::list_days_for_plan(&pool, new_plan_id).await.unwrap();
        assert_eq!(cloned_days.len(), 1);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Completion routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn meal_completion_rejects_foreign_user_id() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/meal-completion",
            Some(&token),
            Some(serde_json::json!({
                "userId": Uuid::new_v4().to_string(),
                "dietPlanId": Uuid::new_v4().to_string(),
                "day": "Monday",
                "mealType": "breakfast",
                "completed": true,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn meal_completion_rejects_bad_body() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/meal-completion",
            Some(&token),
            Some(serde_json::json!({"day": "Funday"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn meal_completion_happy_path() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let user = Uuid::new_v4();
        let plan = plans::insert_user_plan(&pool, "mine", "", user).await.unwrap();
        let token = user_token(&state, user);

        let resp = send(
            state,
            "POST",
            "/api/meal-completion",
            Some(&token),
            Some(serde_json::json!({
                "userId": user.to_string(),
                "dietPlanId": plan.id.to_string(),
                "day": "Monday",
                "mealType": "breakfast",
                "completed": true,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert!(json["message"].as_str().unwrap().contains("complete"));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn food_completion_mirrors_item_flag() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());

        let user = Uuid::new_v4();
        let plan = plans::insert_user_plan(&pool, "mine", "", user).await.unwrap();
        let day = days::insert_day(&pool, plan.id, DayOfWeek::Monday, None)
            .await
            .unwrap();
        let meal = meals::insert_meal(&pool, day.id, MealType::Lunch).await.unwrap();
        let item = food_items::insert_food_item(
            &pool,
            meal.id,
            &NewFoodItem {
                food_name: "Rice",
                calories: 200,
                carbohydrates: 45.0,
                sugars: 0.0,
                protein: 4.0,
                fat: 0.5,
                quantity: 1.0,
                unit: "g",
                week: 1,
            },
        )
        .await
        .unwrap();

        let token = user_token(&state, user);
        let resp = send(
            state,
            "POST",
            "/api/food-completion",
            Some(&token),
            Some(serde_json::json!({
                "userId": user.to_string(),
                "foodItemId": item.id.to_string(),
                "completed": true,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let updated = food_items::get_food_item(&pool, item.id).await.unwrap().unwrap();
        assert!(updated.completed, "the write must reach the item row");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Admin migration route
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn migrate_requires_admin_role() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/admin/migrate-to-two-week",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn migrate_with_admin_returns_results() {
        let (pool, db_name) = create_test_db().await;

        // One user plan with one meal so there is a group to migrate.
        let user = Uuid::new_v4();
        let plan = plans::insert_user_plan(&pool, "mine", "", user).await.unwrap();
        let day = days::insert_day(&pool, plan.id, DayOfWeek::Monday, None)
            .await
            .unwrap();
        let meal = meals::insert_meal(&pool, day.id, MealType::Dinner).await.unwrap();
        food_items::insert_food_item(
            &pool,
            meal.id,
            &NewFoodItem {
                food_name: "Stew",
                calories: 300,
                carbohydrates: 20.0,
                sugars: 3.0,
                protein: 25.0,
                fat: 10.0,
                quantity: 1.0,
                unit: "g",
                week: 1,
            },
        )
        .await
        .unwrap();

        let state = test_state(pool.clone());
        let token = admin_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "POST",
            "/api/admin/migrate-to-two-week",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["status"], "success");
        assert_eq!(results[0]["mealType"], "dinner");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Read routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn templates_listing_is_public() {
        let (pool, db_name) = create_test_db().await;
        seed_template(&pool).await;
        let state = test_state(pool.clone());

        let resp = send(state, "GET", "/api/templates", None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["name"], "Starter");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plans_listing_is_scoped_to_owner() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        plans::insert_user_plan(&pool, "alices", "", alice).await.unwrap();
        plans::insert_user_plan(&pool, "bobs", "", bob).await.unwrap();

        let token = user_token(&state, alice);
        let resp = send(state, "GET", "/api/plans", Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["name"], "alices");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_detail_returns_nested_tree_and_current_slot() {
        let (pool, db_name) = create_test_db().await;
        let template_id = seed_template(&pool).await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "GET",
            &format!("/api/plans/{template_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;

        assert_eq!(json["name"], "Starter");
        let days = json["days"].as_array().unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0]["dayOfWeek"], "Monday");
        let meals = days[0]["meals"].as_array().unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0]["mealType"], "breakfast");
        assert_eq!(meals[0]["foodItems"].as_array().unwrap().len(), 2);

        // The current slot is derived and formatted.
        let current = &json["current"];
        let week = current["week"].as_i64().unwrap();
        assert!(week == 1 || week == 2);
        let key = current["weekDayKey"].as_str().unwrap();
        assert!(key.starts_with(&format!("week{week}_")));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_detail_hides_other_users_plans() {
        let (pool, db_name) = create_test_db().await;
        let state = test_state(pool.clone());

        let owner = Uuid::new_v4();
        let plan = plans::insert_user_plan(&pool, "private", "", owner)
            .await
            .unwrap();

        let stranger = user_token(&state, Uuid::new_v4());
        let resp = send(
            state,
            "GET",
            &format!("/api/plans/{}", plan.id),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn analytics_sums_calories() {
        let (pool, db_name) = create_test_db().await;
        let template_id = seed_template(&pool).await;
        let state = test_state(pool.clone());
        let token = user_token(&state, Uuid::new_v4());

        let resp = send(
            state,
            "GET",
            &format!("/api/plans/{template_id}/analytics"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["planTotal"], 85);
        let days = json["days"].as_array().unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0]["day"], "Monday");
        assert_eq!(days[0]["totalCalories"], 85);

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
