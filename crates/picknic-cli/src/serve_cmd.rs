use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use picknic_core::meal_plan::{self, MealPlanDraft, MealPlanError};
use picknic_core::pantry::{self, PantryDraft, PantryDraftError, PantryUpdate};
use picknic_core::recipe::{self, RecipeDraft, RecipeDraftError};
use picknic_core::shopping::{self, ManualItemDraft, ShoppingListError};
use picknic_core::week::resolve_week_start;
use picknic_db::models::{Household, ShoppingItemStatus};
use picknic_db::queries::households as household_db;

/// Header carrying the acting user's ID, set by the identity proxy in front
/// of the server.
pub const USER_HEADER: &str = "x-user-id";
pub const ANONYMOUS_USER: &str = "anonymous";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

/// Domain errors raised below the HTTP layer keep their meaning: validation
/// failures become 400, a missing meal plan 404, anything else 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<ShoppingListError>() {
            return match e {
                ShoppingListError::MissingMealPlan { .. } => Self::not_found(e.to_string()),
                ShoppingListError::MissingIngredientName => Self::bad_request(e),
            };
        }
        if let Some(e) = err.downcast_ref::<MealPlanError>() {
            return Self::bad_request(e);
        }
        if let Some(e) = err.downcast_ref::<RecipeDraftError>() {
            return Self::bad_request(e);
        }
        if let Some(e) = err.downcast_ref::<PantryDraftError>() {
            return Self::bad_request(e);
        }
        Self::internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Envelope and extractors
// ---------------------------------------------------------------------------

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(Data { data }).into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(Data { data })).into_response()
}

/// The user on whose behalf the request is made.
#[derive(Debug, Clone)]
pub struct ActingUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS_USER);
        Ok(Self(user.to_owned()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    #[serde(rename = "weekStart")]
    pub week_start: Option<String>,
}

impl WeekQuery {
    /// The requested week's Monday; the current UTC week when absent or
    /// unparseable.
    fn resolve(&self) -> chrono::NaiveDate {
        resolve_week_start(self.week_start.as_deref(), Utc::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
pub struct NewHouseholdBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external_org_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusBody {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/households", get(list_households).post(create_household))
        .route(
            "/api/households/{hid}/recipes",
            get(list_recipes).post(create_recipe),
        )
        .route(
            "/api/households/{hid}/recipes/{id}",
            get(get_recipe).delete(delete_recipe),
        )
        .route(
            "/api/households/{hid}/meal-plans",
            get(get_meal_plan).post(save_meal_plan),
        )
        .route(
            "/api/households/{hid}/pantry",
            get(list_pantry).post(upsert_pantry),
        )
        .route(
            "/api/households/{hid}/pantry/{id}",
            patch(update_pantry).delete(delete_pantry),
        )
        .route(
            "/api/households/{hid}/shopping-lists",
            get(get_shopping_list).post(generate_shopping_list),
        )
        .route(
            "/api/households/{hid}/shopping-lists/items",
            post(add_shopping_item),
        )
        .route(
            "/api/households/{hid}/shopping-lists/items/{id}",
            patch(set_shopping_item_status).delete(remove_shopping_item),
        )
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("picknic serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("picknic serve shut down");
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

async fn household(pool: &PgPool, id: Uuid) -> Result<Household, AppError> {
    household_db::get_household(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("household {id} not found")))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn index(State(pool): State<PgPool>) -> Result<Response, AppError> {
    let households = household_db::list_households(&pool).await?;

    let rows = if households.is_empty() {
        "<tr><td colspan=\"2\">No households yet.</td></tr>".to_string()
    } else {
        households
            .iter()
            .map(|h| {
                format!(
                    "<tr><td><a href=\"/api/households/{id}/recipes\">{name}</a></td><td>{id}</td></tr>",
                    id = h.id,
                    name = escape_html(&h.name),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>picknic</title></head><body>\
<h1>picknic</h1>\
<p><a href=\"/api/households\">/api/households</a></p>\
<table><tr><th>Household</th><th>ID</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn list_households(State(pool): State<PgPool>) -> Result<Response, AppError> {
    Ok(ok(household_db::list_households(&pool).await?))
}

async fn create_household(
    State(pool): State<PgPool>,
    Json(body): Json<NewHouseholdBody>,
) -> Result<Response, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let org = body
        .external_org_id
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty());
    if let Some(org_id) = org {
        if household_db::get_household_by_org(&pool, org_id).await?.is_some() {
            return Err(AppError::bad_request(format!(
                "organization {org_id:?} already has a household"
            )));
        }
    }

    Ok(created(household_db::insert_household(&pool, name, org).await?))
}

// -- recipes ----------------------------------------------------------------

async fn list_recipes(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(ok(recipe::list_recipes(&pool, household.id).await?))
}

async fn create_recipe(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    ActingUser(user): ActingUser,
    Json(draft): Json<RecipeDraft>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let new_recipe = draft.normalize().map_err(AppError::bad_request)?;
    Ok(created(
        recipe::create_recipe(&pool, household.id, &user, &new_recipe).await?,
    ))
}

async fn get_recipe(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let details = recipe::get_recipe_with_details(&pool, household.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("recipe {id} not found")))?;
    Ok(ok(details))
}

async fn delete_recipe(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    if !recipe::delete_recipe(&pool, household.id, id).await? {
        return Err(AppError::not_found(format!("recipe {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// -- meal plans -------------------------------------------------------------

async fn get_meal_plan(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    Query(week): Query<WeekQuery>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(ok(
        meal_plan::get_meal_plan_for_week(&pool, household.id, week.resolve()).await?,
    ))
}

async fn save_meal_plan(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    ActingUser(user): ActingUser,
    Json(draft): Json<MealPlanDraft>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let new_plan = draft.normalize().map_err(AppError::bad_request)?;
    Ok(created(
        meal_plan::save_meal_plan(&pool, household.id, &user, &new_plan).await?,
    ))
}

// -- pantry -----------------------------------------------------------------

async fn list_pantry(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(ok(pantry::list_pantry_items(&pool, household.id).await?))
}

async fn upsert_pantry(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    ActingUser(user): ActingUser,
    Json(draft): Json<PantryDraft>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let item = draft.validate().map_err(AppError::bad_request)?;
    Ok(created(
        pantry::upsert_pantry_item(&pool, household.id, &user, &item).await?,
    ))
}

async fn update_pantry(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
    ActingUser(user): ActingUser,
    Json(update): Json<PantryUpdate>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let item = pantry::update_pantry_item(&pool, household.id, id, &user, &update.changes())
        .await?
        .ok_or_else(|| AppError::not_found(format!("pantry item {id} not found")))?;
    Ok(ok(item))
}

async fn delete_pantry(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    if !pantry::delete_pantry_item(&pool, household.id, id).await? {
        return Err(AppError::not_found(format!("pantry item {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// -- shopping lists ---------------------------------------------------------

async fn get_shopping_list(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    Query(week): Query<WeekQuery>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(ok(
        shopping::get_shopping_list_for_week(&pool, household.id, week.resolve()).await?,
    ))
}

async fn generate_shopping_list(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    Query(week): Query<WeekQuery>,
    ActingUser(user): ActingUser,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(created(
        shopping::generate_shopping_list_for_week(&pool, household.id, &user, week.resolve())
            .await?,
    ))
}

async fn add_shopping_item(
    State(pool): State<PgPool>,
    Path(hid): Path<Uuid>,
    Query(week): Query<WeekQuery>,
    ActingUser(user): ActingUser,
    Json(draft): Json<ManualItemDraft>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    Ok(created(
        shopping::add_manual_item(&pool, household.id, &user, week.resolve(), &draft).await?,
    ))
}

async fn set_shopping_item_status(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ItemStatusBody>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    let status: ShoppingItemStatus = body.status.parse().map_err(AppError::bad_request)?;
    let item = shopping::set_item_status(&pool, household.id, id, status)
        .await?
        .ok_or_else(|| AppError::not_found(format!("shopping list item {id} not found")))?;
    Ok(ok(item))
}

async fn remove_shopping_item(
    State(pool): State<PgPool>,
    Path((hid, id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let household = household(&pool, hid).await?;
    if !shopping::remove_item(&pool, household.id, id).await? {
        return Err(AppError::not_found(format!("shopping list item {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
