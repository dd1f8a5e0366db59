use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::calculator::{self, LoggedActivity};
use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::factors::{self, Category};
use crate::models::{
    BreakdownQuery, BreakdownResponse, EmissionEntryCreate, EmissionEntryUpdate, EmissionRecord,
    FactorCategory, FactorEntry, HistoryQuery, LimitQuery, RecommendationItem,
    RecommendationsResponse,
};
use crate::projections::{self, Period};
use crate::recommendations::{self, DEFAULT_CATALOG_LIMIT};
use crate::store::{spawn_log_op, EntryLog, LogEvent};

/// Shared handler state.
/// All entry state is derived from the log; nothing is cached.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub log: Arc<EntryLog>,
    /// Serializes read-modify-append sequences
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let log = EntryLog::new(config.log_path.clone());
        Self {
            config: Arc::new(config),
            log: Arc::new(log),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/factors", get(list_factors))
        .route("/api/factors/:category", get(list_subcategories))
        .route("/api/users/:user_id/emissions", post(create_emission))
        .route("/api/users/:user_id/emissions/history", get(get_history))
        .route("/api/users/:user_id/emissions/breakdown", get(get_breakdown))
        .route(
            "/api/users/:user_id/emissions/:entry_id",
            put(update_emission).delete(delete_emission),
        )
        .route(
            "/api/users/:user_id/recommendations",
            get(get_user_recommendations),
        )
        .route("/api/recommendations/catalog", get(get_catalog))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Carbon Tracker API v0.1.0"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// The whole factor table, one block per category
async fn list_factors() -> Json<Vec<FactorCategory>> {
    let table = Category::ALL
        .iter()
        .map(|category| FactorCategory {
            category: category.as_str().to_string(),
            unit: category.default_unit().to_string(),
            factors: category
                .factors()
                .iter()
                .map(|(name, factor)| FactorEntry {
                    subcategory: name.to_string(),
                    kg_co2e_per_unit: *factor,
                })
                .collect(),
        })
        .collect();
    Json(table)
}

async fn list_subcategories(Path(category): Path<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "category": category.to_lowercase(),
        "subcategories": factors::subcategories(&category),
    }))
}

/// Log a new emission entry
async fn create_emission(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<EmissionEntryCreate>,
) -> Result<Json<EmissionRecord>, ApiError> {
    let date = parse_date(&input.date)?;

    let activity = LoggedActivity {
        category: input.category,
        subcategory: input.subcategory,
        quantity: input.quantity,
        unit: input.unit,
    };
    // Computed on the caller's spelling so errors echo it back
    let co2_equivalent = activity.co2_equivalent()?;
    ensure_finite(activity.quantity, co2_equivalent)?;

    let category = activity.category.to_lowercase();
    let unit = match activity.unit {
        Some(unit) => unit,
        None => factors::default_unit(&category)
            .unwrap_or_default()
            .to_string(),
    };

    let entry = EmissionRecord {
        id: Uuid::new_v4(),
        user_id,
        category,
        subcategory: activity.subcategory.to_lowercase(),
        quantity: activity.quantity,
        unit,
        co2_equivalent,
        date,
        notes: input.notes,
        created_at: Utc::now(),
    };

    let _guard = state.write_lock.lock().await;
    append_event(&state.log, LogEvent::Created {
        entry: entry.clone(),
    })
    .await?;

    info!(
        entry_id = %entry.id,
        user_id = %user_id,
        category = %entry.category,
        co2_kg = entry.co2_equivalent,
        "emission logged"
    );
    Ok(Json(entry))
}

/// A user's entries, newest first
async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<EmissionRecord>>, ApiError> {
    let mut entries = user_entries(&state.log, user_id).await?;

    if let Some(category) = query.category {
        let category = category.to_lowercase();
        entries.retain(|e| e.category == category);
    }
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let limit = query.limit.unwrap_or(state.config.history_limit);
    let page = entries.into_iter().skip(query.skip).take(limit).collect();
    Ok(Json(page))
}

/// Monthly breakdown; defaults to the current month
async fn get_breakdown(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let now = Utc::now();
    let year = query.year.unwrap_or(now.year());
    let month = query.month.unwrap_or(now.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::InvalidMonth);
    }

    let entries = user_entries(&state.log, user_id).await?;
    let breakdown = projections::aggregate(&entries, &Period::Month { year, month });

    Ok(Json(BreakdownResponse {
        period: "month".to_string(),
        year,
        month,
        summary: breakdown.summary(),
        breakdown: breakdown.totals,
        entries: breakdown.entries,
    }))
}

/// Partial update; recomputes CO2 when the activity changed
async fn update_emission(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<EmissionEntryUpdate>,
) -> Result<Json<EmissionRecord>, ApiError> {
    let _guard = state.write_lock.lock().await;

    let mut entry = owned_entry(&state.log, user_id, entry_id).await?;

    if update.touches_emission() {
        let category = update.category.as_deref().unwrap_or(&entry.category);
        let subcategory = update.subcategory.as_deref().unwrap_or(&entry.subcategory);
        let quantity = update.quantity.unwrap_or(entry.quantity);

        let co2_equivalent = calculator::compute(category, subcategory, quantity)?;
        ensure_finite(quantity, co2_equivalent)?;

        let (category, subcategory) = (category.to_lowercase(), subcategory.to_lowercase());
        entry.category = category;
        entry.subcategory = subcategory;
        entry.quantity = quantity;
        entry.co2_equivalent = co2_equivalent;
    }
    if let Some(unit) = update.unit {
        entry.unit = unit;
    }
    if let Some(date) = &update.date {
        entry.date = parse_date(date)?;
    }
    if let Some(notes) = update.notes {
        entry.notes = Some(notes);
    }

    append_event(&state.log, LogEvent::Updated {
        entry: entry.clone(),
    })
    .await?;

    info!(entry_id = %entry.id, co2_kg = entry.co2_equivalent, "emission updated");
    Ok(Json(entry))
}

async fn delete_emission(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.write_lock.lock().await;

    let entry = owned_entry(&state.log, user_id, entry_id).await?;
    append_event(&state.log, LogEvent::Deleted {
        id: entry.id,
        at: Utc::now(),
    })
    .await?;

    info!(entry_id = %entry.id, "emission deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Suggestions from the user's trailing window of entries
async fn get_user_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.recommendation_limit);
    let today = Utc::now().date_naive();

    let entries = user_entries(&state.log, user_id).await?;
    let window = recommendations::trailing_window(&entries, today, state.config.window_days);
    let result = recommendations::recommend(&window, limit);

    Ok(Json(RecommendationsResponse {
        recommendations: result.rules.iter().map(|rule| RecommendationItem::from(*rule)).collect(),
        total_potential_savings: result.total_savings,
    }))
}

async fn get_catalog(Query(query): Query<LimitQuery>) -> Json<Vec<RecommendationItem>> {
    let limit = query.limit.unwrap_or(DEFAULT_CATALOG_LIMIT);
    let items = recommendations::catalog(limit)
        .into_iter()
        .map(RecommendationItem::from)
        .collect();
    Json(items)
}

// Helper functions

fn parse_date(date: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate)
}

/// A non-finite quantity or CO2 value cannot be written to the log as JSON
fn ensure_finite(quantity: f64, co2_equivalent: f64) -> Result<(), ApiError> {
    if quantity.is_finite() && co2_equivalent.is_finite() {
        Ok(())
    } else {
        Err(ApiError::InvalidQuantity)
    }
}

async fn append_event(log: &Arc<EntryLog>, event: LogEvent) -> Result<(), ApiError> {
    let log = Arc::clone(log);
    spawn_log_op(move || log.append(&event)).await?;
    Ok(())
}

async fn user_entries(log: &Arc<EntryLog>, user_id: Uuid) -> Result<Vec<EmissionRecord>, ApiError> {
    let log = Arc::clone(log);
    Ok(spawn_log_op(move || log.entries_for(user_id)).await?)
}

async fn owned_entry(
    log: &Arc<EntryLog>,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<EmissionRecord, ApiError> {
    let log = Arc::clone(log);
    let entry = spawn_log_op(move || log.find(entry_id))
        .await?
        .ok_or(ApiError::EntryNotFound)?;
    if entry.user_id != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(entry)
}
