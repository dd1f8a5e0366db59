use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recommendations::RecommendationRule;

/// Emission entry input from API
#[derive(Debug, Deserialize)]
pub struct EmissionEntryCreate {
    pub category: String,
    pub subcategory: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// "YYYY-MM-DD"
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct EmissionEntryUpdate {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl EmissionEntryUpdate {
    /// Whether the stored CO2 value must be recomputed
    pub fn touches_emission(&self) -> bool {
        self.quantity.is_some() || self.category.is_some() || self.subcategory.is_some()
    }
}

/// A logged activity with its computed CO2 value.
/// Owned by exactly one user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmissionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub subcategory: String,
    pub quantity: f64,
    pub unit: String,
    pub co2_equivalent: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// API Response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Per-category totals as shown to clients
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BreakdownTotals {
    pub transport: f64,
    pub energy: f64,
    pub food: f64,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BreakdownSummary {
    pub total_co2_kg: f64,
    pub daily_average: f64,
    /// Change vs the previous period; not computed, always 0.0
    pub trend: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BreakdownResponse {
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub summary: BreakdownSummary,
    pub breakdown: BreakdownTotals,
    pub entries: Vec<EmissionRecord>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecommendationItem {
    pub id: String,
    pub category: String,
    pub action: String,
    pub description: String,
    pub potential_savings: f64,
    pub priority: String,
    pub difficulty: String,
}

impl From<&RecommendationRule> for RecommendationItem {
    fn from(rule: &RecommendationRule) -> Self {
        Self {
            id: rule.id.to_string(),
            category: rule.category.as_str().to_string(),
            action: rule.action.to_string(),
            description: rule.description.to_string(),
            potential_savings: rule.savings,
            priority: rule.priority.as_str().to_string(),
            difficulty: rule.difficulty.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendationItem>,
    pub total_potential_savings: f64,
}

/// One category of the factor table
#[derive(Debug, Serialize, Deserialize)]
pub struct FactorCategory {
    pub category: String,
    pub unit: String,
    pub factors: Vec<FactorEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FactorEntry {
    pub subcategory: String,
    pub kg_co2e_per_unit: f64,
}
