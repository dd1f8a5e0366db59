//! Rule-based reduction suggestions.
//!
//! Each rule is gated by a threshold on one category's trailing-window CO2
//! total. Applicable rules are ranked by priority, then by savings.

use chrono::{Days, NaiveDate};

use crate::factors::Category;
use crate::models::EmissionRecord;
use crate::projections::CategoryTotals;

pub const DEFAULT_LIMIT: i64 = 5;
pub const DEFAULT_CATALOG_LIMIT: i64 = 10;
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Ranking order: High sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Condition on a category's total (kg CO2e over the window)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Strictly greater than
    Above(f64),
}

impl Threshold {
    pub fn holds(&self, total: f64) -> bool {
        match *self {
            Threshold::Above(limit) => total > limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRule {
    pub id: &'static str,
    pub category: Category,
    pub action: &'static str,
    pub description: &'static str,
    /// kg CO2e per week
    pub savings: f64,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub threshold: Threshold,
}

impl RecommendationRule {
    pub fn applies(&self, totals: &CategoryTotals) -> bool {
        self.threshold.holds(totals.get(self.category))
    }
}

pub static RULES: [RecommendationRule; 11] = [
    RecommendationRule {
        id: "transit_switch",
        category: Category::Transport,
        action: "Switch 2 car trips/week to public transit",
        description: "Using buses or trains instead of driving reduces your emissions significantly",
        savings: 1.5,
        priority: Priority::High,
        difficulty: Difficulty::Easy,
        threshold: Threshold::Above(40.0),
    },
    RecommendationRule {
        id: "carpool",
        category: Category::Transport,
        action: "Try carpooling for 1 trip per week",
        description: "Sharing rides reduces per-person emissions",
        savings: 0.8,
        priority: Priority::Medium,
        difficulty: Difficulty::Medium,
        threshold: Threshold::Above(30.0),
    },
    RecommendationRule {
        id: "electric_vehicle",
        category: Category::Transport,
        action: "Consider an electric vehicle for your next car",
        description: "Electric cars produce 60% less emissions than petrol cars",
        savings: 10.0,
        priority: Priority::High,
        difficulty: Difficulty::Hard,
        threshold: Threshold::Above(50.0),
    },
    RecommendationRule {
        id: "reduce_flights",
        category: Category::Transport,
        action: "Reduce flights by 1-2 per year",
        description: "Flying is the highest-emission activity. Consider alternatives or fewer trips",
        savings: 200.0,
        priority: Priority::High,
        difficulty: Difficulty::Hard,
        threshold: Threshold::Above(100.0),
    },
    RecommendationRule {
        id: "thermostat_adjust",
        category: Category::Energy,
        action: "Reduce heating/cooling by 2°C",
        description: "Small temperature adjustments can significantly reduce energy use",
        savings: 2.3,
        priority: Priority::Medium,
        difficulty: Difficulty::Easy,
        threshold: Threshold::Above(400.0),
    },
    RecommendationRule {
        id: "led_lighting",
        category: Category::Energy,
        action: "Switch to LED lighting throughout your home",
        description: "LEDs use 75% less energy than incandescent bulbs",
        savings: 1.5,
        priority: Priority::Medium,
        difficulty: Difficulty::Easy,
        threshold: Threshold::Above(300.0),
    },
    RecommendationRule {
        id: "renewable_energy",
        category: Category::Energy,
        action: "Switch to renewable energy provider",
        description: "Your utility may offer renewable energy plans",
        savings: 5.0,
        priority: Priority::High,
        difficulty: Difficulty::Medium,
        threshold: Threshold::Above(200.0),
    },
    RecommendationRule {
        id: "beef_reduction",
        category: Category::Food,
        action: "Replace 1 beef meal/week with chicken",
        description: "Beef has 10x higher emissions than chicken",
        savings: 1.2,
        priority: Priority::High,
        difficulty: Difficulty::Easy,
        threshold: Threshold::Above(50.0),
    },
    RecommendationRule {
        id: "meatless_monday",
        category: Category::Food,
        action: "Adopt one meatless day per week",
        description: "Plant-based meals have 5-10x lower emissions than meat",
        savings: 4.0,
        priority: Priority::High,
        difficulty: Difficulty::Medium,
        threshold: Threshold::Above(40.0),
    },
    RecommendationRule {
        id: "vegan_transition",
        category: Category::Food,
        action: "Try a vegan diet",
        description: "Plant-based eating has the lowest carbon footprint",
        savings: 20.0,
        priority: Priority::High,
        difficulty: Difficulty::Hard,
        threshold: Threshold::Above(100.0),
    },
    RecommendationRule {
        id: "local_food",
        category: Category::Food,
        action: "Buy local, seasonal produce",
        description: "Reduces transportation and storage emissions",
        savings: 0.5,
        priority: Priority::Low,
        difficulty: Difficulty::Easy,
        threshold: Threshold::Above(30.0),
    },
];

/// Ranked suggestions plus the savings of the ones returned
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub rules: Vec<&'static RecommendationRule>,
    /// kg CO2e per week
    pub total_savings: f64,
}

/// Entries dated within the last `days` days of `today` (inclusive)
pub fn trailing_window(
    entries: &[EmissionRecord],
    today: NaiveDate,
    days: u64,
) -> Vec<EmissionRecord> {
    let since = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
    entries.iter().filter(|e| e.date >= since).cloned().collect()
}

/// Ranks the applicable rules for a window of entries.
///
/// `entries` should already cover the trailing window. Unrecognized
/// categories are ignored. A `limit` of zero or less yields nothing.
pub fn recommend(entries: &[EmissionRecord], limit: i64) -> Recommendations {
    let totals = CategoryTotals::from_entries(entries);
    rank(&totals, limit)
}

/// Ranking over precomputed category totals
pub fn rank(totals: &CategoryTotals, limit: i64) -> Recommendations {
    let rules = rank_rules(&RULES, totals, limit);
    let total_savings = rules.iter().map(|rule| rule.savings).sum();
    Recommendations {
        rules,
        total_savings,
    }
}

/// Filters `rules` against `totals`, sorts, and truncates to `limit`
pub fn rank_rules<'a>(
    rules: &'a [RecommendationRule],
    totals: &CategoryTotals,
    limit: i64,
) -> Vec<&'a RecommendationRule> {
    let mut applicable: Vec<&RecommendationRule> =
        rules.iter().filter(|rule| rule.applies(totals)).collect();

    // sort_by is stable: equal (priority, savings) keep declaration order
    applicable.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.savings.total_cmp(&a.savings))
    });
    applicable.truncate(usize::try_from(limit).unwrap_or(0));
    applicable
}

/// Every rule regardless of thresholds, by savings descending then id
pub fn catalog(limit: i64) -> Vec<&'static RecommendationRule> {
    let mut rules: Vec<&'static RecommendationRule> = RULES.iter().collect();
    rules.sort_by(|a, b| b.savings.total_cmp(&a.savings).then_with(|| a.id.cmp(b.id)));
    rules.truncate(usize::try_from(limit).unwrap_or(0));
    rules
}
