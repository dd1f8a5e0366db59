use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::calculator::round2;
use crate::factors::Category;
use crate::models::{BreakdownSummary, BreakdownTotals, EmissionRecord};


/// Running CO2 totals for the recognized categories
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryTotals {
    pub transport: f64,
    pub energy: f64,
    pub food: f64,
}

impl CategoryTotals {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a EmissionRecord>) -> Self {
        let mut totals = Self::default();
        for entry in entries {
            totals.add(&entry.category, entry.co2_equivalent);
        }
        totals
    }

    /// Adds `co2` to the category's total. Returns false, leaving the totals
    /// unchanged, for categories outside the table.
    pub fn add(&mut self, category: &str, co2: f64) -> bool {
        match Category::parse(category) {
            Some(Category::Transport) => self.transport += co2,
            Some(Category::Energy) => self.energy += co2,
            Some(Category::Food) => self.food += co2,
            None => return false,
        }
        true
    }

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Transport => self.transport,
            Category::Energy => self.energy,
            Category::Food => self.food,
        }
    }

    pub fn total(&self) -> f64 {
        self.transport + self.energy + self.food
    }
}

/// Date window an aggregation covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Period {
    All,
    /// A calendar month, e.g. every date starting with "2024-03"
    Month { year: i32, month: u32 },
    /// Inclusive on both ends
    Range { from: NaiveDate, to: NaiveDate },
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Period::All => true,
            Period::Month { year, month } => date.year() == year && date.month() == month,
            Period::Range { from, to } => from <= date && date <= to,
        }
    }
}

/// Per-category summary of a period, derived from its entries
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub totals: BreakdownTotals,
    pub daily_average: f64,
    /// Not computed; always 0.0
    pub trend: f64,
    /// Distinct dates with at least one entry
    pub active_days: usize,
    pub entries: Vec<EmissionRecord>,
}

impl Breakdown {
    pub fn summary(&self) -> BreakdownSummary {
        BreakdownSummary {
            total_co2_kg: self.totals.total,
            daily_average: self.daily_average,
            trend: self.trend,
        }
    }
}

/// Sums CO2 by category over the entries inside `period`.
///
/// The daily average divides by the number of distinct dates among those
/// entries (1 when there are none). Entries with unrecognized categories
/// count towards active days but not towards any total.
pub fn aggregate(entries: &[EmissionRecord], period: &Period) -> Breakdown {
    let selected: Vec<EmissionRecord> = entries
        .iter()
        .filter(|e| period.contains(e.date))
        .cloned()
        .collect();

    let totals = CategoryTotals::from_entries(&selected);
    let total = totals.total();

    let active_days = selected.iter().map(|e| e.date).collect::<BTreeSet<_>>().len();
    let daily_average = total / active_days.max(1) as f64;

    Breakdown {
        totals: BreakdownTotals {
            transport: round2(totals.transport),
            energy: round2(totals.energy),
            food: round2(totals.food),
            total: round2(total),
        },
        daily_average: round2(daily_average),
        trend: 0.0,
        active_days,
        entries: selected,
    }
}

pub fn aggregate_breakdown(entries: &[EmissionRecord]) -> Breakdown {
    aggregate(entries, &Period::All)
}
