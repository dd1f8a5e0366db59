use crate::errors::EmissionError;

/// Minimum similarity before an unknown subcategory gets a "did you mean" hint
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// The three recognized emission categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Transport,
    Energy,
    Food,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Transport, Category::Energy, Category::Food];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Transport => "transport",
            Category::Energy => "energy",
            Category::Food => "food",
        }
    }

    /// Exact match on the lowercase name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    pub fn default_unit(&self) -> &'static str {
        match self {
            Category::Transport => "km",
            Category::Energy => "kWh",
            Category::Food => "meal",
        }
    }

    /// (subcategory, kg CO2e per unit), in declaration order
    pub fn factors(&self) -> &'static [(&'static str, f64)] {
        match self {
            Category::Transport => TRANSPORT_FACTORS,
            Category::Energy => ENERGY_FACTORS,
            Category::Food => FOOD_FACTORS,
        }
    }
}

// Global averages, kg CO2e per km
static TRANSPORT_FACTORS: &[(&str, f64)] = &[
    ("car", 0.21),
    ("electric_car", 0.08),
    ("bus", 0.06),
    ("train", 0.04),
    ("flight", 0.25),
    ("motorcycle", 0.09),
];

// kg CO2e per kWh
static ENERGY_FACTORS: &[(&str, f64)] = &[
    ("electricity", 0.385),
    ("natural_gas", 0.20),
    ("heating_oil", 0.268),
];

// kg CO2e per meal/serving
static FOOD_FACTORS: &[(&str, f64)] = &[
    ("beef", 27.0),
    ("pork", 4.0),
    ("chicken", 2.5),
    ("fish", 3.5),
    ("dairy", 5.0),
    ("plant_based", 1.0),
];

/// Factor for a category/subcategory pair. Matching is case-insensitive.
pub fn lookup(category: &str, subcategory: &str) -> Result<f64, EmissionError> {
    let category_lower = category.to_lowercase();
    let subcategory_lower = subcategory.to_lowercase();

    let known = Category::parse(&category_lower).ok_or_else(|| EmissionError::UnknownCategory {
        category: category.to_string(),
    })?;

    known
        .factors()
        .iter()
        .find(|(name, _)| *name == subcategory_lower)
        .map(|(_, factor)| *factor)
        .ok_or_else(|| EmissionError::UnknownSubcategory {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            suggestion: closest_subcategory(known, &subcategory_lower),
        })
}

/// Lenient lookup, `None` when the pair is unknown
pub fn emission_factor(category: &str, subcategory: &str) -> Option<f64> {
    lookup(category, subcategory).ok()
}

/// Known subcategories of a category; empty for unknown categories
pub fn subcategories(category: &str) -> Vec<&'static str> {
    Category::parse(&category.to_lowercase())
        .map(|c| c.factors().iter().map(|(name, _)| *name).collect())
        .unwrap_or_default()
}

pub fn default_unit(category: &str) -> Option<&'static str> {
    Category::parse(&category.to_lowercase()).map(|c| c.default_unit())
}

fn closest_subcategory(category: Category, subcategory: &str) -> Option<String> {
    category
        .factors()
        .iter()
        .map(|(name, _)| (*name, strsim::normalized_levenshtein(name, subcategory)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.to_string())
}
