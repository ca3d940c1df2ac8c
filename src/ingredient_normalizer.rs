//! # Ingredient Normalizer
//!
//! Pure functions that canonicalize an ingredient's name and unit so that
//! textually different spellings of the same ingredient collapse to one
//! [`CanonicalKey`](crate::ingredient_merger::CanonicalKey).
//!
//! ## Features
//!
//! - Strip decorative pictographs from authored names
//! - Resolve synonymous name spellings and unit synonyms
//! - Apply the single volumetric-to-mass special case
//! - Derive a shopping category from a normalized name
//!
//! Normalization depends on `(name, unit)` only and is idempotent.
//!
//! ## Usage
//!
//! ```rust
//! use shopping_list::ingredient_normalizer::Normalizer;
//!
//! let normalizer = Normalizer::default();
//! assert_eq!(normalizer.normalize_name(" 纯牛奶 "), "牛奶");
//! assert_eq!(normalizer.normalize_unit("克"), "g");
//! assert_eq!(normalizer.category("鸡蛋"), "蛋奶");
//! ```

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::normalization_tables::{
    CATEGORY_KEYWORDS, DECORATIVE_SYMBOLS_REGEX, DENSITY_RULES, NAME_ALIASES, OTHER_CATEGORY,
    UNIT_SYNONYMS,
};

/// A quantity after the name-specific unit conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NormalizedQuantity<'a> {
    pub(crate) quantity: f64,
    pub(crate) unit: &'a str,
}

/// Owned variant returned by [`Normalizer::normalize_quantity_by_name`]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAmount {
    pub quantity: f64,
    pub unit: String,
}

/// Canonicalizes ingredient names, units and categories
///
/// The tables are held by value so a caller can inject its own; the
/// [`Default`] impl uses the built-in tables from
/// [`normalization_tables`](crate::normalization_tables).
#[derive(Debug, Clone)]
pub struct Normalizer {
    decorative_symbols: Regex,
    name_aliases: HashMap<String, String>,
    unit_synonyms: HashMap<String, String>,
    density_rules: Vec<(String, String, String)>,
    categories: Vec<(String, Vec<String>)>,
    fallback_category: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            decorative_symbols: DECORATIVE_SYMBOLS_REGEX.clone(),
            name_aliases: to_owned_map(NAME_ALIASES),
            unit_synonyms: to_owned_map(UNIT_SYNONYMS),
            density_rules: DENSITY_RULES
                .iter()
                .map(|(name, from, to)| (name.to_string(), from.to_string(), to.to_string()))
                .collect(),
            categories: CATEGORY_KEYWORDS
                .iter()
                .map(|(category, keywords)| {
                    (
                        category.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
            fallback_category: OTHER_CATEGORY.to_string(),
        }
    }
}

fn to_owned_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl Normalizer {
    /// Create a normalizer with the built-in tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name alias. Aliases resolve after symbol stripping.
    pub fn with_name_alias(mut self, from: &str, to: &str) -> Self {
        self.name_aliases.insert(from.to_string(), to.to_string());
        self
    }

    /// Add a unit synonym
    pub fn with_unit_synonym(mut self, from: &str, to: &str) -> Self {
        self.unit_synonyms.insert(from.to_string(), to.to_string());
        self
    }

    /// Canonical spelling of an ingredient name. Never fails; empty input yields `""`.
    pub fn normalize_name(&self, raw: &str) -> String {
        let stripped = self.decorative_symbols.replace_all(raw.trim(), "");
        let trimmed = stripped.trim();
        match self.name_aliases.get(trimmed) {
            Some(alias) => alias.clone(),
            None => trimmed.to_string(),
        }
    }

    /// Canonical unit token. Unknown units pass through trimmed.
    pub fn normalize_unit(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.unit_synonyms.get(trimmed) {
            Some(unit) => unit.clone(),
            None => trimmed.to_string(),
        }
    }

    /// Normalize name and unit, then apply at most one density conversion.
    ///
    /// Non-finite quantities become zero.
    pub fn normalize_quantity_by_name(&self, name: &str, quantity: f64, unit: &str) -> NormalizedAmount {
        let name = self.normalize_name(name);
        let unit = self.normalize_unit(unit);
        let converted = self.convert(&name, sanitize_quantity(quantity), &unit);
        NormalizedAmount {
            quantity: converted.quantity,
            unit: converted.unit.to_string(),
        }
    }

    /// Density conversion on already-normalized inputs
    pub(crate) fn convert<'a>(&'a self, name: &str, quantity: f64, unit: &'a str) -> NormalizedQuantity<'a> {
        for (rule_name, volume_unit, mass_unit) in &self.density_rules {
            if rule_name == name && volume_unit == unit {
                trace!(ingredient = %name, from = %unit, to = %mass_unit, "Applying density conversion");
                return NormalizedQuantity {
                    quantity,
                    unit: mass_unit.as_str(),
                };
            }
        }
        NormalizedQuantity { quantity, unit }
    }

    /// Shopping category for a normalized name.
    ///
    /// A keyword matches when either string contains the other; categories are
    /// scanned in table order and the first hit wins.
    pub fn category(&self, normalized_name: &str) -> &str {
        let clean = self.decorative_symbols.replace_all(normalized_name, "");
        let clean = clean.trim();
        if clean.is_empty() {
            return &self.fallback_category;
        }

        self.categories
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| clean.contains(keyword.as_str()) || keyword.contains(clean))
            })
            .map(|(category, _)| category.as_str())
            .unwrap_or(self.fallback_category.as_str())
    }

    /// Every category name in lookup order, fallback included
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(category, _)| category.as_str())
    }
}

/// Authored quantities may be missing or garbage; those count as zero.
pub(crate) fn sanitize_quantity(quantity: f64) -> f64 {
    if quantity.is_finite() {
        quantity
    } else {
        0.0
    }
}

lazy_static! {
    static ref DEFAULT_NORMALIZER: Normalizer = Normalizer::default();
}

/// [`Normalizer::normalize_name`] with the built-in tables
pub fn normalize_name(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize_name(raw)
}

/// [`Normalizer::normalize_unit`] with the built-in tables
pub fn normalize_unit(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize_unit(raw)
}

/// [`Normalizer::category`] with the built-in tables
pub fn get_category(normalized_name: &str) -> String {
    DEFAULT_NORMALIZER.category(normalized_name).to_string()
}
