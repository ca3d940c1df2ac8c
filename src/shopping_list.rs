//! # Shopping List Store
//!
//! The persisted shopping list and the operations that keep it consistent.
//!
//! ## Features
//!
//! - Selected recipes with independent portion scales
//! - Ingredient lines re-derived from the catalog on every add, remove and
//!   rescale, with purchase flags carried over by [`CanonicalKey`]
//! - In-place purchase toggling and manual line removal
//! - Self-repair of stored documents at load time
//! - Share link generation and application
//!
//! Every operation performs a full read-modify-write against the backing
//! [`Storage`]; the store keeps no in-memory copy of the list.
//!
//! ## Usage
//!
//! ```rust
//! use shopping_list::recipe_model::{Recipe, RecipeCatalog};
//! use shopping_list::shopping_list::ShoppingListStore;
//! use shopping_list::storage::MemoryStorage;
//!
//! let catalog = RecipeCatalog::new(vec![
//!     Recipe::new(1, "番茄炒蛋").with_ingredient("鸡蛋", 2.0, "个"),
//! ]);
//! let mut store = ShoppingListStore::new(MemoryStorage::new());
//!
//! let state = store.add_recipe(1, &catalog, 1.5)?;
//! assert_eq!(state.ingredients[0].quantity, 3.0);
//! assert_eq!(store.stats().total, 1);
//! # Ok::<(), shopping_list::errors::ShoppingListError>(())
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::ingredient_merger::{carry_over, category_stats, collect, heal, merge, CanonicalKey, CategoryStats, MergedIngredient};
use crate::ingredient_normalizer::Normalizer;
use crate::recipe_model::{Catalog, RecipeId};
use crate::scale::{normalize_scale, normalize_scale_value, DEFAULT_SCALE};
use crate::share_codec::{self, coerce_recipe_id, DEFAULT_SHARE_PARAM};
use crate::storage::Storage;

/// Storage key of the persisted document
pub const DEFAULT_STORAGE_KEY: &str = "shoppingList";

/// The persisted shopping list document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShoppingListState {
    /// Merged ingredient lines
    pub ingredients: Vec<MergedIngredient>,
    /// Selected recipes in selection order, without duplicates
    pub selected_recipe_ids: Vec<RecipeId>,
    /// Normalized scale of every selected recipe
    pub recipe_scales: BTreeMap<RecipeId, f64>,
    /// Time of the last persisted mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ShoppingListState {
    pub fn is_empty(&self) -> bool {
        self.selected_recipe_ids.is_empty() && self.ingredients.is_empty()
    }

    pub fn contains_recipe(&self, recipe_id: RecipeId) -> bool {
        self.selected_recipe_ids.contains(&recipe_id)
    }

    /// The line for a key, if present
    pub fn find(&self, key: &CanonicalKey) -> Option<&MergedIngredient> {
        self.ingredients.iter().find(|line| line.matches(key))
    }

    /// Scale of a selected recipe
    pub fn scale_of(&self, recipe_id: RecipeId) -> Option<f64> {
        self.recipe_scales.get(&recipe_id).copied()
    }

    pub fn stats(&self) -> ShoppingListStats {
        let total = self.ingredients.len();
        let purchased = self.ingredients.iter().filter(|line| line.purchased).count();
        ShoppingListStats {
            total,
            purchased,
            remaining: total - purchased,
            selected_recipes: self.selected_recipe_ids.len(),
        }
    }

    /// Keys of every line marked purchased
    pub fn purchased_keys(&self) -> Vec<CanonicalKey> {
        self.ingredients
            .iter()
            .filter(|line| line.purchased)
            .map(MergedIngredient::key)
            .collect()
    }

    /// Parse a stored document, repairing whatever can be repaired.
    ///
    /// Returns `None` only when the text is not a JSON object at all.
    /// Non-integer ids are dropped, duplicate ids collapse, every scale is
    /// re-normalized (missing ones become 1), scales of unselected recipes
    /// are discarded and ingredient lines are re-merged.
    pub fn from_stored_json(normalizer: &Normalizer, json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        let document = value.as_object()?;

        let mut selected_recipe_ids: Vec<RecipeId> = Vec::new();
        for id in array_field(document, "selectedRecipeIds").iter().filter_map(coerce_recipe_id) {
            if !selected_recipe_ids.contains(&id) {
                selected_recipe_ids.push(id);
            }
        }

        let stored_scales = document.get("recipeScales").and_then(Value::as_object);
        let recipe_scales = selected_recipe_ids
            .iter()
            .map(|&id| {
                let scale = stored_scales
                    .and_then(|scales| scales.get(&id.to_string()))
                    .map(normalize_scale_value)
                    .unwrap_or(DEFAULT_SCALE);
                (id, scale)
            })
            .collect();

        let stored_lines = array_field(document, "ingredients")
            .iter()
            .filter_map(stored_line)
            .collect();

        let last_updated = document
            .get("lastUpdated")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        Some(Self {
            ingredients: heal(normalizer, stored_lines),
            selected_recipe_ids,
            recipe_scales,
            last_updated,
        })
    }
}

fn array_field<'a>(document: &'a Map<String, Value>, field: &str) -> &'a [Value] {
    document
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn stored_line(value: &Value) -> Option<MergedIngredient> {
    let line = value.as_object()?;
    let text = |field: &str| line.get(field).and_then(Value::as_str).unwrap_or("").to_string();

    let name = text("name");
    if name.trim().is_empty() {
        return None;
    }
    let quantity = line
        .get("quantity")
        .map(crate::scale::coerce_number)
        .filter(|q| q.is_finite())
        .unwrap_or(0.0);

    Some(MergedIngredient {
        name,
        unit: text("unit"),
        quantity,
        category: text("category"),
        purchased: line.get("purchased").and_then(Value::as_bool).unwrap_or(false),
        recipe_ids: line
            .get("recipeIds")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(coerce_recipe_id).collect())
            .unwrap_or_default(),
    })
}

/// Read-only summary of the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListStats {
    pub total: usize,
    pub purchased: usize,
    pub remaining: usize,
    pub selected_recipes: usize,
}

/// What happened when a page URL was checked for a share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedLinkOutcome {
    /// The URL carries no share parameter; the list was left alone
    NotShared,
    /// The shared list replaced the stored one
    Applied { loaded: usize, dropped: usize },
    /// The payload could not be decoded
    Invalid,
    /// The payload decoded but none of its recipes exist any more
    NoValidRecipes,
}

/// Result of [`ShoppingListStore::apply_shared_link`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLinkResult {
    pub outcome: SharedLinkOutcome,
    /// The page URL with the share parameter removed
    pub clean_url: String,
}

/// Shopping list operations over a [`Storage`] backend
pub struct ShoppingListStore<S: Storage> {
    storage: S,
    normalizer: Normalizer,
    storage_key: String,
    share_param: String,
}

impl<S: Storage> ShoppingListStore<S> {
    /// Create a store with the default normalization tables
    pub fn new(storage: S) -> Self {
        Self::with_normalizer(storage, Normalizer::default())
    }

    pub fn with_normalizer(storage: S, normalizer: Normalizer) -> Self {
        Self {
            storage,
            normalizer,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            share_param: DEFAULT_SHARE_PARAM.to_string(),
        }
    }

    /// Persist under a different storage key
    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = key.to_string();
        self
    }

    /// Use a different query parameter for share links
    pub fn with_share_param(mut self, param: &str) -> Self {
        self.share_param = param.to_string();
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Read the persisted list.
    ///
    /// Absent, unreadable or corrupt documents yield an empty list; this
    /// never fails.
    pub fn load(&self) -> ShoppingListState {
        let raw = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ShoppingListState::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read shopping list, starting empty");
                return ShoppingListState::default();
            }
        };

        match ShoppingListState::from_stored_json(&self.normalizer, &raw) {
            Some(state) => state,
            None => {
                warn!(bytes = raw.len(), "Stored shopping list is corrupt, starting empty");
                ShoppingListState::default()
            }
        }
    }

    fn save(&mut self, state: &mut ShoppingListState) -> Result<()> {
        state.last_updated = Some(Utc::now());
        let json = serde_json::to_string(state)?;
        self.storage.set_item(&self.storage_key, &json)?;
        debug!(
            recipes = state.selected_recipe_ids.len(),
            ingredients = state.ingredients.len(),
            "Shopping list saved"
        );
        Ok(())
    }

    /// Re-derive every line from the catalog, keeping state for surviving keys
    fn recompute<C>(&self, state: &mut ShoppingListState, catalog: &C)
    where
        C: Catalog + ?Sized,
    {
        let items = collect(&self.normalizer, &state.selected_recipe_ids, catalog, &state.recipe_scales);
        let mut fresh = merge(&self.normalizer, items);
        carry_over(&state.ingredients, &mut fresh, &state.selected_recipe_ids);
        state.ingredients = fresh;
    }

    /// Select a recipe at the given scale. No-op if already selected.
    pub fn add_recipe<C>(&mut self, recipe_id: RecipeId, catalog: &C, scale: f64) -> Result<ShoppingListState>
    where
        C: Catalog + ?Sized,
    {
        let mut state = self.load();
        if state.contains_recipe(recipe_id) {
            debug!(recipe_id, "Recipe already in shopping list");
            return Ok(state);
        }

        let scale = normalize_scale(scale);
        state.selected_recipe_ids.push(recipe_id);
        state.recipe_scales.insert(recipe_id, scale);
        self.recompute(&mut state, catalog);
        self.save(&mut state)?;

        info!(recipe_id, scale, "Added recipe to shopping list");
        Ok(state)
    }

    /// Deselect a recipe. No-op if not selected.
    pub fn remove_recipe<C>(&mut self, recipe_id: RecipeId, catalog: &C) -> Result<ShoppingListState>
    where
        C: Catalog + ?Sized,
    {
        let mut state = self.load();
        if !state.contains_recipe(recipe_id) {
            debug!(recipe_id, "Recipe not in shopping list");
            return Ok(state);
        }

        state.selected_recipe_ids.retain(|&id| id != recipe_id);
        state.recipe_scales.remove(&recipe_id);
        self.recompute(&mut state, catalog);
        self.save(&mut state)?;

        info!(recipe_id, "Removed recipe from shopping list");
        Ok(state)
    }

    /// Change the scale of a selected recipe. No-op if not selected.
    pub fn update_recipe_scale<C>(&mut self, recipe_id: RecipeId, scale: f64, catalog: &C) -> Result<ShoppingListState>
    where
        C: Catalog + ?Sized,
    {
        let mut state = self.load();
        if !state.contains_recipe(recipe_id) {
            debug!(recipe_id, "Cannot rescale a recipe that is not selected");
            return Ok(state);
        }

        let scale = normalize_scale(scale);
        state.recipe_scales.insert(recipe_id, scale);
        self.recompute(&mut state, catalog);
        self.save(&mut state)?;

        info!(recipe_id, scale, "Updated recipe scale");
        Ok(state)
    }

    /// Set the purchase flag of one line. Returns whether the line exists.
    pub fn toggle_purchased(&mut self, key: &CanonicalKey, purchased: bool) -> Result<bool> {
        let mut state = self.load();
        let Some(line) = state.ingredients.iter_mut().find(|line| line.matches(key)) else {
            debug!(key = %key, "No shopping list line to toggle");
            return Ok(false);
        };

        line.purchased = purchased;
        self.save(&mut state)?;
        debug!(key = %key, purchased, "Toggled purchase flag");
        Ok(true)
    }

    /// Delete one line without touching the recipe selection.
    ///
    /// The line comes back on the next recompute while one of its recipes is
    /// still selected. Returns whether the line existed.
    pub fn remove_ingredient(&mut self, key: &CanonicalKey) -> Result<bool> {
        let mut state = self.load();
        let before = state.ingredients.len();
        state.ingredients.retain(|line| !line.matches(key));
        if state.ingredients.len() == before {
            debug!(key = %key, "No shopping list line to remove");
            return Ok(false);
        }

        self.save(&mut state)?;
        info!(key = %key, "Removed ingredient line");
        Ok(true)
    }

    /// Set the purchase flag on every line
    pub fn mark_all_purchased(&mut self, purchased: bool) -> Result<ShoppingListState> {
        let mut state = self.load();
        for line in state.ingredients.iter_mut() {
            line.purchased = purchased;
        }
        self.save(&mut state)?;

        info!(lines = state.ingredients.len(), purchased, "Marked all ingredient lines");
        Ok(state)
    }

    /// Drop the persisted list entirely
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_item(&self.storage_key)?;
        info!("Shopping list cleared");
        Ok(())
    }

    pub fn stats(&self) -> ShoppingListStats {
        self.load().stats()
    }

    /// Per-category purchase progress
    pub fn category_stats(&self) -> Vec<CategoryStats> {
        category_stats(&self.load().ingredients)
    }

    pub fn contains_recipe(&self, recipe_id: RecipeId) -> bool {
        self.load().contains_recipe(recipe_id)
    }

    /// The current document, pretty-printed
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load())?)
    }

    /// Build a link to `base_url` carrying the current selection.
    ///
    /// Returns `None` when no recipe is selected. With `include_purchased`
    /// the payload also carries the keys currently marked purchased.
    pub fn generate_share_link(&self, base_url: &str, include_purchased: bool) -> Result<Option<String>> {
        let state = self.load();
        if state.selected_recipe_ids.is_empty() {
            debug!("Nothing to share");
            return Ok(None);
        }

        let purchased = if include_purchased {
            state.purchased_keys()
        } else {
            Vec::new()
        };
        let encoded =
            share_codec::encode_with_purchased(&state.selected_recipe_ids, &state.recipe_scales, purchased.iter())?;
        let link = share_codec::build_share_url(base_url, &self.share_param, &encoded)?;

        info!(
            recipes = state.selected_recipe_ids.len(),
            include_purchased,
            "Generated share link"
        );
        Ok(Some(link))
    }

    /// Apply a shared payload, replacing the stored list on success
    pub fn apply_shared<C>(&mut self, encoded: &str, catalog: &C) -> Result<SharedLinkOutcome>
    where
        C: Catalog + ?Sized,
    {
        let Some(payload) = share_codec::decode_payload(encoded) else {
            warn!("Share link payload is invalid");
            return Ok(SharedLinkOutcome::Invalid);
        };
        let Some(decoded) = share_codec::filter_against_catalog(payload, catalog) else {
            return Ok(SharedLinkOutcome::NoValidRecipes);
        };

        let mut state = share_codec::apply(&self.normalizer, &decoded, catalog);
        self.save(&mut state)?;

        info!(
            loaded = decoded.valid_count(),
            dropped = decoded.dropped_count(),
            "Applied shared shopping list"
        );
        Ok(SharedLinkOutcome::Applied {
            loaded: decoded.valid_count(),
            dropped: decoded.dropped_count(),
        })
    }

    /// Check a page URL for a share parameter and apply it.
    ///
    /// The returned URL has the parameter stripped so that reloading it does
    /// not apply the share again. An undecodable payload leaves the stored
    /// list untouched.
    pub fn apply_shared_link<C>(&mut self, page_url: &str, catalog: &C) -> Result<SharedLinkResult>
    where
        C: Catalog + ?Sized,
    {
        let Some(encoded) = share_codec::extract_share_param(page_url, &self.share_param)? else {
            return Ok(SharedLinkResult {
                outcome: SharedLinkOutcome::NotShared,
                clean_url: page_url.to_string(),
            });
        };

        let outcome = self.apply_shared(&encoded, catalog)?;
        let clean_url = share_codec::strip_share_param(page_url, &self.share_param)?;
        Ok(SharedLinkResult { outcome, clean_url })
    }
}
