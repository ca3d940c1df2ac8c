//! # Share Codec
//!
//! Encodes the minimal shopping list state (selected recipe ids, their
//! scales, optionally the purchased keys) into a URL-safe string and back.
//!
//! ## Wire format
//!
//! The current format is a compact JSON object
//! `{"r":[[id,scale],...],"p":[[name,unit],...]}`, raw-deflated and encoded
//! as unpadded URL-safe base64. Two older formats are still accepted on
//! decode:
//!
//! - standard base64 of `{"recipes":[ids],"scales":{"id":scale}}`, possibly
//!   percent-encoded once more
//! - standard base64 of the percent-encoded
//!   `{"recipes":[{"id":..,"scale":..}],"ingredients":[{"name","unit","purchased"}]}`
//!
//! Ingredient quantities are never read from a payload. [`apply`] always
//! re-derives the list from the current catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::errors::Result;
use crate::ingredient_merger::{collect, merge, CanonicalKey};
use crate::ingredient_normalizer::Normalizer;
use crate::recipe_model::{Catalog, RecipeId};
use crate::scale::{normalize_scale, normalize_scale_opt, normalize_scale_value, DEFAULT_SCALE};
use crate::shopping_list::ShoppingListState;

/// Upper bound on the inflated payload size
const MAX_PAYLOAD_BYTES: u64 = 64 * 1024;

/// Query parameter carrying the encoded payload
pub const DEFAULT_SHARE_PARAM: &str = "share";

/// A decoded payload, before checking ids against the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharePayload {
    pub recipe_ids: Vec<RecipeId>,
    pub scales: BTreeMap<RecipeId, f64>,
    /// Purchased `(name, unit)` pairs as the sender wrote them
    pub purchased: BTreeSet<CanonicalKey>,
}

/// A payload filtered against the current catalog
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedShare {
    /// Ids present in the catalog, in payload order
    pub recipe_ids: Vec<RecipeId>,
    /// Normalized scale for every valid id
    pub scales: BTreeMap<RecipeId, f64>,
    /// Keys the sender had marked purchased, not yet normalized
    pub purchased: BTreeSet<CanonicalKey>,
    /// Ids the catalog no longer knows
    pub dropped: Vec<RecipeId>,
}

impl DecodedShare {
    pub fn valid_count(&self) -> usize {
        self.recipe_ids.len()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CompactPayload {
    r: Vec<(RecipeId, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    p: Vec<(String, String)>,
}

/// Encode selected ids with their scales.
///
/// A missing scale is written as 1.
pub fn encode(selected_recipe_ids: &[RecipeId], recipe_scales: &BTreeMap<RecipeId, f64>) -> Result<String> {
    encode_with_purchased(selected_recipe_ids, recipe_scales, std::iter::empty())
}

/// Encode selected ids, scales and the keys currently marked purchased
pub fn encode_with_purchased<'a, I>(
    selected_recipe_ids: &[RecipeId],
    recipe_scales: &BTreeMap<RecipeId, f64>,
    purchased: I,
) -> Result<String>
where
    I: IntoIterator<Item = &'a CanonicalKey>,
{
    let payload = CompactPayload {
        r: selected_recipe_ids
            .iter()
            .map(|&id| (id, normalize_scale_opt(recipe_scales.get(&id).copied())))
            .collect(),
        p: purchased
            .into_iter()
            .map(|key| (key.name.clone(), key.unit.clone()))
            .collect(),
    };

    let json = serde_json::to_vec(&payload)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let encoded = URL_SAFE_NO_PAD.encode(compressed);
    debug!(
        recipes = payload.r.len(),
        json_bytes = json.len(),
        encoded_len = encoded.len(),
        "Encoded share payload"
    );
    Ok(encoded)
}

/// Decode a payload without consulting the catalog.
///
/// Returns `None` for anything malformed and for payloads selecting no
/// recipe. Never panics on untrusted input.
pub fn decode_payload(encoded: &str) -> Option<SharePayload> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }

    let payload = decode_compact(encoded).or_else(|| {
        debug!("Not a compact share payload, trying legacy formats");
        decode_legacy(encoded)
    })?;

    if payload.recipe_ids.is_empty() {
        debug!("Share payload selects no recipes");
        return None;
    }
    Some(payload)
}

/// Decode a payload and keep only ids the catalog still holds.
///
/// Returns `None` when the payload is malformed or none of its ids exist.
pub fn decode<C>(encoded: &str, catalog: &C) -> Option<DecodedShare>
where
    C: Catalog + ?Sized,
{
    filter_against_catalog(decode_payload(encoded)?, catalog)
}

/// Split payload ids into those the catalog knows and those it dropped
pub fn filter_against_catalog<C>(payload: SharePayload, catalog: &C) -> Option<DecodedShare>
where
    C: Catalog + ?Sized,
{
    let (recipe_ids, dropped): (Vec<RecipeId>, Vec<RecipeId>) =
        payload.recipe_ids.iter().copied().partition(|&id| catalog.contains(id));

    if recipe_ids.is_empty() {
        warn!(dropped = dropped.len(), "No recipe in the share payload exists in the catalog");
        return None;
    }
    if !dropped.is_empty() {
        warn!(?dropped, "Skipping shared recipes missing from the catalog");
    }

    let scales = recipe_ids
        .iter()
        .map(|&id| (id, normalize_scale_opt(payload.scales.get(&id).copied())))
        .collect();

    Some(DecodedShare {
        recipe_ids,
        scales,
        purchased: payload.purchased,
        dropped,
    })
}

/// Build the shopping list a decoded share describes.
///
/// Quantities come from the current catalog at the shared scales; shared
/// purchase flags are normalized with `normalizer`, overlaid by key, and
/// unmatched lines stay unpurchased.
pub fn apply<C>(normalizer: &Normalizer, decoded: &DecodedShare, catalog: &C) -> ShoppingListState
where
    C: Catalog + ?Sized,
{
    let items = collect(normalizer, &decoded.recipe_ids, catalog, &decoded.scales);
    let mut ingredients = merge(normalizer, items);

    let purchased: BTreeSet<CanonicalKey> = decoded
        .purchased
        .iter()
        .map(|key| CanonicalKey::normalized(normalizer, &key.name, &key.unit))
        .collect();
    for line in ingredients.iter_mut() {
        line.purchased = purchased.contains(&line.key());
    }

    ShoppingListState {
        ingredients,
        selected_recipe_ids: decoded.recipe_ids.clone(),
        recipe_scales: decoded.scales.clone(),
        last_updated: None,
    }
}

fn decode_compact(encoded: &str) -> Option<SharePayload> {
    let compressed = URL_SAFE_NO_PAD.decode(encoded).ok()?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_PAYLOAD_BYTES + 1)
        .read_to_end(&mut json)
        .ok()?;
    if json.len() as u64 > MAX_PAYLOAD_BYTES {
        warn!(limit = MAX_PAYLOAD_BYTES, "Share payload exceeds the size limit");
        return None;
    }

    let compact: CompactPayload = serde_json::from_slice(&json).ok()?;

    let mut payload = SharePayload::default();
    for (id, scale) in compact.r {
        push_recipe(&mut payload, id, normalize_scale(scale));
    }
    payload.purchased = compact
        .p
        .into_iter()
        .map(|(name, unit)| CanonicalKey { name, unit })
        .collect();
    Some(payload)
}

fn decode_legacy(encoded: &str) -> Option<SharePayload> {
    let unescaped = percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| encoded.to_string());
    // Query-string decoding may have turned '+' into spaces
    let base64_text = unescaped.replace(' ', "+");

    let bytes = STANDARD
        .decode(&base64_text)
        .or_else(|_| STANDARD_NO_PAD.decode(base64_text.trim_end_matches('=')))
        .ok()?;
    let text = String::from_utf8(bytes).ok()?;

    let value: Value = serde_json::from_str(&text).ok().or_else(|| {
        let inner = percent_decode_str(&text).decode_utf8().ok()?;
        serde_json::from_str(&inner).ok()
    })?;

    parse_legacy_value(&value)
}

fn parse_legacy_value(value: &Value) -> Option<SharePayload> {
    let recipes = value.get("recipes")?.as_array()?;
    let scales = value.get("scales").and_then(Value::as_object);

    let mut payload = SharePayload::default();
    for entry in recipes {
        match entry {
            Value::Object(fields) => {
                let Some(id) = fields.get("id").and_then(coerce_recipe_id) else {
                    continue;
                };
                let scale = fields
                    .get("scale")
                    .map(normalize_scale_value)
                    .unwrap_or(DEFAULT_SCALE);
                push_recipe(&mut payload, id, scale);
            }
            other => {
                let Some(id) = coerce_recipe_id(other) else {
                    continue;
                };
                let scale = scales
                    .and_then(|map| map.get(&id.to_string()))
                    .map(normalize_scale_value)
                    .unwrap_or(DEFAULT_SCALE);
                push_recipe(&mut payload, id, scale);
            }
        }
    }

    // Names stay as the sender stored them until `apply` normalizes them
    if let Some(ingredients) = value.get("ingredients").and_then(Value::as_array) {
        payload.purchased = ingredients
            .iter()
            .filter(|line| line.get("purchased").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|line| {
                let name = line.get("name")?.as_str()?;
                let unit = line.get("unit").and_then(Value::as_str).unwrap_or("");
                Some(CanonicalKey::new(name, unit))
            })
            .collect();
    }

    Some(payload)
}

fn push_recipe(payload: &mut SharePayload, id: RecipeId, scale: f64) {
    if payload.recipe_ids.contains(&id) {
        return;
    }
    payload.recipe_ids.push(id);
    payload.scales.insert(id, scale);
}

/// Read a recipe id from loosely typed JSON (integers, integral floats, numeric strings)
pub(crate) fn coerce_recipe_id(value: &Value) -> Option<RecipeId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Append the encoded payload to a page URL as a query parameter
pub fn build_share_url(base_url: &str, param: &str, encoded: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut().append_pair(param, encoded);
    Ok(url.to_string())
}

/// The share parameter of a page URL, if present and non-empty
pub fn extract_share_param(page_url: &str, param: &str) -> Result<Option<String>> {
    let url = Url::parse(page_url)?;
    Ok(url
        .query_pairs()
        .find(|(key, value)| key == param && !value.is_empty())
        .map(|(_, value)| value.into_owned()))
}

/// The page URL with the share parameter removed, other parameters kept
pub fn strip_share_param(page_url: &str, param: &str) -> Result<String> {
    let mut url = Url::parse(page_url)?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }
    Ok(url.to_string())
}
