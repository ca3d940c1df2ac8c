//! # Share Codec Tests
//!
//! Round trips, malformed input and legacy links through the public API.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use shopping_list::ingredient_merger::CanonicalKey;
use shopping_list::ingredient_normalizer::Normalizer;
use shopping_list::recipe_model::{Recipe, RecipeCatalog};
use shopping_list::share_codec::{apply, decode, decode_payload, encode, encode_with_purchased};

fn catalog() -> RecipeCatalog {
    RecipeCatalog::new(vec![
        Recipe::new(3, "三").with_ingredient("鸡蛋", 2.0, "个"),
        Recipe::new(7, "七").with_ingredient("鸡蛋", 1.0, "个").with_ingredient("盐", 2.0, "克"),
        Recipe::new(12, "十二").with_ingredient("纯牛奶", 100.0, "毫升"),
    ])
}

#[test]
fn test_roundtrip_preserves_ids_and_scales() {
    let ids = [3, 7, 12];
    let scales = BTreeMap::from([(3, 1.5), (7, 1.0), (12, 0.25)]);

    let encoded = encode(&ids, &scales).unwrap();
    let decoded = decode(&encoded, &catalog()).unwrap();

    assert_eq!(decoded.recipe_ids, ids.to_vec());
    assert_eq!(decoded.scales, scales);
    assert!(decoded.dropped.is_empty());
}

#[test]
fn test_decode_never_panics_on_garbage() {
    let catalog = catalog();
    for input in [
        "not-valid-base64!!",
        "",
        "%%%",
        "eyJ",
        "AAAA",
        "////",
        "%7B%7D",
        "🥚🥚🥚",
    ] {
        assert!(decode(input, &catalog).is_none(), "input: {input:?}");
    }
}

#[test]
fn test_empty_selection() {
    let encoded = encode(&[], &BTreeMap::new()).unwrap();
    assert!(decode_payload(&encoded).is_none());
    assert!(decode(&encoded, &catalog()).is_none());
}

#[test]
fn test_unknown_ids_are_dropped_and_counted() {
    let encoded = encode(&[3, 404, 12, 500], &BTreeMap::from([(12, 2.0)])).unwrap();
    let decoded = decode(&encoded, &catalog()).unwrap();

    assert_eq!(decoded.recipe_ids, vec![3, 12]);
    assert_eq!(decoded.dropped, vec![404, 500]);
    assert_eq!(decoded.scales, BTreeMap::from([(3, 1.0), (12, 2.0)]));
}

#[test]
fn test_out_of_range_scales_are_clamped_on_decode() {
    let encoded = encode(&[3, 7], &BTreeMap::from([(3, 500.0), (7, -1.0)])).unwrap();
    let payload = decode_payload(&encoded).unwrap();
    assert_eq!(payload.scales, BTreeMap::from([(3, 20.0), (7, 1.0)]));
}

#[test]
fn test_apply_recomputes_from_catalog() {
    let catalog = catalog();
    let purchased = [CanonicalKey::new("盐", "g")];
    let encoded =
        encode_with_purchased(&[3, 7], &BTreeMap::from([(3, 2.0), (7, 1.0)]), purchased.iter()).unwrap();

    let decoded = decode(&encoded, &catalog).unwrap();
    let state = apply(&Normalizer::default(), &decoded, &catalog);

    let eggs = state.find(&CanonicalKey::new("鸡蛋", "个")).unwrap();
    assert_eq!(eggs.quantity, 5.0);
    assert!(!eggs.purchased);
    assert!(state.find(&CanonicalKey::new("盐", "g")).unwrap().purchased);
    assert_eq!(state.selected_recipe_ids, vec![3, 7]);
}

#[test]
fn test_legacy_links_still_decode() {
    let catalog = catalog();

    let id_list = STANDARD.encode(r#"{"recipes":[7,12],"scales":{"7":3,"12":0.5}}"#);
    let decoded = decode(&id_list, &catalog).unwrap();
    assert_eq!(decoded.recipe_ids, vec![7, 12]);
    assert_eq!(decoded.scales, BTreeMap::from([(7, 3.0), (12, 0.5)]));

    let objects = STANDARD.encode(
        "%7B%22recipes%22%3A%5B%7B%22id%22%3A3%2C%22scale%22%3A2%7D%5D%2C\
         %22ingredients%22%3A%5B%7B%22name%22%3A%22%E9%B8%A1%E8%9B%8B%22%2C\
         %22unit%22%3A%22%E4%B8%AA%22%2C%22purchased%22%3Atrue%7D%5D%7D",
    );
    let decoded = decode(&objects, &catalog).unwrap();
    assert_eq!(decoded.recipe_ids, vec![3]);
    assert_eq!(decoded.scales[&3], 2.0);
    assert!(decoded.purchased.contains(&CanonicalKey::new("鸡蛋", "个")));
}
