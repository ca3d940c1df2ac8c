//! # Shopping List
//!
//! Turns a set of selected recipes, each with its own portion scale, into
//! one deduplicated and categorized shopping list. The list is persisted in
//! a key-value store, can be rescaled and edited incrementally, and can be
//! shared through a compact URL parameter.

pub mod config;
pub mod db;
pub mod errors;
pub mod ingredient_merger;
pub mod ingredient_normalizer;
pub mod localization;
pub mod normalization_tables;
pub mod nutrition;
pub mod recipe_model;
pub mod scale;
pub mod share_codec;
pub mod shopping_list;
pub mod storage;
