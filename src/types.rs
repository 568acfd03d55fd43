//! Core catalog types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The elemental categories of the catalog domain.
pub const KNOWN_CATEGORIES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Check whether a category name is one of [`KNOWN_CATEGORIES`]
pub fn is_known_category(name: &str) -> bool {
    let name = normalize_category(name);
    KNOWN_CATEGORIES.iter().any(|c| *c == name)
}

/// Trim and lowercase a category name for use as a cache key
pub fn normalize_category(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A fully hydrated catalog entity
///
/// Identity is `id`. Entities are immutable once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub name: String,
    /// Official artwork URL (may be empty when the API has none)
    pub sprite_url: String,
    /// Category names in slot order
    pub categories: Vec<String>,
    pub stats: Vec<Stat>,
    pub traits: Vec<EntityTrait>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
}

impl Entity {
    /// Case-insensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Whether this entity belongs to `category`
    pub fn has_category(&self, category: &str) -> bool {
        let category = normalize_category(category);
        self.categories.iter().any(|c| *c == category)
    }
}

/// A named base stat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

/// A named trait (ability); hidden traits are only obtainable in special ways
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTrait {
    pub name: String,
    pub hidden: bool,
}

/// One row of the name directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDirectoryEntry {
    pub id: u32,
    pub name: String,
}

/// The closed set of ids this core manages: `1..=size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Universe {
    size: u32,
}

impl Universe {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= 1 && id <= self.size
    }

    /// Every id in ascending order
    pub fn ids(&self) -> Vec<u32> {
        (1..=self.size).collect()
    }
}

/// Current filter criteria of the view, replaced wholesale on each change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive name prefix; empty means no search filter
    pub search_prefix: String,
    /// Restrict to the favorites set
    pub favorites_only: bool,
    /// Categories an entity must ALL belong to; empty means no category filter
    pub categories: BTreeSet<String>,
}

impl FilterCriteria {
    /// Whether any filter is active
    pub fn is_active(&self) -> bool {
        !self.search_prefix.trim().is_empty() || self.favorites_only || !self.categories.is_empty()
    }
}
