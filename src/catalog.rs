// SPDX-License-Identifier: AGPL-3.0-or-later

//! Parts catalog loading and queries
//!
//! The catalog is an in-memory collection loaded from a JSON array of parts.
//! Query shapes: all parts of a category, attribute equality within a
//! category, and a per-category price ceiling. Catalog order is preserved so
//! that ranking ties stay deterministic.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use crate::part::{Part, PartCategory};

/// Keyed collection of catalog parts
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    parts: Vec<Part>,
}

impl Catalog {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
        let parts: Vec<Part> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog from {}", path.display()))?;

        for part in &parts {
            if part.price < 0.0 {
                bail!(
                    "Catalog part '{}' has negative price {}",
                    part.id,
                    part.price
                );
            }
        }

        info!(parts = parts.len(), "Loaded catalog");
        Ok(Self { parts })
    }

    /// All parts of a category, in catalog order
    pub fn of_category(&self, category: PartCategory) -> Vec<&Part> {
        self.parts
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Parts of a category whose string attribute equals a value
    /// (case-insensitive)
    pub fn with_spec_eq(&self, category: PartCategory, key: &str, value: &str) -> Vec<&Part> {
        let wanted = value.trim().to_lowercase();
        self.parts
            .iter()
            .filter(|p| p.category == category && p.string_spec(key) == wanted)
            .collect()
    }

}
