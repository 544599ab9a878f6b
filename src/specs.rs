// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed accessors over a part's free-form spec bag
//!
//! Catalog data is not guaranteed to carry any attribute, and the types vary
//! between imports. Absence and mistyping are valid states here: accessors
//! fall back to neutral defaults so rules degrade to "not applicable" instead
//! of erroring the whole evaluation.

use crate::part::{Part, SpecValue};

impl Part {
    /// Numeric attribute, 0.0 when absent or non-numeric
    ///
    /// Numeric-looking strings ("650", "650W") are parsed from their leading
    /// digits.
    pub fn numeric_spec(&self, key: &str) -> f64 {
        match self.specs.get(key) {
            Some(SpecValue::Number(n)) => *n,
            Some(SpecValue::Text(s)) => parse_leading_number(s),
            _ => 0.0,
        }
    }

    /// String attribute, lower-cased and trimmed, empty when absent
    pub fn string_spec(&self, key: &str) -> String {
        match self.specs.get(key) {
            Some(SpecValue::Text(s)) => s.trim().to_lowercase(),
            _ => String::new(),
        }
    }

    /// Boolean attribute; `None` when absent or not a flag
    pub fn flag_spec(&self, key: &str) -> Option<bool> {
        match self.specs.get(key) {
            Some(SpecValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// List attribute, empty when absent
    pub fn list_spec(&self, key: &str) -> Vec<String> {
        match self.specs.get(key) {
            Some(SpecValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// First non-zero numeric attribute among aliased keys
    ///
    /// Catalog imports disagree on key naming (length_mm vs length,
    /// max_gpu_length vs maxGpuLength).
    pub fn numeric_spec_any(&self, keys: &[&str]) -> f64 {
        for key in keys {
            let value = self.numeric_spec(key);
            if value != 0.0 {
                return value;
            }
        }
        0.0
    }

    /// First non-empty string attribute among aliased keys
    pub fn string_spec_any(&self, keys: &[&str]) -> String {
        for key in keys {
            let value = self.string_spec(key);
            if !value.is_empty() {
                return value;
            }
        }
        String::new()
    }
}

fn parse_leading_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0.0)
}
