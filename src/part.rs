// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core part and build data structures and types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category a part belongs to
///
/// The first eight categories participate in compatibility rules. A monitor
/// can be tracked in a build (and counts toward its price) but is never
/// examined by any rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum PartCategory {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Storage,
    Psu,
    Case,
    Cooling,
    Monitor,
}

/// The eight categories covered by compatibility rules, in the order the
/// report builder walks them
pub const COMPAT_CATEGORIES: [PartCategory; 8] = [
    PartCategory::Cpu,
    PartCategory::Gpu,
    PartCategory::Motherboard,
    PartCategory::Ram,
    PartCategory::Storage,
    PartCategory::Psu,
    PartCategory::Case,
    PartCategory::Cooling,
];

impl PartCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartCategory::Cpu => "cpu",
            PartCategory::Gpu => "gpu",
            PartCategory::Motherboard => "motherboard",
            PartCategory::Ram => "ram",
            PartCategory::Storage => "storage",
            PartCategory::Psu => "psu",
            PartCategory::Case => "case",
            PartCategory::Cooling => "cooling",
            PartCategory::Monitor => "monitor",
        }
    }
}

impl std::fmt::Display for PartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single attribute value in a part's spec bag
///
/// Catalog data is schema-less per category; any attribute may be missing or
/// carry an unexpected type. The accessor layer in `specs.rs` absorbs that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Number(f64),
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

/// An immutable catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Opaque catalog identifier
    pub id: String,

    /// Category this part belongs to
    pub category: PartCategory,

    /// Manufacturer brand
    pub brand: String,

    /// Product name
    pub name: String,

    /// Price in the build's currency, always non-negative
    pub price: f64,

    /// Free-form attribute bag; semantics vary by category
    #[serde(default)]
    pub specs: HashMap<String, SpecValue>,
}

impl Part {
    /// "Brand Name" label used in issue texts and prompts
    pub fn label(&self) -> String {
        format!("{} {}", self.brand, self.name)
    }
}

/// The user's current selection: one optional part per category
///
/// A build is a value object assembled by the caller. Evaluation never
/// mutates it; every report is computed fresh from this snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Build {
    /// Display name for the build
    #[serde(default)]
    pub name: String,

    /// Currency tag for all prices in this build
    #[serde(default = "default_currency")]
    pub currency: String,

    pub cpu: Option<Part>,
    pub gpu: Option<Part>,
    pub motherboard: Option<Part>,
    pub ram: Option<Part>,
    pub storage: Option<Part>,
    pub psu: Option<Part>,
    pub case: Option<Part>,
    pub cooling: Option<Part>,
    pub monitor: Option<Part>,
}

fn default_currency() -> String {
    "INR".to_string()
}

impl Build {
    pub fn slot(&self, category: PartCategory) -> Option<&Part> {
        match category {
            PartCategory::Cpu => self.cpu.as_ref(),
            PartCategory::Gpu => self.gpu.as_ref(),
            PartCategory::Motherboard => self.motherboard.as_ref(),
            PartCategory::Ram => self.ram.as_ref(),
            PartCategory::Storage => self.storage.as_ref(),
            PartCategory::Psu => self.psu.as_ref(),
            PartCategory::Case => self.case.as_ref(),
            PartCategory::Cooling => self.cooling.as_ref(),
            PartCategory::Monitor => self.monitor.as_ref(),
        }
    }

    pub fn set_slot(&mut self, category: PartCategory, part: Option<Part>) {
        match category {
            PartCategory::Cpu => self.cpu = part,
            PartCategory::Gpu => self.gpu = part,
            PartCategory::Motherboard => self.motherboard = part,
            PartCategory::Ram => self.ram = part,
            PartCategory::Storage => self.storage = part,
            PartCategory::Psu => self.psu = part,
            PartCategory::Case => self.case = part,
            PartCategory::Cooling => self.cooling = part,
            PartCategory::Monitor => self.monitor = part,
        }
    }

    /// Sum of prices across all filled slots, monitor included
    pub fn total_price(&self) -> f64 {
        let mut total = 0.0;
        for category in COMPAT_CATEGORIES {
            if let Some(part) = self.slot(category) {
                total += part.price;
            }
        }
        if let Some(monitor) = &self.monitor {
            total += monitor.price;
        }
        total
    }

    /// Filled slots among the eight rule-relevant categories
    pub fn parts_count(&self) -> usize {
        COMPAT_CATEGORIES
            .iter()
            .filter(|c| self.slot(**c).is_some())
            .count()
    }
}

/// Severity of a rule verdict
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Pass,
    Warn,
    Fail,
}

/// One rule's verdict on a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable rule identifier (e.g. "socket-mismatch"); identical inputs
    /// always produce the identical id
    pub id: String,

    /// Severity level
    pub severity: Severity,

    /// Category this issue primarily concerns
    pub category: PartCategory,

    /// Short headline
    pub title: String,

    /// Explanation with concrete numbers substituted in
    pub detail: String,

    /// Actionable remediation text
    pub suggested_fix: String,

    /// Categories involved, one or two entries
    pub affected_parts: Vec<PartCategory>,
}

/// Aggregate verdict on a whole build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// CPU TDP + GPU TDP + fixed overhead for board, storage and fans
    pub estimated_wattage: u32,

    /// Estimated wattage scaled by the safety factor, rounded up
    pub recommended_psu: u32,

    /// Findings in rule evaluation order
    pub issues: Vec<Issue>,

    /// 0-100, higher is better
    pub score: u32,

    /// Sum over all filled slots, monitor included
    pub total_price: f64,

    /// Filled slots out of the eight rule-relevant categories
    pub parts_count: usize,
}

impl CompatibilityReport {
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Fail)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warn)
    }
}

/// Where a set of suggestions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Ai,
    Heuristic,
}

impl std::fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionSource::Ai => write!(f, "ai"),
            SuggestionSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// A ranked part recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Catalog id of the suggested part
    pub id: String,

    /// The suggested part itself
    pub part: Part,

    /// One-sentence justification
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(category: PartCategory, price: f64) -> Part {
        Part {
            id: format!("{}-1", category),
            category,
            brand: "Test".to_string(),
            name: category.as_str().to_uppercase(),
            price,
            specs: HashMap::new(),
        }
    }

    #[test]
    fn test_total_price_includes_monitor() {
        let mut build = Build::default();
        build.cpu = Some(part(PartCategory::Cpu, 25000.0));
        build.gpu = Some(part(PartCategory::Gpu, 55000.0));
        build.monitor = Some(part(PartCategory::Monitor, 15000.0));

        assert_eq!(build.total_price(), 95000.0);
    }

    #[test]
    fn test_parts_count_excludes_monitor() {
        let mut build = Build::default();
        build.cpu = Some(part(PartCategory::Cpu, 25000.0));
        build.monitor = Some(part(PartCategory::Monitor, 15000.0));

        assert_eq!(build.parts_count(), 1);
    }

    #[test]
    fn test_slot_roundtrip() {
        let mut build = Build::default();
        build.set_slot(PartCategory::Psu, Some(part(PartCategory::Psu, 6000.0)));

        assert!(build.slot(PartCategory::Psu).is_some());
        build.set_slot(PartCategory::Psu, None);
        assert!(build.slot(PartCategory::Psu).is_none());
    }

    #[test]
    fn test_spec_value_parses_untagged() {
        let json = r#"{"socket": "AM5", "tdp": 105, "integrated_graphics": true, "socket_support": ["AM5", "LGA1700"]}"#;
        let specs: HashMap<String, SpecValue> = serde_json::from_str(json).unwrap();

        assert_eq!(specs["socket"], SpecValue::Text("AM5".to_string()));
        assert_eq!(specs["tdp"], SpecValue::Number(105.0));
        assert_eq!(specs["integrated_graphics"], SpecValue::Flag(true));
        assert_eq!(
            specs["socket_support"],
            SpecValue::List(vec!["AM5".to_string(), "LGA1700".to_string()])
        );
    }

    #[test]
    fn test_build_deserializes_with_defaults() {
        let build: Build = serde_json::from_str(r#"{"name": "My rig"}"#).unwrap();

        assert_eq!(build.name, "My rig");
        assert_eq!(build.currency, "INR");
        assert_eq!(build.parts_count(), 0);
    }
}
