// SPDX-License-Identifier: AGPL-3.0-or-later

//! Budget allocation across part categories
//!
//! Fixed percentage tables per use-case, weighted toward the GPU for gaming
//! and toward CPU/RAM for coding. Each table sums to 1.0 across the eight
//! rule-relevant categories.

use std::collections::HashMap;

use crate::part::PartCategory;
use crate::ranker::UseCase;

type Table = [(PartCategory, f64); 8];

const GAMING: Table = [
    (PartCategory::Cpu, 0.18),
    (PartCategory::Gpu, 0.35),
    (PartCategory::Motherboard, 0.12),
    (PartCategory::Ram, 0.08),
    (PartCategory::Storage, 0.10),
    (PartCategory::Psu, 0.07),
    (PartCategory::Case, 0.06),
    (PartCategory::Cooling, 0.04),
];

const EDITING: Table = [
    (PartCategory::Cpu, 0.25),
    (PartCategory::Gpu, 0.25),
    (PartCategory::Motherboard, 0.12),
    (PartCategory::Ram, 0.12),
    (PartCategory::Storage, 0.10),
    (PartCategory::Psu, 0.07),
    (PartCategory::Case, 0.05),
    (PartCategory::Cooling, 0.04),
];

const CODING: Table = [
    (PartCategory::Cpu, 0.25),
    (PartCategory::Gpu, 0.15),
    (PartCategory::Motherboard, 0.12),
    (PartCategory::Ram, 0.15),
    (PartCategory::Storage, 0.12),
    (PartCategory::Psu, 0.07),
    (PartCategory::Case, 0.08),
    (PartCategory::Cooling, 0.06),
];

const OFFICE: Table = [
    (PartCategory::Cpu, 0.22),
    (PartCategory::Gpu, 0.15),
    (PartCategory::Motherboard, 0.15),
    (PartCategory::Ram, 0.12),
    (PartCategory::Storage, 0.12),
    (PartCategory::Psu, 0.08),
    (PartCategory::Case, 0.10),
    (PartCategory::Cooling, 0.06),
];

fn table(use_case: UseCase) -> &'static Table {
    match use_case {
        UseCase::Gaming => &GAMING,
        UseCase::Editing => &EDITING,
        UseCase::Coding => &CODING,
        UseCase::Office => &OFFICE,
    }
}

/// Split a total budget into per-category price ceilings
///
/// `None` budget means unconstrained: an empty map, no ceilings applied.
/// Ceilings are rounded to the nearest currency unit.
pub fn allocate(total_budget: Option<f64>, use_case: UseCase) -> HashMap<PartCategory, f64> {
    let Some(total) = total_budget else {
        return HashMap::new();
    };

    table(use_case)
        .iter()
        .map(|(category, share)| (*category, (total * share).round()))
        .collect()
}
