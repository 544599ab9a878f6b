// SPDX-License-Identifier: AGPL-3.0-or-later

//! Heuristic candidate ranking
//!
//! Per-category desirability score over the attributes that matter most for
//! that category, with use-case multipliers biasing toward the stated
//! workload. Sorting is stable and descending; ties keep catalog order. No
//! randomization anywhere, so identical inputs rank identically.

use crate::part::{Part, PartCategory, Suggestion};

/// Stated workload for a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum UseCase {
    #[default]
    Gaming,
    Editing,
    Coding,
    Office,
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCase::Gaming => write!(f, "gaming"),
            UseCase::Editing => write!(f, "editing"),
            UseCase::Coding => write!(f, "coding"),
            UseCase::Office => write!(f, "office"),
        }
    }
}

/// Category-specific desirability score for one candidate
pub fn heuristic_score(part: &Part, category: PartCategory, use_case: UseCase) -> f64 {
    let mut score = 0.0;

    match category {
        PartCategory::Cpu => {
            score += part.numeric_spec("cores") * 10.0;
            score += part.numeric_spec("boost_clock") * 5.0;
            score += part.numeric_spec("threads") * 3.0;
            if use_case == UseCase::Gaming {
                score += part.numeric_spec("boost_clock") * 10.0;
            }
            if use_case == UseCase::Editing || use_case == UseCase::Coding {
                score += part.numeric_spec("cores") * 5.0;
            }
        }
        PartCategory::Gpu => {
            score += part.numeric_spec("vram") * 15.0;
            score += part.numeric_spec("tdp") * 2.0;
            if use_case == UseCase::Gaming {
                score *= 1.5;
            }
        }
        PartCategory::Motherboard => {
            score += part.numeric_spec("m2_slots") * 10.0;
            score += part.numeric_spec("ram_slots") * 5.0;
        }
        PartCategory::Ram => {
            score += part.numeric_spec("capacity_gb") * 5.0;
            score += part.numeric_spec("speed_mhz") / 100.0;
            if use_case == UseCase::Editing {
                score += part.numeric_spec("capacity_gb") * 3.0;
            }
        }
        PartCategory::Storage => {
            score += part.numeric_spec("capacity_gb") / 10.0;
            score += part.numeric_spec("read_speed") / 100.0;
        }
        PartCategory::Psu => {
            score += part.numeric_spec("wattage") / 10.0;
        }
        PartCategory::Cooling => {
            score += part.numeric_spec_any(&["tdp_rating", "tdpRating"]) / 5.0;
        }
        // No formula; catalog order decides
        PartCategory::Case | PartCategory::Monitor => {}
    }

    score
}

/// Order candidates by descending heuristic score, catalog order on ties
pub fn rank(candidates: &[Part], category: PartCategory, use_case: UseCase) -> Vec<Suggestion> {
    let mut scored: Vec<(f64, &Part)> = candidates
        .iter()
        .map(|part| (heuristic_score(part, category, use_case), part))
        .collect();

    // Stable sort keeps ties in catalog order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .map(|(_, part)| Suggestion {
            id: part.id.clone(),
            part: part.clone(),
            reason: "Highest specs in this category among compatible options.".to_string(),
        })
        .collect()
}
