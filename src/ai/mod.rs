// SPDX-License-Identifier: AGPL-3.0-or-later

//! AI-augmented ranking over an external chat-completions service
//!
//! The service is an untrusted oracle: its reply is free-form text that
//! should contain one JSON object of one-based picks into the candidate
//! lists we sent. Everything here validates strictly — wrong shape, index
//! out of bounds, duplicate picks, or too few resolved categories all reject
//! the reply as a whole, and the caller falls back to the heuristic ranker.
//! A rejection is never an error, only a provenance change.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::part::{Build, Part, PartCategory, COMPAT_CATEGORIES};
use crate::ranker::UseCase;

pub mod client;

/// Minimum categories the whole-build ranker must resolve before its answer
/// is accepted instead of falling back
pub const BUILD_QUORUM: usize = 4;

/// Candidates sent per category for whole-build ranking
pub const BUILD_CANDIDATES_PER_CATEGORY: usize = 5;

/// Candidates sent for single-category suggestions
pub const SUGGEST_CANDIDATES: usize = 10;

/// One completion round-trip against the ranking service
///
/// Implementations must not retry: a single failure is terminal for the
/// request and triggers fallback.
#[async_trait]
pub trait RankingBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Ranking service configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Bearer credential for the service
    pub api_key: String,
    /// OpenAI-compatible API root
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

impl AiConfig {
    /// Read configuration from the environment
    ///
    /// `None` when no credential is present: the engine counts as
    /// unconfigured and every AI path falls back to the heuristic ranker.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RIGCHECK_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        Some(Self {
            api_key,
            base_url: std::env::var("RIGCHECK_AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
            model: std::env::var("RIGCHECK_AI_MODEL")
                .unwrap_or_else(|_| "deepseek-chat".to_string()),
        })
    }
}

/// Backend from environment config, `None` when unconfigured
pub fn backend_from_env() -> Option<Box<dyn RankingBackend>> {
    let config = AiConfig::from_env()?;
    match client::ChatClient::new(config) {
        Ok(client) => Some(Box::new(client)),
        Err(_) => None,
    }
}

/// A single one-based pick into a candidate list
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Pick {
    pub index: usize,
    pub reason: String,
}

/// Strict parse outcome for a service reply
///
/// All-or-(quorum)-nothing: a partially valid pick list must never produce
/// an incoherent build, so anything ambiguous lands in `Rejected`.
#[derive(Debug, PartialEq)]
pub enum PickParse<T> {
    Parsed(T),
    Rejected(String),
}

#[derive(Deserialize)]
struct CategoryPicks {
    picks: Vec<Pick>,
}

#[derive(Deserialize)]
struct BuildPicks {
    picks: BTreeMap<PartCategory, Pick>,
}

/// Extract the first top-level JSON object from free-form text
///
/// The service may prepend commentary, so the body cannot be assumed to be
/// pure JSON. Brace matching skips string contents and escapes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a flat pick list for a single-category suggestion
///
/// Rejects when no JSON is extractable, the shape is wrong, the list is
/// empty, any index falls outside `1..=candidate_count`, or an index
/// repeats. Valid picks are truncated to `want`.
pub fn parse_category_picks(
    text: &str,
    candidate_count: usize,
    want: usize,
) -> PickParse<Vec<Pick>> {
    let Some(json) = extract_json_object(text) else {
        return PickParse::Rejected("no JSON object in response".to_string());
    };

    let parsed: CategoryPicks = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(err) => return PickParse::Rejected(format!("unexpected response shape: {err}")),
    };

    if parsed.picks.is_empty() {
        return PickParse::Rejected("empty pick list".to_string());
    }

    let mut seen = HashSet::new();
    for pick in &parsed.picks {
        if pick.index == 0 || pick.index > candidate_count {
            return PickParse::Rejected(format!(
                "pick index {} outside 1..={}",
                pick.index, candidate_count
            ));
        }
        if !seen.insert(pick.index) {
            return PickParse::Rejected(format!("duplicate pick index {}", pick.index));
        }
    }

    PickParse::Parsed(parsed.picks.into_iter().take(want).collect())
}

/// Parse per-category picks for whole-build generation
///
/// A category resolves when it is present with an index inside its own
/// candidate count. Fewer than [`BUILD_QUORUM`] resolved categories rejects
/// the reply.
pub fn parse_build_picks(
    text: &str,
    counts: &BTreeMap<PartCategory, usize>,
) -> PickParse<BTreeMap<PartCategory, Pick>> {
    let Some(json) = extract_json_object(text) else {
        return PickParse::Rejected("no JSON object in response".to_string());
    };

    let parsed: BuildPicks = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(err) => return PickParse::Rejected(format!("unexpected response shape: {err}")),
    };

    let mut resolved = BTreeMap::new();
    for (category, pick) in parsed.picks {
        let count = counts.get(&category).copied().unwrap_or(0);
        if pick.index >= 1 && pick.index <= count {
            resolved.insert(category, pick);
        }
    }

    if resolved.len() < BUILD_QUORUM {
        return PickParse::Rejected(format!(
            "only {} of {} categories resolved, quorum is {}",
            resolved.len(),
            COMPAT_CATEGORIES.len(),
            BUILD_QUORUM
        ));
    }

    PickParse::Parsed(resolved)
}

/// "cpu: AMD Ryzen 7 7700" lines for the filled slots of a build
pub fn build_summary(build: &Build) -> String {
    let lines: Vec<String> = COMPAT_CATEGORIES
        .iter()
        .filter_map(|category| {
            build
                .slot(*category)
                .map(|part| format!("{}: {}", category, part.label()))
        })
        .collect();

    if lines.is_empty() {
        "(empty)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Numbered candidate lines with compact spec JSON
pub fn candidate_lines(candidates: &[Part]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let specs = serde_json::to_string(&part.specs).unwrap_or_else(|_| "{}".to_string());
            format!("{}. {} | specs: {}", i + 1, part.label(), specs)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// System/user prompt pair for a single-category suggestion
pub fn suggest_prompts(
    build: &Build,
    candidates: &[Part],
    target: PartCategory,
) -> (String, String) {
    let system = format!(
        "You are a PC building expert. Given a partial build and candidate parts, \
pick the top 3 best {target} options and explain why in 1 sentence each.\n\
Respond with ONLY valid JSON:\n\
{{ \"picks\": [ {{ \"index\": 1, \"reason\": \"...\" }}, {{ \"index\": 2, \"reason\": \"...\" }}, {{ \"index\": 3, \"reason\": \"...\" }} ] }}\n\
index is the 1-based position from the candidates list."
    );

    let user = format!(
        "Current build:\n{}\n\nCandidate {} parts:\n{}\n\nPick the best 3.",
        build_summary(build),
        target,
        candidate_lines(candidates)
    );

    (system, user)
}

/// System/user prompt pair for whole-build generation
pub fn wizard_prompts(
    pools: &BTreeMap<PartCategory, Vec<Part>>,
    use_case: UseCase,
    platform_label: &str,
    budget: Option<f64>,
) -> (String, String) {
    let budget_note = match budget {
        Some(amount) => format!("Budget: {amount:.0}"),
        None => "No budget limit".to_string(),
    };

    let candidate_summary = COMPAT_CATEGORIES
        .iter()
        .map(|category| {
            let lines = pools
                .get(category)
                .map(|parts| candidate_lines(parts))
                .unwrap_or_default();
            format!("{}:\n{}", category.as_str().to_uppercase(), lines)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let schema = COMPAT_CATEGORIES
        .iter()
        .map(|category| format!("    \"{category}\": {{ \"index\": 1, \"reason\": \"...\" }}"))
        .collect::<Vec<_>>()
        .join(",\n");

    let system = format!(
        "You are a PC building expert. Given candidates per category, pick the best combo \
for a {use_case} build on {platform_label} platform. {budget_note}.\n\
CRITICAL: Ensure CPU socket matches motherboard socket. Ensure RAM type matches motherboard RAM type.\n\
Respond with ONLY valid JSON:\n{{\n  \"picks\": {{\n{schema}\n  }}\n}}\n\
index is the 1-based position from each category's candidates list."
    );

    let user = format!(
        "Build a {use_case} PC ({platform_label} platform).\n{budget_note}\n\n\
Candidate parts:\n{candidate_summary}\n\nPick the best part from each category."
    );

    (system, user)
}
