// SPDX-License-Identifier: AGPL-3.0-or-later

//! Suggestion and whole-build generation flows
//!
//! Candidate filter, heuristic ranking, optional AI override, and the
//! fallback contract live here: the AI path either fully succeeds (within
//! quorum for whole builds) or the deterministic ranker answers instead.
//! Callers can always tell which happened from the `source` tag; an AI
//! outage is never an error.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::ai::{
    self, PickParse, RankingBackend, BUILD_CANDIDATES_PER_CATEGORY, SUGGEST_CANDIDATES,
};
use crate::budget;
use crate::catalog::Catalog;
use crate::filter::{self, Constraints, Platform};
use crate::part::{Build, Part, PartCategory, Suggestion, SuggestionSource, COMPAT_CATEGORIES};
use crate::ranker::{self, UseCase};

/// Ad-hoc suggestions returned to the caller
const SUGGESTIONS_RETURNED: usize = 3;

/// Candidate pool kept per category for whole-build generation
const POOL_LIMIT: usize = 30;

/// Ranked suggestions for one target category
#[derive(Debug, Clone, Serialize)]
pub struct SuggestResponse {
    pub source: SuggestionSource,
    pub suggestions: Vec<Suggestion>,
}

/// A generated whole build, one suggestion per resolved category
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBuild {
    pub source: SuggestionSource,
    pub picks: BTreeMap<PartCategory, Suggestion>,
}

impl GeneratedBuild {
    /// Materialize the picks into a build value for report evaluation
    pub fn to_build(&self, use_case: UseCase) -> Build {
        let mut build = Build {
            name: format!("Generated {} build", use_case),
            ..Build::default()
        };
        for (category, suggestion) in &self.picks {
            build.set_slot(*category, Some(suggestion.part.clone()));
        }
        build
    }
}

/// Suggest parts for one category, compatible with the build so far
///
/// Filter → heuristic rank → AI override of the top picks → heuristic
/// fallback on any AI failure.
pub async fn suggest(
    catalog: &Catalog,
    build: &Build,
    target: PartCategory,
    use_case: UseCase,
    backend: Option<&dyn RankingBackend>,
) -> SuggestResponse {
    let constraints = filter::derive_constraints(build, target);
    let candidates = filter::filter_candidates(catalog, target, &constraints);
    debug!(category = %target, candidates = candidates.len(), "filtered candidate pool");

    let ranked = ranker::rank(&candidates, target, use_case);
    if ranked.is_empty() {
        return SuggestResponse {
            source: SuggestionSource::Heuristic,
            suggestions: Vec::new(),
        };
    }

    if let Some(backend) = backend {
        let top: Vec<Part> = ranked
            .iter()
            .take(SUGGEST_CANDIDATES)
            .map(|s| s.part.clone())
            .collect();

        if let Some(suggestions) = ai_suggest(backend, build, &top, target).await {
            return SuggestResponse {
                source: SuggestionSource::Ai,
                suggestions,
            };
        }
    }

    SuggestResponse {
        source: SuggestionSource::Heuristic,
        suggestions: ranked.into_iter().take(SUGGESTIONS_RETURNED).collect(),
    }
}

async fn ai_suggest(
    backend: &dyn RankingBackend,
    build: &Build,
    candidates: &[Part],
    target: PartCategory,
) -> Option<Vec<Suggestion>> {
    let (system, user) = ai::suggest_prompts(build, candidates, target);

    let reply = match backend.complete(&system, &user).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(category = %target, error = %err, "AI ranking call failed, falling back");
            return None;
        }
    };

    match ai::parse_category_picks(&reply, candidates.len(), SUGGESTIONS_RETURNED) {
        PickParse::Parsed(picks) => Some(
            picks
                .into_iter()
                .map(|pick| {
                    let part = candidates[pick.index - 1].clone();
                    Suggestion {
                        id: part.id.clone(),
                        part,
                        reason: pick.reason,
                    }
                })
                .collect(),
        ),
        PickParse::Rejected(reason) => {
            warn!(category = %target, %reason, "AI pick list rejected, falling back");
            None
        }
    }
}

/// Generate a full build for a use-case, platform and optional budget
///
/// Budget ceilings and platform constraints shape per-category pools; the AI
/// picker runs once over the pools, and the deterministic builder answers
/// whenever it cannot.
pub async fn generate_build(
    catalog: &Catalog,
    use_case: UseCase,
    platform: Platform,
    total_budget: Option<f64>,
    backend: Option<&dyn RankingBackend>,
) -> GeneratedBuild {
    let ceilings = budget::allocate(total_budget, use_case);

    let mut pools: BTreeMap<PartCategory, Vec<Part>> = BTreeMap::new();
    for category in COMPAT_CATEGORIES {
        let constraints = Constraints {
            max_price: ceilings.get(&category).copied(),
            platform,
            ..Constraints::default()
        };
        let candidates = filter::filter_candidates(catalog, category, &constraints);
        let mut ranked: Vec<Part> = ranker::rank(&candidates, category, use_case)
            .into_iter()
            .map(|s| s.part)
            .collect();
        ranked.truncate(POOL_LIMIT);
        debug!(category = %category, pool = ranked.len(), "built candidate pool");
        pools.insert(category, ranked);
    }

    if let Some(backend) = backend {
        if let Some(picks) = ai_build(backend, &pools, use_case, platform, total_budget).await {
            info!(resolved = picks.len(), "AI build accepted");
            return GeneratedBuild {
                source: SuggestionSource::Ai,
                picks,
            };
        }
    }

    GeneratedBuild {
        source: SuggestionSource::Heuristic,
        picks: heuristic_build(pools),
    }
}

async fn ai_build(
    backend: &dyn RankingBackend,
    pools: &BTreeMap<PartCategory, Vec<Part>>,
    use_case: UseCase,
    platform: Platform,
    total_budget: Option<f64>,
) -> Option<BTreeMap<PartCategory, Suggestion>> {
    let trimmed: BTreeMap<PartCategory, Vec<Part>> = pools
        .iter()
        .map(|(category, parts)| {
            let top: Vec<Part> = parts
                .iter()
                .take(BUILD_CANDIDATES_PER_CATEGORY)
                .cloned()
                .collect();
            (*category, top)
        })
        .collect();

    let counts: BTreeMap<PartCategory, usize> = trimmed
        .iter()
        .map(|(category, parts)| (*category, parts.len()))
        .collect();

    let (system, user) =
        ai::wizard_prompts(&trimmed, use_case, &platform.to_string(), total_budget);

    let reply = match backend.complete(&system, &user).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "AI build call failed, falling back");
            return None;
        }
    };

    match ai::parse_build_picks(&reply, &counts) {
        PickParse::Parsed(picks) => Some(
            picks
                .into_iter()
                .map(|(category, pick)| {
                    let part = trimmed[&category][pick.index - 1].clone();
                    let suggestion = Suggestion {
                        id: part.id.clone(),
                        part,
                        reason: pick.reason,
                    };
                    (category, suggestion)
                })
                .collect(),
        ),
        PickParse::Rejected(reason) => {
            warn!(%reason, "AI build rejected, falling back");
            None
        }
    }
}

/// Deterministic whole-build assembly
///
/// CPU first so the socket is fixed, then the motherboard narrows to that
/// socket, then RAM narrows to the motherboard's type, then everything else.
/// Pools arrive ranked, so the first surviving candidate is the pick.
fn heuristic_build(
    mut pools: BTreeMap<PartCategory, Vec<Part>>,
) -> BTreeMap<PartCategory, Suggestion> {
    let mut picks = BTreeMap::new();

    if let Some(cpu) = pools.get(&PartCategory::Cpu).and_then(|p| p.first()).cloned() {
        let socket = cpu.string_spec("socket");
        if !socket.is_empty() {
            if let Some(motherboards) = pools.get_mut(&PartCategory::Motherboard) {
                // Unknown sockets stay in; only a contradicting spec disqualifies
                motherboards.retain(|m| {
                    let mb_socket = m.string_spec("socket");
                    mb_socket.is_empty() || mb_socket == socket
                });
            }
        }
        picks.insert(
            PartCategory::Cpu,
            Suggestion {
                id: cpu.id.clone(),
                part: cpu,
                reason: "Best performance in this category.".to_string(),
            },
        );
    }

    if let Some(motherboard) = pools
        .get(&PartCategory::Motherboard)
        .and_then(|p| p.first())
        .cloned()
    {
        let ram_type = motherboard.string_spec_any(&["ram_type", "ramType"]);
        if !ram_type.is_empty() {
            if let Some(rams) = pools.get_mut(&PartCategory::Ram) {
                rams.retain(|r| {
                    let r_type = r.string_spec_any(&["type", "ramType"]);
                    r_type.is_empty() || r_type == ram_type
                });
            }
        }
        picks.insert(
            PartCategory::Motherboard,
            Suggestion {
                id: motherboard.id.clone(),
                part: motherboard,
                reason: "Compatible with CPU and feature-rich.".to_string(),
            },
        );
    }

    for category in COMPAT_CATEGORIES {
        if picks.contains_key(&category) {
            continue;
        }
        if let Some(part) = pools.get(&category).and_then(|p| p.first()).cloned() {
            picks.insert(
                category,
                Suggestion {
                    id: part.id.clone(),
                    part,
                    reason: "Best option for this category.".to_string(),
                },
            );
        }
    }

    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::SpecValue;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Backend that always fails, for exercising the fallback contract
    struct DownBackend;

    #[async_trait]
    impl RankingBackend for DownBackend {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            bail!("service unavailable")
        }
    }

    /// Backend that returns a canned reply
    struct CannedBackend(String);

    #[async_trait]
    impl RankingBackend for CannedBackend {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn part(id: &str, category: PartCategory, price: f64, specs: &[(&str, SpecValue)]) -> Part {
        let mut bag = HashMap::new();
        for (key, value) in specs {
            bag.insert(key.to_string(), value.clone());
        }
        Part {
            id: id.to_string(),
            category,
            brand: "Test".to_string(),
            name: id.to_string(),
            price,
            specs: bag,
        }
    }

    fn text(v: &str) -> SpecValue {
        SpecValue::Text(v.to_string())
    }

    fn num(v: f64) -> SpecValue {
        SpecValue::Number(v)
    }

    fn full_catalog() -> Catalog {
        Catalog::new(vec![
            part("cpu-1", PartCategory::Cpu, 28000.0, &[("socket", text("AM5")), ("cores", num(8.0)), ("boost_clock", num(5.3)), ("tdp", num(105.0))]),
            part("cpu-2", PartCategory::Cpu, 15000.0, &[("socket", text("LGA1700")), ("cores", num(6.0)), ("boost_clock", num(4.4)), ("tdp", num(65.0))]),
            part("gpu-1", PartCategory::Gpu, 55000.0, &[("vram", num(12.0)), ("tdp", num(200.0))]),
            part("gpu-2", PartCategory::Gpu, 30000.0, &[("vram", num(8.0)), ("tdp", num(160.0))]),
            part("mb-1", PartCategory::Motherboard, 19000.0, &[("socket", text("AM5")), ("ram_type", text("DDR5")), ("m2_slots", num(2.0)), ("ram_slots", num(4.0))]),
            part("mb-2", PartCategory::Motherboard, 12000.0, &[("socket", text("LGA1700")), ("ram_type", text("DDR4")), ("m2_slots", num(1.0)), ("ram_slots", num(2.0))]),
            part("ram-1", PartCategory::Ram, 7000.0, &[("type", text("DDR5")), ("capacity_gb", num(32.0)), ("speed_mhz", num(6000.0))]),
            part("ram-2", PartCategory::Ram, 4000.0, &[("type", text("DDR4")), ("capacity_gb", num(16.0)), ("speed_mhz", num(3200.0))]),
            part("ssd-1", PartCategory::Storage, 8000.0, &[("capacity_gb", num(1000.0)), ("read_speed", num(7000.0))]),
            part("psu-1", PartCategory::Psu, 6000.0, &[("wattage", num(650.0))]),
            part("case-1", PartCategory::Case, 5000.0, &[("max_gpu_length", num(360.0))]),
            part("cool-1", PartCategory::Cooling, 3000.0, &[("tdp_rating", num(220.0))]),
        ])
    }

    #[tokio::test]
    async fn test_suggest_falls_back_when_backend_is_down() {
        let catalog = full_catalog();
        let build = Build::default();

        let response = suggest(
            &catalog,
            &build,
            PartCategory::Gpu,
            UseCase::Gaming,
            Some(&DownBackend),
        )
        .await;

        assert_eq!(response.source, SuggestionSource::Heuristic);
        assert!(!response.suggestions.is_empty());
        assert_eq!(response.suggestions[0].id, "gpu-1");
    }

    #[tokio::test]
    async fn test_suggest_uses_ai_picks_when_valid() {
        let catalog = full_catalog();
        let build = Build::default();
        let backend = CannedBackend(
            r#"Here you go: { "picks": [ { "index": 2, "reason": "better value" } ] }"#.to_string(),
        );

        let response = suggest(
            &catalog,
            &build,
            PartCategory::Gpu,
            UseCase::Gaming,
            Some(&backend),
        )
        .await;

        assert_eq!(response.source, SuggestionSource::Ai);
        assert_eq!(response.suggestions.len(), 1);
        assert_eq!(response.suggestions[0].id, "gpu-2");
        assert_eq!(response.suggestions[0].reason, "better value");
    }

    #[tokio::test]
    async fn test_suggest_falls_back_on_malformed_reply() {
        let catalog = full_catalog();
        let build = Build::default();
        let backend = CannedBackend("I would pick the second one, probably.".to_string());

        let response = suggest(
            &catalog,
            &build,
            PartCategory::Gpu,
            UseCase::Gaming,
            Some(&backend),
        )
        .await;

        assert_eq!(response.source, SuggestionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_suggest_respects_existing_socket() {
        let catalog = full_catalog();
        let mut build = Build::default();
        build.cpu = Some(part(
            "cpu-1",
            PartCategory::Cpu,
            28000.0,
            &[("socket", text("AM5"))],
        ));

        let response = suggest(
            &catalog,
            &build,
            PartCategory::Motherboard,
            UseCase::Gaming,
            None,
        )
        .await;

        assert_eq!(response.suggestions.len(), 1);
        assert_eq!(response.suggestions[0].id, "mb-1");
    }

    #[tokio::test]
    async fn test_generate_build_heuristic_keeps_parts_coherent() {
        let catalog = full_catalog();
        let generated = generate_build(&catalog, UseCase::Gaming, Platform::Any, None, None).await;

        assert_eq!(generated.source, SuggestionSource::Heuristic);
        assert_eq!(generated.picks.len(), 8);

        // CPU resolves first; motherboard and RAM must follow its platform
        assert_eq!(generated.picks[&PartCategory::Cpu].id, "cpu-1");
        assert_eq!(generated.picks[&PartCategory::Motherboard].id, "mb-1");
        assert_eq!(generated.picks[&PartCategory::Ram].id, "ram-1");

        let build = generated.to_build(UseCase::Gaming);
        let report = crate::rules::evaluate(&build);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_generate_build_platform_restriction() {
        let catalog = full_catalog();
        let generated =
            generate_build(&catalog, UseCase::Coding, Platform::Intel, None, None).await;

        assert_eq!(generated.picks[&PartCategory::Cpu].id, "cpu-2");
        assert_eq!(generated.picks[&PartCategory::Motherboard].id, "mb-2");
        assert_eq!(generated.picks[&PartCategory::Ram].id, "ram-2");
    }

    #[tokio::test]
    async fn test_generate_build_falls_back_below_quorum() {
        let catalog = full_catalog();
        // Only three categories picked: below the quorum of four
        let backend = CannedBackend(
            r#"{ "picks": {
                "cpu": { "index": 1, "reason": "a" },
                "gpu": { "index": 1, "reason": "b" },
                "ram": { "index": 1, "reason": "c" }
            } }"#
                .to_string(),
        );

        let generated =
            generate_build(&catalog, UseCase::Gaming, Platform::Any, None, Some(&backend)).await;

        assert_eq!(generated.source, SuggestionSource::Heuristic);
        assert_eq!(generated.picks.len(), 8);
    }

    #[tokio::test]
    async fn test_generate_build_accepts_quorum() {
        let catalog = full_catalog();
        let backend = CannedBackend(
            r#"{ "picks": {
                "cpu": { "index": 1, "reason": "strong" },
                "gpu": { "index": 2, "reason": "value" },
                "motherboard": { "index": 1, "reason": "fits" },
                "ram": { "index": 1, "reason": "fast" }
            } }"#
                .to_string(),
        );

        let generated =
            generate_build(&catalog, UseCase::Gaming, Platform::Any, None, Some(&backend)).await;

        assert_eq!(generated.source, SuggestionSource::Ai);
        assert_eq!(generated.picks.len(), 4);
        assert_eq!(generated.picks[&PartCategory::Gpu].id, "gpu-2");
        assert_eq!(generated.picks[&PartCategory::Gpu].reason, "value");
    }

    #[tokio::test]
    async fn test_generate_build_never_errors_when_backend_is_down() {
        let catalog = full_catalog();
        let generated =
            generate_build(&catalog, UseCase::Office, Platform::Any, Some(80_000.0), Some(&DownBackend))
                .await;

        assert_eq!(generated.source, SuggestionSource::Heuristic);
        assert!(!generated.picks.is_empty());
    }

    #[tokio::test]
    async fn test_budget_ceiling_constrains_generated_picks() {
        let catalog = full_catalog();
        // Gaming allocates 35% to the GPU; 100k budget caps it at 35k
        let generated =
            generate_build(&catalog, UseCase::Gaming, Platform::Any, Some(100_000.0), None).await;

        assert_eq!(generated.picks[&PartCategory::Gpu].id, "gpu-2");
    }
}
