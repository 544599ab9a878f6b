// SPDX-License-Identifier: AGPL-3.0-or-later

//! Candidate filtering under build-derived constraints
//!
//! Narrows the catalog to parts that satisfy whatever the build already
//! fixes: socket across cpu/motherboard, RAM generation across
//! motherboard/ram, an optional per-category price ceiling, and an optional
//! platform family. Filtering is pure set intersection; ordering is the
//! ranker's job.

use crate::catalog::Catalog;
use crate::part::{Build, Part, PartCategory};
use crate::rules;

/// CPU vendor family preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum Platform {
    Amd,
    Intel,
    #[default]
    Any,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Amd => write!(f, "amd"),
            Platform::Intel => write!(f, "intel"),
            Platform::Any => write!(f, "any"),
        }
    }
}

const AMD_SOCKETS: [&str; 2] = ["am5", "am4"];
const INTEL_SOCKETS: [&str; 3] = ["lga1700", "lga1200", "lga1151"];

impl Platform {
    /// Socket families belonging to this vendor; empty means unrestricted
    pub fn sockets(&self) -> &'static [&'static str] {
        match self {
            Platform::Amd => &AMD_SOCKETS,
            Platform::Intel => &INTEL_SOCKETS,
            Platform::Any => &[],
        }
    }
}

/// Constraints already fixed by the build-in-progress
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Required socket (lower-cased), applies to cpu and motherboard
    pub socket: Option<String>,

    /// Required RAM generation (lower-cased), applies to ram and motherboard
    pub ram_type: Option<String>,

    /// Per-category price ceiling, from the budget allocator
    pub max_price: Option<f64>,

    /// Vendor family, applies to cpu and motherboard
    pub platform: Platform,
}

/// Derive cross-part constraints for a target category from chosen parts
pub fn derive_constraints(build: &Build, target: PartCategory) -> Constraints {
    let mut constraints = Constraints::default();

    match target {
        PartCategory::Motherboard => {
            if let Some(cpu) = &build.cpu {
                let socket = cpu.string_spec("socket");
                if !socket.is_empty() {
                    constraints.socket = Some(socket);
                }
            }
            if let Some(ram) = &build.ram {
                let ram_type = ram.string_spec_any(&["type", "ramType"]);
                if !ram_type.is_empty() {
                    constraints.ram_type = Some(ram_type);
                }
            }
        }
        PartCategory::Cpu => {
            if let Some(motherboard) = &build.motherboard {
                let socket = motherboard.string_spec("socket");
                if !socket.is_empty() {
                    constraints.socket = Some(socket);
                }
            }
        }
        PartCategory::Ram => {
            if let Some(motherboard) = &build.motherboard {
                let ram_type = motherboard.string_spec_any(&["ram_type", "ramType"]);
                if !ram_type.is_empty() {
                    constraints.ram_type = Some(ram_type);
                }
            }
        }
        _ => {}
    }

    constraints
}

/// All catalog parts of a category satisfying the constraints, catalog order
pub fn filter_candidates(
    catalog: &Catalog,
    category: PartCategory,
    constraints: &Constraints,
) -> Vec<Part> {
    catalog
        .of_category(category)
        .into_iter()
        .filter(|part| satisfies(part, category, constraints))
        .cloned()
        .collect()
}

fn satisfies(part: &Part, category: PartCategory, constraints: &Constraints) -> bool {
    if let Some(ceiling) = constraints.max_price {
        if part.price > ceiling {
            return false;
        }
    }

    let is_socketed = matches!(category, PartCategory::Cpu | PartCategory::Motherboard);

    if is_socketed {
        let socket = part.string_spec("socket");
        if let Some(required) = &constraints.socket {
            if socket != *required {
                return false;
            }
        }
        let family = constraints.platform.sockets();
        if !family.is_empty() && !family.contains(&socket.as_str()) {
            return false;
        }
    }

    if let Some(required) = &constraints.ram_type {
        let part_type = match category {
            PartCategory::Ram => part.string_spec_any(&["type", "ramType"]),
            PartCategory::Motherboard => part.string_spec_any(&["ram_type", "ramType"]),
            _ => return true,
        };
        if part_type != *required {
            return false;
        }
    }

    true
}

/// Parts that would remediate a specific issue, in catalog order
///
/// The issue id is the stable rule identifier from the report, so callers can
/// wire "show compatible parts" straight off a rendered issue.
pub fn compatible_parts_for_issue(
    catalog: &Catalog,
    build: &Build,
    issue_id: &str,
    limit: usize,
) -> Vec<Part> {
    let parts: Vec<Part> = match issue_id {
        "socket-mismatch" => {
            if let Some(cpu) = &build.cpu {
                catalog
                    .with_spec_eq(PartCategory::Motherboard, "socket", &cpu.string_spec("socket"))
                    .into_iter()
                    .cloned()
                    .collect()
            } else if let Some(motherboard) = &build.motherboard {
                catalog
                    .with_spec_eq(PartCategory::Cpu, "socket", &motherboard.string_spec("socket"))
                    .into_iter()
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            }
        }
        "ram-mismatch" => {
            if let Some(motherboard) = &build.motherboard {
                catalog
                    .with_spec_eq(
                        PartCategory::Ram,
                        "type",
                        &motherboard.string_spec_any(&["ram_type", "ramType"]),
                    )
                    .into_iter()
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            }
        }
        "psu-insufficient" | "psu-low-headroom" => {
            let needed = f64::from(rules::recommended_psu(build));
            catalog
                .of_category(PartCategory::Psu)
                .into_iter()
                .filter(|p| p.numeric_spec("wattage") >= needed)
                .cloned()
                .collect()
        }
        "no-graphics" => catalog
            .of_category(PartCategory::Gpu)
            .into_iter()
            .cloned()
            .collect(),
        "gpu-too-long" => {
            let max_length = build
                .case
                .as_ref()
                .map_or(0.0, |c| c.numeric_spec_any(&["max_gpu_length", "maxGpuLength"]));
            catalog
                .of_category(PartCategory::Gpu)
                .into_iter()
                .filter(|p| {
                    let length = p.numeric_spec_any(&["length_mm", "length"]);
                    length > 0.0 && length <= max_length
                })
                .cloned()
                .collect()
        }
        "cooler-weak" => {
            let cpu_tdp = build.cpu.as_ref().map_or(0.0, |c| c.numeric_spec("tdp"));
            catalog
                .of_category(PartCategory::Cooling)
                .into_iter()
                .filter(|p| p.numeric_spec_any(&["tdp_rating", "tdpRating"]) >= cpu_tdp)
                .cloned()
                .collect()
        }
        "cooler-socket-unsupported" => {
            let socket = build
                .cpu
                .as_ref()
                .map_or_else(String::new, |c| c.string_spec("socket"));
            catalog
                .of_category(PartCategory::Cooling)
                .into_iter()
                .filter(|p| {
                    p.list_spec("socket_support")
                        .iter()
                        .any(|s| s.trim().to_lowercase() == socket)
                })
                .cloned()
                .collect()
        }
        "cooler-too-tall" => {
            let max_height = build
                .case
                .as_ref()
                .map_or(0.0, |c| c.numeric_spec_any(&["max_cooler_height", "maxCoolerHeight"]));
            catalog
                .of_category(PartCategory::Cooling)
                .into_iter()
                .filter(|p| {
                    let height = p.numeric_spec_any(&["height_mm", "height"]);
                    height > 0.0 && height <= max_height
                })
                .cloned()
                .collect()
        }
        _ => Vec::new(),
    };

    parts.into_iter().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::SpecValue;
    use std::collections::HashMap;

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

    fn catalog() -> Catalog {
        Catalog::new(vec![
            part("cpu-am5", PartCategory::Cpu, 28000.0, &[("socket", text("AM5")), ("tdp", num(105.0))]),
            part("cpu-lga", PartCategory::Cpu, 15000.0, &[("socket", text("LGA1700")), ("tdp", num(65.0))]),
            part("mb-am5", PartCategory::Motherboard, 19000.0, &[("socket", text("AM5")), ("ram_type", text("DDR5"))]),
            part("mb-lga", PartCategory::Motherboard, 12000.0, &[("socket", text("LGA1700")), ("ram_type", text("DDR4"))]),
            part("ram-d5", PartCategory::Ram, 7000.0, &[("type", text("DDR5"))]),
            part("ram-d4", PartCategory::Ram, 4000.0, &[("type", text("DDR4"))]),
            part("psu-450", PartCategory::Psu, 3500.0, &[("wattage", num(450.0))]),
            part("psu-650", PartCategory::Psu, 6000.0, &[("wattage", num(650.0))]),
        ])
    }

    #[test]
    fn test_cpu_fixes_motherboard_socket() {
        let catalog = catalog();
        let mut build = Build::default();
        build.cpu = Some(part("cpu-am5", PartCategory::Cpu, 28000.0, &[("socket", text("AM5"))]));

        let constraints = derive_constraints(&build, PartCategory::Motherboard);
        let candidates = filter_candidates(&catalog, PartCategory::Motherboard, &constraints);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "mb-am5");
    }

    #[test]
    fn test_motherboard_fixes_ram_type() {
        let catalog = catalog();
        let mut build = Build::default();
        build.motherboard = Some(part(
            "mb-lga",
            PartCategory::Motherboard,
            12000.0,
            &[("ram_type", text("DDR4"))],
        ));

        let constraints = derive_constraints(&build, PartCategory::Ram);
        let candidates = filter_candidates(&catalog, PartCategory::Ram, &constraints);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "ram-d4");
    }

    #[test]
    fn test_platform_family_restricts_cpus() {
        let catalog = catalog();
        let constraints = Constraints {
            platform: Platform::Intel,
            ..Constraints::default()
        };

        let candidates = filter_candidates(&catalog, PartCategory::Cpu, &constraints);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "cpu-lga");
    }

    #[test]
    fn test_price_ceiling_excludes_expensive_parts() {
        let catalog = catalog();
        let constraints = Constraints {
            max_price: Some(16000.0),
            ..Constraints::default()
        };

        let candidates = filter_candidates(&catalog, PartCategory::Cpu, &constraints);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "cpu-lga");
    }

    #[test]
    fn test_unconstrained_filter_keeps_catalog_order() {
        let catalog = catalog();
        let candidates =
            filter_candidates(&catalog, PartCategory::Psu, &Constraints::default());
        assert_eq!(candidates[0].id, "psu-450");
        assert_eq!(candidates[1].id, "psu-650");
    }

    #[test]
    fn test_compatible_parts_for_socket_mismatch() {
        let catalog = catalog();
        let mut build = Build::default();
        build.cpu = Some(part("cpu-am5", PartCategory::Cpu, 28000.0, &[("socket", text("AM5"))]));
        build.motherboard = Some(part(
            "mb-lga",
            PartCategory::Motherboard,
            12000.0,
            &[("socket", text("LGA1700"))],
        ));

        let fixes = compatible_parts_for_issue(&catalog, &build, "socket-mismatch", 5);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].id, "mb-am5");
    }

    #[test]
    fn test_compatible_parts_for_psu_shortfall() {
        let catalog = catalog();
        let mut build = Build::default();
        build.cpu = Some(part("cpu-am5", PartCategory::Cpu, 28000.0, &[("tdp", num(105.0))]));
        build.gpu = Some(part("gpu", PartCategory::Gpu, 50000.0, &[("tdp", num(200.0))]));

        // Recommended is 462W, so only the 650W unit qualifies
        let fixes = compatible_parts_for_issue(&catalog, &build, "psu-insufficient", 5);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].id, "psu-650");
    }

    #[test]
    fn test_unknown_issue_id_yields_nothing() {
        let catalog = catalog();
        let build = Build::default();
        assert!(compatible_parts_for_issue(&catalog, &build, "made-up", 5).is_empty());
    }
}
