// SPDX-License-Identifier: AGPL-3.0-or-later

//! Compatibility rules and report building
//!
//! Each rule is a pure function over a build snapshot returning at most one
//! issue. A rule whose preconditions are unmet (slot empty, spec absent)
//! contributes nothing: missing catalog data downgrades a check to "not
//! applicable" rather than failing the evaluation.

use tracing::debug;

use crate::part::{Build, CompatibilityReport, Issue, PartCategory, Severity};

/// Fixed wattage overhead for board, storage and fans
const WATTAGE_OVERHEAD: f64 = 80.0;

/// Safety factor applied to estimated wattage for the PSU recommendation
const PSU_HEADROOM_FACTOR: f64 = 1.2;

const FAIL_PENALTY: i64 = 30;
const WARN_PENALTY: i64 = 10;
const PASS_BONUS: i64 = 5;

/// CPU TDP + GPU TDP + fixed overhead
pub fn estimated_wattage(build: &Build) -> u32 {
    let cpu_tdp = build.cpu.as_ref().map_or(0.0, |p| p.numeric_spec("tdp"));
    let gpu_tdp = build.gpu.as_ref().map_or(0.0, |p| p.numeric_spec("tdp"));
    (cpu_tdp + gpu_tdp + WATTAGE_OVERHEAD).round() as u32
}

/// Estimated wattage scaled by the safety factor, rounded up
pub fn recommended_psu(build: &Build) -> u32 {
    (f64::from(estimated_wattage(build)) * PSU_HEADROOM_FACTOR).ceil() as u32
}

/// Rule 1: CPU socket must match the motherboard socket
fn check_socket(build: &Build) -> Option<Issue> {
    let cpu = build.cpu.as_ref()?;
    let motherboard = build.motherboard.as_ref()?;

    let cpu_socket = cpu.string_spec("socket");
    let mb_socket = motherboard.string_spec("socket");
    if cpu_socket.is_empty() || mb_socket.is_empty() {
        return None;
    }

    if cpu_socket == mb_socket {
        Some(Issue {
            id: "socket-match".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Cpu,
            title: "CPU Socket Compatible".to_string(),
            detail: format!(
                "{} ({}) is compatible with {}",
                cpu.label(),
                cpu_socket.to_uppercase(),
                motherboard.label()
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Motherboard],
        })
    } else {
        Some(Issue {
            id: "socket-mismatch".to_string(),
            severity: Severity::Fail,
            category: PartCategory::Cpu,
            title: "CPU Socket Mismatch".to_string(),
            detail: format!(
                "CPU requires {} socket but motherboard has {}",
                cpu_socket.to_uppercase(),
                mb_socket.to_uppercase()
            ),
            suggested_fix: format!(
                "Replace motherboard with one that supports {} socket, or choose a different CPU",
                cpu_socket.to_uppercase()
            ),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Motherboard],
        })
    }
}

/// Rule 2: RAM generation must match what the motherboard accepts
fn check_ram_type(build: &Build) -> Option<Issue> {
    let ram = build.ram.as_ref()?;
    let motherboard = build.motherboard.as_ref()?;

    let ram_type = ram.string_spec_any(&["type", "ramType"]);
    let mb_ram_type = motherboard.string_spec_any(&["ram_type", "ramType"]);
    if ram_type.is_empty() || mb_ram_type.is_empty() {
        return None;
    }

    if ram_type == mb_ram_type {
        Some(Issue {
            id: "ram-match".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Ram,
            title: "RAM Type Compatible".to_string(),
            detail: format!(
                "{} RAM is compatible with your motherboard",
                ram_type.to_uppercase()
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Ram, PartCategory::Motherboard],
        })
    } else {
        Some(Issue {
            id: "ram-mismatch".to_string(),
            severity: Severity::Fail,
            category: PartCategory::Ram,
            title: "RAM Type Mismatch".to_string(),
            detail: format!(
                "Your RAM is {} but motherboard requires {}",
                ram_type.to_uppercase(),
                mb_ram_type.to_uppercase()
            ),
            suggested_fix: format!(
                "Replace RAM with {} modules, or choose a motherboard that supports {}",
                mb_ram_type.to_uppercase(),
                ram_type.to_uppercase()
            ),
            affected_parts: vec![PartCategory::Ram, PartCategory::Motherboard],
        })
    }
}

/// Rule 3: PSU wattage against estimated draw plus headroom
fn check_psu(build: &Build) -> Option<Issue> {
    let psu = build.psu.as_ref()?;

    let cpu_tdp = build.cpu.as_ref().map_or(0.0, |p| p.numeric_spec("tdp"));
    let gpu_tdp = build.gpu.as_ref().map_or(0.0, |p| p.numeric_spec("tdp"));
    if cpu_tdp + gpu_tdp <= 0.0 {
        return None;
    }

    let psu_wattage = psu.numeric_spec("wattage");
    if psu_wattage <= 0.0 {
        return None;
    }

    let estimated = estimated_wattage(build);
    let recommended = recommended_psu(build);
    let wattage = psu_wattage.round() as u32;

    if wattage >= recommended {
        Some(Issue {
            id: "psu-adequate".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Psu,
            title: "PSU Wattage Adequate".to_string(),
            detail: format!(
                "{}W PSU provides sufficient headroom for {}W system",
                wattage, estimated
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Psu],
        })
    } else if wattage >= estimated {
        Some(Issue {
            id: "psu-low-headroom".to_string(),
            severity: Severity::Warn,
            category: PartCategory::Psu,
            title: "Low PSU Headroom".to_string(),
            detail: format!(
                "{}W PSU meets minimum but recommended is {}W for stability",
                wattage, recommended
            ),
            suggested_fix: format!(
                "Consider upgrading to a {}W or higher PSU for better efficiency and future upgrades",
                recommended
            ),
            affected_parts: vec![PartCategory::Psu],
        })
    } else {
        Some(Issue {
            id: "psu-insufficient".to_string(),
            severity: Severity::Fail,
            category: PartCategory::Psu,
            title: "Insufficient PSU Wattage".to_string(),
            detail: format!(
                "{}W PSU cannot power {}W system. Risk of instability or shutdown",
                wattage, estimated
            ),
            suggested_fix: format!("Upgrade to at least {}W PSU immediately", recommended),
            affected_parts: vec![PartCategory::Psu],
        })
    }
}

/// Whether a CPU model name denotes a part sold without integrated graphics
///
/// Matches trailing model-number suffixes only (12400F, 13600KF, 7800X3D).
/// Best-effort signal; only consulted when the explicit attribute is absent.
fn name_denotes_no_igpu(name: &str) -> bool {
    name.split_whitespace()
        .map(|token| token.to_lowercase())
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
        .any(|token| {
            token.ends_with("x3d") || token.ends_with("kf") || token.ends_with('f')
        })
}

/// Rule 4: a build needs some graphics output
fn check_graphics_output(build: &Build) -> Option<Issue> {
    let cpu = build.cpu.as_ref()?;
    if build.gpu.is_some() {
        return None;
    }

    let lacks_igpu = match cpu.flag_spec("integrated_graphics") {
        Some(has) => !has,
        None => {
            let igpu = cpu.string_spec("igpu");
            if !igpu.is_empty() {
                igpu == "no" || igpu == "false" || igpu == "none"
            } else {
                name_denotes_no_igpu(&cpu.name)
            }
        }
    };

    if !lacks_igpu {
        return None;
    }

    Some(Issue {
        id: "no-graphics".to_string(),
        severity: Severity::Warn,
        category: PartCategory::Gpu,
        title: "No Graphics Output".to_string(),
        detail: format!(
            "{} has no integrated graphics and no discrete GPU selected",
            cpu.label()
        ),
        suggested_fix: "Add a discrete GPU to enable display output".to_string(),
        affected_parts: vec![PartCategory::Cpu, PartCategory::Gpu],
    })
}

/// Rule 5: GPU length against case clearance
fn check_gpu_clearance(build: &Build) -> Option<Issue> {
    let gpu = build.gpu.as_ref()?;
    let case = build.case.as_ref()?;

    let gpu_length = gpu.numeric_spec_any(&["length_mm", "length"]);
    let max_length = case.numeric_spec_any(&["max_gpu_length", "maxGpuLength"]);
    if gpu_length <= 0.0 || max_length <= 0.0 {
        return None;
    }

    if gpu_length <= max_length {
        Some(Issue {
            id: "gpu-fits".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Gpu,
            title: "GPU Fits Case".to_string(),
            detail: format!(
                "{}mm GPU fits within {}mm case clearance",
                gpu_length, max_length
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Gpu, PartCategory::Case],
        })
    } else {
        Some(Issue {
            id: "gpu-too-long".to_string(),
            severity: Severity::Warn,
            category: PartCategory::Gpu,
            title: "GPU May Not Fit".to_string(),
            detail: format!(
                "{}mm GPU exceeds {}mm case clearance by {}mm",
                gpu_length,
                max_length,
                gpu_length - max_length
            ),
            suggested_fix: "Choose a shorter GPU or a larger case with more clearance".to_string(),
            affected_parts: vec![PartCategory::Gpu, PartCategory::Case],
        })
    }
}

/// Rule 6: cooler rated capacity against CPU heat output
fn check_cooler_capacity(build: &Build) -> Option<Issue> {
    let cpu = build.cpu.as_ref()?;
    let cooling = build.cooling.as_ref()?;

    let cpu_tdp = cpu.numeric_spec("tdp");
    let cooler_tdp = cooling.numeric_spec_any(&["tdp_rating", "tdpRating"]);
    if cpu_tdp <= 0.0 || cooler_tdp <= 0.0 {
        return None;
    }

    if cooler_tdp >= cpu_tdp {
        Some(Issue {
            id: "cooler-adequate".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Cooling,
            title: "Cooler TDP Adequate".to_string(),
            detail: format!("{}W cooler can handle {}W CPU", cooler_tdp, cpu_tdp),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Cooling],
        })
    } else {
        Some(Issue {
            id: "cooler-weak".to_string(),
            severity: Severity::Warn,
            category: PartCategory::Cooling,
            title: "Cooler May Be Insufficient".to_string(),
            detail: format!(
                "{}W cooler rating is below {}W CPU TDP",
                cooler_tdp, cpu_tdp
            ),
            suggested_fix: format!(
                "Consider a cooler rated for at least {}W or higher for optimal temperatures",
                cpu_tdp
            ),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Cooling],
        })
    }
}

/// Rule 7: cooler mounting kit must support the CPU socket
fn check_cooler_socket(build: &Build) -> Option<Issue> {
    let cpu = build.cpu.as_ref()?;
    let cooling = build.cooling.as_ref()?;

    let cpu_socket = cpu.string_spec("socket");
    let supported = cooling.list_spec("socket_support");
    if cpu_socket.is_empty() || supported.is_empty() {
        return None;
    }

    let matches = supported
        .iter()
        .any(|s| s.trim().to_lowercase() == cpu_socket);

    if matches {
        Some(Issue {
            id: "cooler-socket-supported".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Cooling,
            title: "Cooler Mounts On CPU Socket".to_string(),
            detail: format!(
                "{} ships mounting hardware for {}",
                cooling.label(),
                cpu_socket.to_uppercase()
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Cooling],
        })
    } else {
        Some(Issue {
            id: "cooler-socket-unsupported".to_string(),
            severity: Severity::Fail,
            category: PartCategory::Cooling,
            title: "Cooler Does Not Support CPU Socket".to_string(),
            detail: format!(
                "{} does not list {} among its supported sockets ({})",
                cooling.label(),
                cpu_socket.to_uppercase(),
                supported.join(", ")
            ),
            suggested_fix: format!(
                "Choose a cooler with {} mounting support",
                cpu_socket.to_uppercase()
            ),
            affected_parts: vec![PartCategory::Cpu, PartCategory::Cooling],
        })
    }
}

/// Rule 8: cooler height against case clearance
fn check_cooler_height(build: &Build) -> Option<Issue> {
    let cooling = build.cooling.as_ref()?;
    let case = build.case.as_ref()?;

    let cooler_height = cooling.numeric_spec_any(&["height_mm", "height"]);
    let max_height = case.numeric_spec_any(&["max_cooler_height", "maxCoolerHeight"]);
    if cooler_height <= 0.0 || max_height <= 0.0 {
        return None;
    }

    if cooler_height <= max_height {
        Some(Issue {
            id: "cooler-fits".to_string(),
            severity: Severity::Pass,
            category: PartCategory::Cooling,
            title: "Cooler Fits Case".to_string(),
            detail: format!(
                "{}mm cooler fits within {}mm case clearance",
                cooler_height, max_height
            ),
            suggested_fix: "No action needed".to_string(),
            affected_parts: vec![PartCategory::Cooling, PartCategory::Case],
        })
    } else {
        Some(Issue {
            id: "cooler-too-tall".to_string(),
            severity: Severity::Warn,
            category: PartCategory::Cooling,
            title: "Cooler May Not Fit".to_string(),
            detail: format!(
                "{}mm cooler exceeds {}mm case clearance by {}mm",
                cooler_height,
                max_height,
                cooler_height - max_height
            ),
            suggested_fix: "Choose a lower-profile cooler or a case with more clearance"
                .to_string(),
            affected_parts: vec![PartCategory::Cooling, PartCategory::Case],
        })
    }
}

type Rule = fn(&Build) -> Option<Issue>;

/// Rules in evaluation order; report issue order follows this
const RULES: [Rule; 8] = [
    check_socket,
    check_ram_type,
    check_psu,
    check_graphics_output,
    check_gpu_clearance,
    check_cooler_capacity,
    check_cooler_socket,
    check_cooler_height,
];

/// Run every applicable rule and aggregate the scored report
///
/// Purely computed from the build snapshot: same build, same report,
/// including issue order.
pub fn evaluate(build: &Build) -> CompatibilityReport {
    let mut issues = Vec::new();
    for rule in RULES {
        if let Some(issue) = rule(build) {
            debug!(id = %issue.id, severity = ?issue.severity, "rule fired");
            issues.push(issue);
        }
    }

    let fails = issues.iter().filter(|i| i.severity == Severity::Fail).count() as i64;
    let warns = issues.iter().filter(|i| i.severity == Severity::Warn).count() as i64;
    let passes = issues.iter().filter(|i| i.severity == Severity::Pass).count() as i64;

    let mut score = 100 - fails * FAIL_PENALTY - warns * WARN_PENALTY;
    score = score.clamp(0, 100);
    if fails == 0 && passes > 0 {
        score = (score + passes * PASS_BONUS).min(100);
    }

    CompatibilityReport {
        estimated_wattage: estimated_wattage(build),
        recommended_psu: recommended_psu(build),
        issues,
        score: score as u32,
        total_price: build.total_price(),
        parts_count: build.parts_count(),
    }
}
