// SPDX-License-Identifier: AGPL-3.0-or-later

//! Rigcheck - PC Build Compatibility & Recommendation Engine
//!
//! Checks part compatibility in a PC build, suggests parts for a single
//! category, and generates whole builds under platform and budget
//! constraints.
//!
//! Rigcheck is deterministic at its core: the rule engine and the heuristic
//! ranker never depend on external services. An AI ranking service, when
//! configured, refines suggestion ordering; any service failure falls back
//! to the heuristic result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

mod advisor;
mod ai;
mod budget;
mod catalog;
mod filter;
mod part;
mod ranker;
mod report;
mod rules;
mod specs;

use catalog::Catalog;
use filter::Platform;
use part::{Build, PartCategory};
use ranker::UseCase;
use report::{OutputFormat, Reporter};

/// Replacement parts listed per failed check when a catalog is given
const FIX_CANDIDATES_SHOWN: usize = 3;

/// PC build compatibility checker and part recommender
#[derive(Parser, Debug)]
#[command(name = "rigcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate compatibility rules against a build
    Check {
        /// Path to the build JSON file
        #[arg(short, long)]
        build: PathBuf,

        /// Parts catalog; when given, the report lists compatible
        /// replacements for each failed check
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Fail on warnings
        #[arg(long)]
        strict: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest parts for one category, compatible with an existing build
    Suggest {
        /// Path to the parts catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Path to the build JSON file (suggestions are unconstrained if omitted)
        #[arg(short, long)]
        build: Option<PathBuf>,

        /// Category to suggest parts for
        #[arg(long)]
        category: PartCategory,

        /// Use case to rank candidates for
        #[arg(short, long, default_value = "gaming")]
        use_case: UseCase,
    },

    /// Generate a complete build from the catalog
    Wizard {
        /// Path to the parts catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Use case to build for
        #[arg(short, long, default_value = "gaming")]
        use_case: UseCase,

        /// CPU platform restriction
        #[arg(short, long, default_value = "any")]
        platform: Platform,

        /// Total budget; per-category ceilings are derived from it
        #[arg(long)]
        budget: Option<f64>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_build(path: &Path) -> Result<Build> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read build file: {}", path.display()))?;
    let build: Build = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse build file: {}", path.display()))?;
    Ok(build)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rigcheck={}", log_level).into()),
        )
        .init();

    info!("Rigcheck v{}", env!("CARGO_PKG_VERSION"));

    let reporter = Reporter::new(cli.format);

    match cli.command {
        Commands::Check {
            build,
            catalog,
            strict,
            output,
        } => {
            let build = load_build(&build)?;
            let result = rules::evaluate(&build);

            let mut fixes = report::FixCandidates::new();
            if let Some(path) = catalog {
                let catalog = Catalog::load(&path)?;
                for issue in result.issues.iter().filter(|i| i.severity != part::Severity::Pass) {
                    let parts = filter::compatible_parts_for_issue(
                        &catalog,
                        &build,
                        &issue.id,
                        FIX_CANDIDATES_SHOWN,
                    );
                    if !parts.is_empty() {
                        fixes.insert(issue.id.clone(), parts);
                    }
                }
            }

            reporter.output_report(&result, &fixes, output.as_deref())?;

            if result.has_failures() || (strict && result.has_warnings()) {
                std::process::exit(1);
            }
        }

        Commands::Suggest {
            catalog,
            build,
            category,
            use_case,
        } => {
            let catalog = Catalog::load(&catalog)?;
            let build = match build {
                Some(path) => load_build(&path)?,
                None => Build::default(),
            };

            let backend = ai::backend_from_env();
            let response =
                advisor::suggest(&catalog, &build, category, use_case, backend.as_deref()).await;
            reporter.output_suggestions(&response, category, None)?;
        }

        Commands::Wizard {
            catalog,
            use_case,
            platform,
            budget,
            output,
        } => {
            let catalog = Catalog::load(&catalog)?;

            let backend = ai::backend_from_env();
            let generated =
                advisor::generate_build(&catalog, use_case, platform, budget, backend.as_deref())
                    .await;

            let result = rules::evaluate(&generated.to_build(use_case));
            reporter.output_build(&generated, &result, output.as_deref())?;

            if result.has_failures() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
