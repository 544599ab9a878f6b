// SPDX-License-Identifier: AGPL-3.0-or-later

//! Report generation and output formatting

use anyhow::Result;
use chrono::Utc;
use clap::ValueEnum;
use std::path::Path;

use crate::advisor::{GeneratedBuild, SuggestResponse};
use crate::part::{CompatibilityReport, Issue, Part, PartCategory, Severity};
use std::collections::BTreeMap;

/// Remediation candidates keyed by the issue id they would resolve
pub type FixCandidates = BTreeMap<String, Vec<Part>>;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Markdown format
    Markdown,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

/// Reporter for rendering evaluation results and suggestions
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit(&self, output: String, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            std::fs::write(path, &output)?;
        } else {
            print!("{}", output);
        }
        Ok(())
    }

    /// Output a compatibility report to stdout or file
    ///
    /// `fixes` carries catalog parts that would resolve specific issues; it
    /// is empty when no catalog was supplied.
    pub fn output_report(
        &self,
        report: &CompatibilityReport,
        fixes: &FixCandidates,
        path: Option<&Path>,
    ) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.format_report_text(report, fixes),
            OutputFormat::Json => {
                if fixes.is_empty() {
                    serde_json::to_string_pretty(report)?
                } else {
                    serde_json::to_string_pretty(&serde_json::json!({
                        "report": report,
                        "compatible_parts": fixes,
                        "generated_at": Utc::now().to_rfc3339(),
                    }))?
                }
            }
            OutputFormat::Markdown => self.format_report_markdown(report, fixes),
        };
        self.emit(output, path)
    }

    /// Output ranked suggestions for one category
    pub fn output_suggestions(
        &self,
        response: &SuggestResponse,
        category: PartCategory,
        path: Option<&Path>,
    ) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.format_suggestions_text(response, category),
            OutputFormat::Json => serde_json::to_string_pretty(response)?,
            OutputFormat::Markdown => self.format_suggestions_markdown(response, category),
        };
        self.emit(output, path)
    }

    /// Output a generated build together with its compatibility report
    pub fn output_build(
        &self,
        generated: &GeneratedBuild,
        report: &CompatibilityReport,
        path: Option<&Path>,
    ) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => {
                let mut text = self.format_build_text(generated);
                text.push_str(&self.format_report_text(report, &FixCandidates::new()));
                text
            }
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "source": generated.source,
                "picks": generated.picks,
                "report": report,
                "generated_at": Utc::now().to_rfc3339(),
            }))?,
            OutputFormat::Markdown => {
                let mut text = self.format_build_markdown(generated);
                text.push_str(&self.format_report_markdown(report, &FixCandidates::new()));
                text
            }
        };
        self.emit(output, path)
    }

    fn format_report_text(&self, report: &CompatibilityReport, fixes: &FixCandidates) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&format!(
            "\n{} Rigcheck Compatibility Report\n",
            if report.has_failures() {
                "✗"
            } else if report.has_warnings() {
                "⚠"
            } else {
                "✓"
            }
        ));
        output.push_str(&"─".repeat(50));
        output.push('\n');

        // Summary
        output.push_str(&format!("\nScore: {}/100\n", report.score));
        output.push_str(&format!(
            "Parts: {}/8 selected, total price {:.0}\n",
            report.parts_count, report.total_price
        ));
        output.push_str(&format!(
            "Power: ~{}W estimated, {}W PSU recommended\n",
            report.estimated_wattage, report.recommended_psu
        ));

        // Issues by severity, failures first
        if !report.issues.is_empty() {
            output.push('\n');
            output.push_str(&"─".repeat(50));
            output.push_str("\nFindings:\n\n");

            for severity in [Severity::Fail, Severity::Warn, Severity::Pass] {
                for issue in report.issues.iter().filter(|i| i.severity == severity) {
                    output.push_str(&self.format_issue(issue, fixes.get(&issue.id)));
                }
            }
        }

        output.push('\n');
        output
    }

    fn format_issue(&self, issue: &Issue, fixes: Option<&Vec<Part>>) -> String {
        let icon = match issue.severity {
            Severity::Fail => "❌",
            Severity::Warn => "⚠️",
            Severity::Pass => "✅",
        };

        let mut line = format!("  {} [{}] {}\n", icon, issue.id, issue.title);
        line.push_str(&format!("     {}\n", issue.detail));
        if issue.severity != Severity::Pass {
            line.push_str(&format!("     Fix: {}\n", issue.suggested_fix));
            if let Some(parts) = fixes.filter(|p| !p.is_empty()) {
                let labels: Vec<String> = parts
                    .iter()
                    .map(|p| format!("{} ({:.0})", p.label(), p.price))
                    .collect();
                line.push_str(&format!("     Compatible: {}\n", labels.join(", ")));
            }
        }
        line.push('\n');
        line
    }

    fn format_report_markdown(
        &self,
        report: &CompatibilityReport,
        fixes: &FixCandidates,
    ) -> String {
        let mut output = String::new();

        output.push_str("# Rigcheck Compatibility Report\n\n");

        // Summary table
        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Score | {}/100 |\n", report.score));
        output.push_str(&format!("| Parts Selected | {}/8 |\n", report.parts_count));
        output.push_str(&format!("| Total Price | {:.0} |\n", report.total_price));
        output.push_str(&format!(
            "| Estimated Wattage | {}W |\n",
            report.estimated_wattage
        ));
        output.push_str(&format!(
            "| Recommended PSU | {}W |\n",
            report.recommended_psu
        ));

        if !report.issues.is_empty() {
            output.push_str("\n## Findings\n\n");

            for (severity, heading) in [
                (Severity::Fail, "### Failures\n\n"),
                (Severity::Warn, "### Warnings\n\n"),
                (Severity::Pass, "### Passing Checks\n\n"),
            ] {
                let matching: Vec<_> = report
                    .issues
                    .iter()
                    .filter(|i| i.severity == severity)
                    .collect();
                if matching.is_empty() {
                    continue;
                }
                output.push_str(heading);
                for issue in matching {
                    output.push_str(&format!("- **[{}]** {}\n", issue.id, issue.detail));
                    if issue.severity != Severity::Pass {
                        output.push_str(&format!("  - *Fix: {}*\n", issue.suggested_fix));
                        if let Some(parts) = fixes.get(&issue.id).filter(|p| !p.is_empty()) {
                            for part in parts.iter() {
                                output.push_str(&format!(
                                    "  - Compatible: `{}` ({:.0})\n",
                                    part.label(),
                                    part.price
                                ));
                            }
                        }
                    }
                }
                output.push('\n');
            }
        }

        output
    }

    fn format_suggestions_text(
        &self,
        response: &SuggestResponse,
        category: PartCategory,
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nSuggestions for {} (source: {})\n",
            category, response.source
        ));
        output.push_str(&"─".repeat(50));
        output.push('\n');

        if response.suggestions.is_empty() {
            output.push_str("\nNo compatible candidates found.\n");
            return output;
        }

        for (i, suggestion) in response.suggestions.iter().enumerate() {
            output.push_str(&format!(
                "\n{}. {} — {:.0}\n   {}\n",
                i + 1,
                suggestion.part.label(),
                suggestion.part.price,
                suggestion.reason
            ));
        }

        output.push('\n');
        output
    }

    fn format_suggestions_markdown(
        &self,
        response: &SuggestResponse,
        category: PartCategory,
    ) -> String {
        let mut output = format!(
            "# Suggestions: {}\n\nSource: `{}`\n\n",
            category, response.source
        );

        for suggestion in &response.suggestions {
            output.push_str(&format!(
                "- **{}** ({:.0}) — {}\n",
                suggestion.part.label(),
                suggestion.part.price,
                suggestion.reason
            ));
        }

        output
    }

    fn format_build_text(&self, generated: &GeneratedBuild) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nGenerated build (source: {})\n",
            generated.source
        ));
        output.push_str(&"─".repeat(50));
        output.push('\n');

        if generated.picks.is_empty() {
            output.push_str("\nNo parts could be selected from the catalog.\n");
            return output;
        }

        for (category, suggestion) in &generated.picks {
            output.push_str(&format!(
                "\n{:<12} {} — {:.0}\n             {}\n",
                category.to_string(),
                suggestion.part.label(),
                suggestion.part.price,
                suggestion.reason
            ));
        }

        output.push('\n');
        output
    }

    fn format_build_markdown(&self, generated: &GeneratedBuild) -> String {
        let mut output = format!("# Generated Build\n\nSource: `{}`\n\n", generated.source);

        output.push_str("| Category | Part | Price | Reason |\n");
        output.push_str("|----------|------|-------|--------|\n");
        for (category, suggestion) in &generated.picks {
            output.push_str(&format!(
                "| {} | {} | {:.0} | {} |\n",
                category,
                suggestion.part.label(),
                suggestion.part.price,
                suggestion.reason
            ));
        }
        output.push('\n');

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{Build, Part, SpecValue, SuggestionSource};
    use crate::rules;

    fn failing_report() -> CompatibilityReport {
        let mut build = Build::default();
        build.cpu = Some(Part {
            id: "cpu".to_string(),
            category: PartCategory::Cpu,
            brand: "AMD".to_string(),
            name: "Ryzen 7 7700".to_string(),
            price: 28000.0,
            specs: [
                ("socket".to_string(), SpecValue::Text("AM5".to_string())),
                ("tdp".to_string(), SpecValue::Number(105.0)),
            ]
            .into_iter()
            .collect(),
        });
        build.motherboard = Some(Part {
            id: "mb".to_string(),
            category: PartCategory::Motherboard,
            brand: "ASUS".to_string(),
            name: "Z790".to_string(),
            price: 20000.0,
            specs: [(
                "socket".to_string(),
                SpecValue::Text("LGA1700".to_string()),
            )]
            .into_iter()
            .collect(),
        });
        rules::evaluate(&build)
    }

    #[test]
    fn test_text_report_lists_failures_with_fix() {
        let reporter = Reporter::new(OutputFormat::Text);
        let text = reporter.format_report_text(&failing_report(), &FixCandidates::new());

        assert!(text.contains("✗"));
        assert!(text.contains("socket-mismatch"));
        assert!(text.contains("Fix:"));
    }

    #[test]
    fn test_text_report_lists_compatible_replacements() {
        let reporter = Reporter::new(OutputFormat::Text);

        let mut fixes = FixCandidates::new();
        fixes.insert(
            "socket-mismatch".to_string(),
            vec![Part {
                id: "mb-am5".to_string(),
                category: PartCategory::Motherboard,
                brand: "MSI".to_string(),
                name: "B650 Tomahawk".to_string(),
                price: 19000.0,
                specs: Default::default(),
            }],
        );

        let text = reporter.format_report_text(&failing_report(), &fixes);
        assert!(text.contains("Compatible: MSI B650 Tomahawk (19000)"));
    }

    #[test]
    fn test_markdown_report_has_summary_table() {
        let reporter = Reporter::new(OutputFormat::Markdown);
        let md = reporter.format_report_markdown(&failing_report(), &FixCandidates::new());

        assert!(md.contains("| Score | 70/100 |"));
        assert!(md.contains("### Failures"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let report = failing_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: CompatibilityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_suggestions_text_discloses_source() {
        let reporter = Reporter::new(OutputFormat::Text);
        let response = SuggestResponse {
            source: SuggestionSource::Heuristic,
            suggestions: Vec::new(),
        };
        let text = reporter.format_suggestions_text(&response, PartCategory::Gpu);

        assert!(text.contains("source: heuristic"));
        assert!(text.contains("No compatible candidates"));
    }
}
