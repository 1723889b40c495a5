//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::prereqs::{PrereqsPlan, PrereqsReport, StepStatus};
use crate::resource::ResourceDescriptor;
use crate::seed::PushInstructions;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Planned resource row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Name check")]
    check: String,
}

/// Step outcome row for table display.
#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the resources a deploy would ensure.
    #[must_use]
    pub fn format_plan(&self, plan: &PrereqsPlan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &PrereqsPlan) -> String {
        let mut output = String::new();

        let _ = write!(output, "\n📋 AFT prerequisites in {}\n\n", plan.region);

        let descriptors = plan.descriptors();
        let rows: Vec<PlanRow> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| PlanRow {
                index: i + 1,
                resource: d.kind.label().to_string(),
                name: Self::truncate(&d.name, 60),
                check: match d.check_name() {
                    Ok(()) => "ok".green().to_string(),
                    Err(e) => Self::truncate(&e.to_string(), 60).red().to_string(),
                },
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let seeding = if plan.seeds_with_stack() {
            format!(
                "uploaded to s3://{}/{} and committed by the stack",
                plan.artifact_bucket.name, plan.seed_key
            )
        } else {
            String::from("pushed by hand into the new repository")
        };
        let _ = writeln!(
            output,
            "\nSeed files for {} are {seeding}.",
            plan.seed.repository
        );

        let invalid = descriptors.iter().filter(|d| d.check_name().is_err()).count();
        if invalid > 0 {
            let _ = writeln!(
                output,
                "\n{} {invalid} resource name(s) would be rejected before any AWS call.",
                "⚠".yellow()
            );
        }

        output
    }

    /// Formats the outcome of a deploy.
    #[must_use]
    pub fn format_report(&self, report: &PrereqsReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &PrereqsReport) -> String {
        let mut output = String::new();

        let rows: Vec<StepRow> = report
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| StepRow {
                index: i + 1,
                step: s.step.label(),
                name: Self::truncate(&s.step.name, 60),
                status: Self::format_status(s.status),
            })
            .collect();

        output.push('\n');
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if let Some(failure) = report.failure() {
            let _ = write!(
                output,
                "\n{} {} {} failed: {}\n",
                "✗".red(),
                failure.step.label(),
                failure.step.name,
                failure.error.as_deref().unwrap_or("unknown error")
            );
            return output;
        }

        let _ = write!(
            output,
            "\n{} AFT prerequisites ready ({} created)\n",
            "✓".green(),
            report.created_count()
        );

        if let Some(archive) = &report.seed_archive {
            let _ = writeln!(output, "   Seed archive: {}", archive.display());
        }

        if let Some(push) = &report.push_instructions {
            output.push('\n');
            output.push_str(&Self::format_push_instructions(push));
        }

        output
    }

    /// Formats the git commands that seed a directly created repository.
    #[must_use]
    pub fn format_push_instructions(push: &PushInstructions) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "First, check if a '{}' branch exists:\n  {}",
            push.branch, push.check_branch
        );
        let _ = writeln!(
            output,
            "If the above command does not produce any output, create it:\n  {}",
            push.create_branch
        );
        output.push_str("Then, execute the following commands in the seed directory:\n");
        for command in &push.commands {
            let _ = writeln!(output, "  {}", command.cyan());
        }

        output
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson {
                valid: result.is_valid(),
                errors: result.errors.iter().map(ToString::to_string).collect(),
                warnings: if show_warnings {
                    result.warnings.clone()
                } else {
                    Vec::new()
                },
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid\n", "✓".green())
                } else {
                    let mut output = format!(
                        "{} Configuration has {} error(s):\n",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                    output
                };

                if result.warning_count() > 0 {
                    if show_warnings {
                        let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                        for warning in &result.warnings {
                            let _ = writeln!(output, "   - {warning}");
                        }
                    } else {
                        let _ = writeln!(
                            output,
                            "   ({} warning(s), use --warnings to show)",
                            result.warning_count()
                        );
                    }
                }

                output
            }
        }
    }

    /// Formats a step status with color.
    fn format_status(status: StepStatus) -> String {
        let text = status.to_string();
        match status {
            StepStatus::Created | StepStatus::Written | StepStatus::Uploaded => {
                text.green().to_string()
            }
            StepStatus::AlreadyExists => text.blue().to_string(),
            StepStatus::Failed => text.red().to_string(),
            StepStatus::Skipped => text.dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        self.message("success", &"✓".green().to_string(), message)
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        self.message("error", &"✗".red().to_string(), message)
    }

    /// Formats a warning message.
    #[must_use]
    pub fn warning(&self, message: &str) -> String {
        self.message("warning", &"⚠".yellow().to_string(), message)
    }

    fn message(&self, status: &str, symbol: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": status, "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{symbol} {message}"),
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct PlanJson {
    region: String,
    seeds_with_stack: bool,
    seed_archive_key: String,
    resources: Vec<PlannedResourceJson>,
}

#[derive(Serialize)]
struct PlannedResourceJson {
    #[serde(flatten)]
    descriptor: ResourceDescriptor,
    name_compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_error: Option<String>,
}

#[derive(Serialize)]
struct ValidationJson {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl From<&PrereqsPlan> for PlanJson {
    fn from(plan: &PrereqsPlan) -> Self {
        Self {
            region: plan.region.clone(),
            seeds_with_stack: plan.seeds_with_stack(),
            seed_archive_key: plan.seed_key.clone(),
            resources: plan
                .descriptors()
                .into_iter()
                .map(|descriptor| {
                    let name_error = descriptor.check_name().err().map(|e| e.to_string());
                    PlannedResourceJson {
                        descriptor,
                        name_compliant: name_error.is_none(),
                        name_error,
                    }
                })
                .collect(),
        }
    }
}
