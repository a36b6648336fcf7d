use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modelmerge_core::{
    CompareConfig, ComparisonReport, ComparisonStatus, ReportFormat, ResolutionKind, SchemaModel,
    Severity,
};
use modelmerge_engine::{ComparisonSession, DecisionMap};

/// modelmerge - Compare and merge schema model snapshots
#[derive(Parser)]
#[command(name = "modelmerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: modelmerge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a model description
    Validate {
        /// Path to the model JSON
        model: PathBuf,
    },

    /// Compare two models and print a report
    Compare {
        /// Baseline model JSON
        left: PathBuf,

        /// Revised model JSON
        right: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,

        /// Exit with status 1 when the models differ
        #[arg(long)]
        fail_on_diff: bool,
    },

    /// Apply a decision file and write the merge model
    Merge {
        /// Baseline model JSON
        left: PathBuf,

        /// Revised model JSON
        right: PathBuf,

        /// Decision file: { "<entity>": { "decision": "take-left" }, ... }
        #[arg(short, long)]
        decisions: PathBuf,

        /// Output file for the merge model (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export even if some differences have no decision
        #[arg(long)]
        allow_unresolved: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Detailed,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        CompareConfig::from_file(config_path)?
    } else if Path::new("modelmerge.toml").exists() {
        CompareConfig::from_file(Path::new("modelmerge.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        CompareConfig::default()
    };

    match cli.command {
        Commands::Validate { model } => validate_command(&model, cli.verbose),
        Commands::Compare {
            left,
            right,
            format,
            output,
            markdown,
            fail_on_diff,
        } => compare_command(
            config,
            &left,
            &right,
            format,
            output.as_deref(),
            markdown.as_deref(),
            fail_on_diff,
            cli.verbose,
        ),
        Commands::Merge {
            left,
            right,
            decisions,
            output,
            allow_unresolved,
        } => merge_command(
            config,
            &left,
            &right,
            &decisions,
            output.as_deref(),
            allow_unresolved,
            cli.verbose,
        ),
    }
}

fn load_model(path: &Path, verbose: bool) -> Result<SchemaModel> {
    if verbose {
        eprintln!("{} {}", "Loading model from:".cyan(), path.display());
    }

    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    SchemaModel::from_json(&json)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
}

/// Validate command - load a model and print its shape
fn validate_command(path: &Path, verbose: bool) -> Result<()> {
    let model = load_model(path, verbose)?;

    println!("{} {}", "✓ Valid model:".green().bold(), model.header());
    println!("  Entities:      {}", model.entities().len());
    println!("  Attributes:    {}", model.attribute_count());
    println!("  Relationships: {}", model.relationship_count());

    if verbose {
        for entity in model.entities() {
            eprintln!(
                "  {} ({} attributes, {} relationships)",
                entity.name,
                entity.attributes.len(),
                entity.relationships.len()
            );
        }
    }

    Ok(())
}

/// Compare command - run a session and report the differences
#[allow(clippy::too_many_arguments)]
fn compare_command(
    config: CompareConfig,
    left: &Path,
    right: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    markdown: Option<&Path>,
    fail_on_diff: bool,
    verbose: bool,
) -> Result<()> {
    let left = load_model(left, verbose)?;
    let right = load_model(right, verbose)?;

    if verbose {
        eprintln!("{}", "Comparing models...".cyan());
    }

    let mut session = ComparisonSession::new(config);
    session.start(left, right)?;
    let report = session.report()?;

    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Summary => print_report_summary(&report, ReportFormat::Summary),
        OutputFormat::Detailed => print_report_summary(&report, ReportFormat::Detailed),
    }

    if fail_on_diff && report.has_differences() {
        std::process::exit(1);
    }

    Ok(())
}

/// Merge command - apply a decision file and export the merge model
fn merge_command(
    mut config: CompareConfig,
    left: &Path,
    right: &Path,
    decisions_path: &Path,
    output: Option<&Path>,
    allow_unresolved: bool,
    verbose: bool,
) -> Result<()> {
    let left = load_model(left, verbose)?;
    let right = load_model(right, verbose)?;

    let decisions_json = std::fs::read_to_string(decisions_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", decisions_path.display(), e))?;
    let decisions: DecisionMap = serde_json::from_str(&decisions_json)
        .map_err(|e| anyhow::anyhow!("Invalid decision file {}: {}", decisions_path.display(), e))?;

    if allow_unresolved {
        tracing::info!("unresolved results will be left out of the merge model");
        config = config.without_merge();
    }

    let mut session = ComparisonSession::new(config);
    session.start(left, right)?;

    tracing::info!(decisions = decisions.len(), file = %decisions_path.display(), "applying decisions");
    for (key, decision) in decisions {
        tracing::debug!(key = %key, decision = %decision.kind(), "applying decision");
        session.resolve(&key, decision)?;
    }

    let progress = session.progress();
    let merged = session.export_merge_model()?;
    let json = merged.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), "merge model written");
            eprintln!(
                "{} {} ({} entities, {})",
                "✓ Merge model written to".green().bold(),
                path.display(),
                merged.entities().len(),
                progress
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn print_report_summary(report: &ComparisonReport, format: ReportFormat) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Model Comparison Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Left:  {}", report.left);
    println!("Right: {}", report.right);
    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    if format == ReportFormat::Detailed {
        println!("Left digest:  {}", report.left_digest);
        println!("Right digest: {}", report.right_digest);
    }
    println!();

    let s = &report.summary;
    println!("{}", "Summary:".bold());
    println!(
        "  Objects:  {} ({} same, {} different, {} new, {} removed)",
        s.total, s.same, s.different, s.new, s.removed
    );

    if s.errors > 0 {
        println!("  Errors:   {}", format!("{}", s.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", s.errors).green());
    }

    if s.warnings > 0 {
        println!("  Warnings: {}", format!("{}", s.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", s.warnings).green());
    }

    println!("  Info:     {}", s.info);
    println!("  Resolved: {}/{}", s.resolved, s.resolved + s.pending);
    println!();

    if !report.has_differences() {
        println!("{}", "✓ Models are identical".green().bold());
    } else {
        println!("{}", "Results:".bold());
        for result in &report.results {
            let status = match result.status {
                ComparisonStatus::Same => "same".dimmed(),
                ComparisonStatus::Different => "different".yellow().bold(),
                ComparisonStatus::New => "new".green().bold(),
                ComparisonStatus::Removed => "removed".red().bold(),
            };
            let resolution = report
                .resolutions
                .get(&result.key)
                .copied()
                .unwrap_or(ResolutionKind::Unresolved);

            if result.needs_resolution() {
                println!("  {:<9} {} [{}]", status, result.key, resolution);
            } else {
                println!("  {:<9} {}", status, result.key);
            }

            if format == ReportFormat::Detailed {
                for conflict in &result.conflicts {
                    let severity_str = match conflict.severity {
                        Severity::Error => "ERROR".red().bold(),
                        Severity::Warn => "WARN".yellow().bold(),
                        Severity::Info => "INFO".cyan(),
                    };

                    println!(
                        "    [{}] {} {}: {}",
                        severity_str, conflict.code, conflict.subject, conflict.message
                    );
                    if let Some(left) = &conflict.left {
                        println!("      Left:  {}", left);
                    }
                    if let Some(right) = &conflict.right {
                        println!("      Right: {}", right);
                    }
                }
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &ComparisonReport) -> String {
    let mut md = String::new();

    md.push_str("# Model Comparison Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));
    md.push_str(&format!("**Left:** {}\n\n", report.left));
    md.push_str(&format!("**Right:** {}\n\n", report.right));

    let s = &report.summary;
    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Objects: {}\n", s.total));
    md.push_str(&format!("- Same: {}\n", s.same));
    md.push_str(&format!("- Different: {}\n", s.different));
    md.push_str(&format!("- New: {}\n", s.new));
    md.push_str(&format!("- Removed: {}\n", s.removed));
    md.push_str(&format!("- Errors: {}\n", s.errors));
    md.push_str(&format!("- Warnings: {}\n", s.warnings));
    md.push_str(&format!("- Info: {}\n", s.info));
    md.push_str(&format!("- Resolved: {}/{}\n", s.resolved, s.resolved + s.pending));
    md.push('\n');

    if !report.has_differences() {
        md.push_str("✅ **Models are identical!**\n");
        return md;
    }

    md.push_str("## Results\n\n");
    md.push_str("| Entity | Status | Conflicts | Decision |\n");
    md.push_str("|--------|--------|-----------|----------|\n");
    for result in &report.results {
        let decision = report
            .resolutions
            .get(&result.key)
            .copied()
            .unwrap_or(ResolutionKind::Unresolved);
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            result.key,
            result.status,
            result.conflicts.len(),
            decision
        ));
    }
    md.push('\n');

    for result in report.results.iter().filter(|r| !r.conflicts.is_empty()) {
        md.push_str(&format!("### {}\n\n", result.key));

        for conflict in &result.conflicts {
            let severity_emoji = match conflict.severity {
                Severity::Error => "❌",
                Severity::Warn => "⚠️",
                Severity::Info => "ℹ️",
            };

            md.push_str(&format!(
                "- {} **{}** `{}`: {}\n",
                severity_emoji, conflict.code, conflict.subject, conflict.message
            ));
            if let Some(left) = &conflict.left {
                md.push_str(&format!("  - Left: `{}`\n", left));
            }
            if let Some(right) = &conflict.right {
                md.push_str(&format!("  - Right: `{}`\n", right));
            }
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelmerge_core::{Attribute, Constraint, Entity};

    fn sample_report() -> ComparisonReport {
        let left = SchemaModel::new(
            "v1",
            "Sales",
            "1",
            vec![Entity::new("c", "Customer")
                .with_attribute(Attribute::new("CustomerID", "INT").with_constraint(Constraint::PrimaryKey))],
        )
        .unwrap();
        let right = SchemaModel::new(
            "v2",
            "Sales",
            "2",
            vec![Entity::new("c", "Customer")
                .with_attribute(Attribute::new("CustomerID", "BIGINT").with_constraint(Constraint::PrimaryKey))],
        )
        .unwrap();

        let mut session = ComparisonSession::new(CompareConfig::default());
        session.start(left, right).unwrap();
        session.report().unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_compare_args() {
        let cli = Cli::try_parse_from([
            "modelmerge",
            "compare",
            "left.json",
            "right.json",
            "--format",
            "detailed",
            "--fail-on-diff",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare { format, fail_on_diff, output, .. } => {
                assert_eq!(format, OutputFormat::Detailed);
                assert!(fail_on_diff);
                assert!(output.is_none());
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn markdown_report_lists_conflicts() {
        let md = generate_markdown_report(&sample_report());

        assert!(md.starts_with("# Model Comparison Report"));
        assert!(md.contains("| Customer | different | 1 | unresolved |"));
        assert!(md.contains("**TYPE_CHANGED** `Customer.CustomerID`: type changed from INT to BIGINT"));
        assert!(md.contains("  - Right: `BIGINT`"));
    }

    #[test]
    fn merge_writes_only_decided_entities() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.json");
        let right = dir.path().join("right.json");
        let decisions = dir.path().join("decisions.json");
        let output = dir.path().join("merged.json");

        std::fs::write(
            &left,
            r#"{ "id": "v1", "name": "Sales", "entities": [
                { "id": "c", "name": "Customer", "attributes": [ { "name": "Email", "type": "TEXT" } ] },
                { "id": "o", "name": "Order", "attributes": [ { "name": "Total", "type": "INT" } ] } ] }"#,
        )
        .unwrap();
        std::fs::write(
            &right,
            r#"{ "id": "v2", "name": "Sales", "entities": [
                { "id": "c", "name": "Customer", "attributes": [ { "name": "Email", "type": "VARCHAR(255)" } ] },
                { "id": "o", "name": "Order", "attributes": [ { "name": "Total", "type": "BIGINT" } ] } ] }"#,
        )
        .unwrap();
        std::fs::write(&decisions, r#"{ "Customer": { "decision": "take-right" } }"#).unwrap();

        let blocked = merge_command(
            CompareConfig::default(),
            &left,
            &right,
            &decisions,
            Some(output.as_path()),
            false,
            false,
        );
        assert!(blocked.unwrap_err().to_string().contains("Order"));
        assert!(!output.exists());

        merge_command(
            CompareConfig::default(),
            &left,
            &right,
            &decisions,
            Some(output.as_path()),
            true,
            false,
        )
        .unwrap();

        let merged: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let names: Vec<&str> = merged["entities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Customer"]);
    }

    #[test]
    fn load_model_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{ "id": "m", "name": "M", "entities": [ { "name": "" } ] }"#).unwrap();

        let err = load_model(&path, false).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
