use anyhow::{Context, Result};
use clap::Parser;
use scope_common::observability::{LogConfig, init_logging};
use scope_config::ScopeConfigLoader;
use scope_pipeline::{Pipeline, RunReport};
use std::path::PathBuf;

/// Answer a developer-tooling question from live web research.
#[derive(Parser)]
#[command(name = "toolscope", version, about)]
struct Cli {
    /// Free-text question, e.g. "feature flag tools for a small team"
    query: String,

    /// Tech-stack hint woven into search and synthesis
    #[arg(long)]
    stack: Option<String>,

    /// Configuration file (env vars with the SCOPE_ prefix overlay it)
    #[arg(short, long, default_value = "scope.yaml")]
    config: PathBuf,

    /// Override pipeline.intent (discover | compare | deep-dive)
    #[arg(long)]
    intent: Option<String>,

    /// Override pipeline.mode (web | academic)
    #[arg(long)]
    mode: Option<String>,

    /// Override pipeline.recency (day | week | month | year)
    #[arg(long)]
    recency: Option<String>,

    /// Override pipeline.depth (quick | standard | deep)
    #[arg(long)]
    depth: Option<String>,

    /// Override pipeline.focus (any | backend | frontend | mlops-data |
    /// devex-collaboration | testing-qa)
    #[arg(long)]
    focus: Option<String>,

    /// Duplicate log events to stderr
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ScopeConfigLoader::new();
    if cli.config.exists() {
        loader = loader.with_file(&cli.config);
    }
    if let Some(overrides) = cli_overrides(&cli) {
        loader = loader.with_overrides_yaml(&overrides);
    }
    let config = loader
        .load()
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let log_path = init_logging(LogConfig {
        app_name: "toolscope",
        emit_stderr: cli.verbose,
        ..LogConfig::default()
    })?;
    tracing::info!(target: "app", log = %log_path.display(), "toolscope starting");

    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run(&cli.query, cli.stack.clone()).await?;

    print_report(&report);
    Ok(())
}

/// CLI flags become one more YAML layer so they win over file and env
/// values, and invalid spellings fail through the same typed validation.
fn cli_overrides(cli: &Cli) -> Option<String> {
    let mut lines = Vec::new();
    for (key, value) in [
        ("intent", &cli.intent),
        ("mode", &cli.mode),
        ("recency", &cli.recency),
        ("depth", &cli.depth),
        ("focus", &cli.focus),
    ] {
        if let Some(v) = value {
            lines.push(format!("  {key}: {v}"));
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(format!("pipeline:\n{}", lines.join("\n")))
    }
}

fn print_report(report: &RunReport) {
    println!(
        "Briefing {} ({:.1}s)\n",
        report.run_id,
        report.duration.as_secs_f64()
    );
    if let Some(summary) = &report.search_summary {
        println!("Research summary: {summary}\n");
    }

    println!("Summary\n  {}\n", indent(&report.briefing.summary));

    println!("Recommended tools & platforms");
    for tool in &report.briefing.recommended_tools {
        println!("  - {tool}");
    }

    println!("\nAdoption steps");
    for (i, step) in report.briefing.adoption_steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }

    println!("\nTrade-offs & caveats\n  {}", indent(&report.briefing.trade_offs));
    println!("\nConfidence: {}", report.briefing.confidence.as_str());
    println!("\nLimitations\n  {}", indent(&report.briefing.limitations));

    println!("\nSources");
    for (i, url) in report.briefing.sources.iter().enumerate() {
        println!("  [S{}] {url}", i + 1);
    }
    if !report.unusable.is_empty() {
        println!("\nSkipped sources");
        for skipped in &report.unusable {
            println!("  - {} ({})", skipped.url, skipped.reason);
        }
    }
}

fn indent(text: &str) -> String {
    text.replace('\n', "\n  ")
}
