mod analyzer;
mod discover;
mod fetch;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use rayon::prelude::*;

use analyzer::{analyze_page, collect_outcomes, AnalyzeError, Outcome, ScanConfig, ScanReport};

#[derive(Parser)]
#[command(name = "ym_scan", about = "YieldMax ETF distribution trend scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ETF detail pages discovered from the index
    Discover,
    /// Discover, fetch and analyze every ETF page
    Scan {
        /// Max pages to fetch (default: all discovered)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        tunables: Tunables,
        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Analyze saved HTML files (label = file stem)
    Analyze {
        /// HTML files to analyze
        files: Vec<PathBuf>,
        #[command(flatten)]
        tunables: Tunables,
        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct Tunables {
    /// Weekly window length, in observations
    #[arg(long, default_value = "8")]
    weeks: usize,
    /// Monthly window length, in distinct calendar months
    #[arg(long, default_value = "3")]
    months: usize,
}

impl Tunables {
    fn config(&self) -> ScanConfig {
        ScanConfig {
            weekly_window: self.weeks,
            monthly_months: self.months,
            ..ScanConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Discover => {
            let client = fetch::client()?;
            let pages = discover::discover_pages(&client).await?;
            for page in &pages {
                println!("{:<14} {}", page.slug, page.url);
            }
            println!("{} ETF pages", pages.len());
            Ok(())
        }
        Commands::Scan { limit, tunables, json } => {
            let cfg = tunables.config();
            let client = fetch::client()?;
            let mut pages = discover::discover_pages(&client).await?;
            if let Some(n) = limit {
                pages.truncate(n);
            }
            println!("Scanning {} ETF pages...", pages.len());
            let fetched = fetch::fetch_pages(&client, pages).await?;

            let outcomes: Vec<(String, Outcome)> = fetched
                .into_iter()
                .map(|f| {
                    let outcome = match f.html {
                        Ok(html) => analyze_page(&f.page.slug, &html, &cfg),
                        Err(e) => Outcome::Failed {
                            stage: "fetch",
                            error: AnalyzeError::Fetch(e),
                        },
                    };
                    (f.page.slug, outcome)
                })
                .collect();

            let report = collect_outcomes(outcomes);
            render(&report, &cfg, json)
        }
        Commands::Analyze { files, tunables, json } => {
            if files.is_empty() {
                anyhow::bail!("No input files given");
            }
            let cfg = tunables.config();
            let outcomes: Vec<(String, Outcome)> = files
                .par_iter()
                .map(|path| {
                    let label = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    let outcome = match std::fs::read_to_string(path) {
                        Ok(html) => analyze_page(&label, &html, &cfg),
                        Err(e) => Outcome::Failed {
                            stage: "fetch",
                            error: AnalyzeError::Fetch(e.to_string()),
                        },
                    };
                    (label, outcome)
                })
                .collect();

            let report = collect_outcomes(outcomes);
            render(&report, &cfg, json)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn render(report: &ScanReport, cfg: &ScanConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.matched.is_empty() {
        println!("No ETFs with a strictly increasing distribution window.");
    } else {
        println!(
            "{:>3} | {:<10} | {:<8} | {:>4} | {:<10} | {:<10} | {:>10} | {:>10} | {:>9}",
            "#", "Ticker", "Cadence", "Rows", "First Ex", "Last Ex", "Start", "End", "Change"
        );
        println!("{}", "-".repeat(98));

        for (i, r) in report.matched.iter().enumerate() {
            let first = &r.window[0];
            let last = &r.window[r.window.len() - 1];
            let cadence = if r.cadence_ambiguous {
                format!("{}*", r.cadence)
            } else {
                r.cadence.to_string()
            };
            println!(
                "{:>3} | {:<10} | {:<8} | {:>4} | {:<10} | {:<10} | {:>10} | {:>10} | {:>9}",
                i + 1,
                truncate(&r.ticker, 10),
                cadence,
                r.window.len(),
                first.ex_date.to_string(),
                last.ex_date.to_string(),
                format_money(first.amount, cfg.currency_decimals),
                format_money(last.amount, cfg.currency_decimals),
                format_percent(r.percent_change, cfg.percent_decimals),
            );
        }
        if report.matched.iter().any(|r| r.cadence_ambiguous) {
            println!("  * median gap between thresholds; Monthly assumed");
        }

        // Full amount sequences (separate section to keep the table compact)
        println!("\n--- Windows ---");
        for r in &report.matched {
            let amounts: Vec<String> = r
                .window
                .iter()
                .map(|o| format_money(o.amount, cfg.currency_decimals))
                .collect();
            println!(
                "  {}: {}  ({}, {})",
                r.ticker,
                amounts.join(" "),
                format_money(r.dollar_change, cfg.currency_decimals),
                format_percent(r.percent_change, cfg.percent_decimals),
            );
        }
    }

    println!("\nIncreasing windows: {}", report.matched.len());
    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        let mut by_reason: BTreeMap<String, usize> = BTreeMap::new();
        for d in &report.skipped {
            *by_reason
                .entry(format!("{}: {}", d.stage, d.reason))
                .or_insert(0) += 1;
        }
        for (reason, count) in by_reason {
            println!("- {}: {}", reason, count);
        }
    }
    Ok(())
}

fn format_money(n: f64, decimals: usize) -> String {
    format!("${:.*}", decimals, n)
}

fn format_percent(n: f64, decimals: usize) -> String {
    let sign = if n >= 0.0 { "+" } else { "" };
    format!("{}{:.*}%", sign, decimals, n)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
