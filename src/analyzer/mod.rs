pub mod cadence;
pub mod normalize;
pub mod table;
pub mod ticker;
pub mod trend;
pub mod window;

use chrono::NaiveDate;
use scraper::Html;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use cadence::Cadence;

/// One distribution event parsed from a page row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub ex_date: NaiveDate,
    pub amount: f64,
}

/// Tunables for the analysis pipeline. Passed by reference into every stage;
/// runs with different settings never share state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Weekly window length, in observations.
    pub weekly_window: usize,
    /// Monthly window length, in distinct calendar months.
    pub monthly_months: usize,
    /// Median day-gap at or below which a series is Weekly.
    pub weekly_gap_max: f64,
    /// Median day-gap at or above which a series is Monthly.
    pub monthly_gap_min: f64,
    /// Display precision for dollar amounts.
    pub currency_decimals: usize,
    /// Display precision for percentages.
    pub percent_decimals: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            weekly_window: 8,
            monthly_months: 3,
            weekly_gap_max: 10.0,
            monthly_gap_min: 20.0,
            currency_decimals: 4,
            percent_decimals: 2,
        }
    }
}

/// Page-scoped failures. None of these is ever fatal to the scan as a whole.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no distribution table found")]
    TableNotFound,
    #[error("date/amount columns not found in headers: {headers}")]
    HeadersNotFound { headers: String },
    #[error("no valid distribution rows")]
    NoValidRows,
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl AnalyzeError {
    pub fn stage(&self) -> &'static str {
        match self {
            AnalyzeError::TableNotFound => "locate",
            AnalyzeError::HeadersNotFound { .. } => "headers",
            AnalyzeError::NoValidRows => "rows",
            AnalyzeError::Fetch(_) => "fetch",
        }
    }
}

/// Per-fund result for a strictly increasing window.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub cadence: Cadence,
    /// Median gap fell between the thresholds; Monthly was assumed.
    pub cadence_ambiguous: bool,
    pub window: Vec<Observation>,
    pub dollar_change: f64,
    pub percent_change: f64,
}

/// Exactly one per analyzed page.
#[derive(Debug)]
pub enum Outcome {
    Matched(AnalysisResult),
    NotApplicable { stage: &'static str, reason: String },
    Failed { stage: &'static str, error: AnalyzeError },
}

/// Diagnostic line for a page that did not produce a match.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub label: String,
    pub stage: String,
    pub reason: String,
}

/// Aggregated scan output: matched funds ranked by percent change, plus one
/// diagnostic per page that fell out of the pipeline.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub matched: Vec<AnalysisResult>,
    pub skipped: Vec<Diagnostic>,
}

/// Run the full pipeline over one page's raw markup.
pub fn analyze_page(label: &str, html: &str, cfg: &ScanConfig) -> Outcome {
    let doc = Html::parse_document(html);

    let series = match table::extract_series(&doc) {
        Ok(series) => series,
        Err(error) => {
            return Outcome::Failed {
                stage: error.stage(),
                error,
            }
        }
    };
    debug!("{}: {} observations", label, series.len());

    let inference = cadence::infer(&series, cfg);
    if inference.cadence == Cadence::Unknown {
        return Outcome::NotApplicable {
            stage: "cadence",
            reason: "fewer than 2 observations".to_string(),
        };
    }

    let window = window::select(&series, inference.cadence, cfg);
    if window.len() < 2 {
        return Outcome::NotApplicable {
            stage: "window",
            reason: format!("insufficient rows for a {} window", inference.cadence),
        };
    }

    match trend::classify(&window) {
        Some(change) => Outcome::Matched(AnalysisResult {
            ticker: ticker::resolve(&doc, label),
            cadence: inference.cadence,
            cadence_ambiguous: inference.ambiguous,
            window,
            dollar_change: change.dollar,
            percent_change: change.percent,
        }),
        None => Outcome::NotApplicable {
            stage: "trend",
            reason: "not monotonic".to_string(),
        },
    }
}

/// Fold per-page outcomes (in input order) into a ranked report. The sort is
/// stable, so equal percent changes keep input order.
pub fn collect_outcomes(outcomes: Vec<(String, Outcome)>) -> ScanReport {
    let mut report = ScanReport::default();
    for (label, outcome) in outcomes {
        match outcome {
            Outcome::Matched(result) => report.matched.push(result),
            Outcome::NotApplicable { stage, reason } => report.skipped.push(Diagnostic {
                label,
                stage: stage.to_string(),
                reason,
            }),
            Outcome::Failed { stage, error } => report.skipped.push(Diagnostic {
                label,
                stage: stage.to_string(),
                reason: error.to_string(),
            }),
        }
    }
    report
        .matched
        .sort_by(|a, b| b.percent_change.total_cmp(&a.percent_change));
    report
}

// ── Tests ──
