use chrono::Datelike;

use super::cadence::Cadence;
use super::{Observation, ScanConfig};

/// Trailing slice of a series per the cadence's windowing rule, always
/// chronologically ascending. Empty when the series cannot fill the window.
pub fn select(series: &[Observation], cadence: Cadence, cfg: &ScanConfig) -> Vec<Observation> {
    match cadence {
        Cadence::Weekly => trailing_count(series, cfg.weekly_window),
        Cadence::Monthly => trailing_months(series, cfg.monthly_months),
        Cadence::Unknown => Vec::new(),
    }
}

fn trailing_count(series: &[Observation], count: usize) -> Vec<Observation> {
    if series.len() < count {
        return Vec::new();
    }
    series[series.len() - count..].to_vec()
}

/// Keep every observation in the most recent `months` distinct calendar
/// year-month buckets; a month may contribute more than one observation.
fn trailing_months(series: &[Observation], months: usize) -> Vec<Observation> {
    let mut buckets: Vec<(i32, u32)> = Vec::new();
    for obs in series.iter().rev() {
        let ym = (obs.ex_date.year(), obs.ex_date.month());
        if !buckets.contains(&ym) {
            buckets.push(ym);
            if buckets.len() == months {
                break;
            }
        }
    }
    if buckets.len() < months {
        return Vec::new();
    }
    series
        .iter()
        .filter(|o| buckets.contains(&(o.ex_date.year(), o.ex_date.month())))
        .copied()
        .collect()
}

// ── Tests ──
