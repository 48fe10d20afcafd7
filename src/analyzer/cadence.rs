use std::fmt;

use serde::Serialize;

use super::{Observation, ScanConfig};

/// Inferred payout cadence of a distribution series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cadence {
    Weekly,
    Monthly,
    Unknown,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Weekly => write!(f, "Weekly"),
            Cadence::Monthly => write!(f, "Monthly"),
            Cadence::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Cadence plus whether the median gap fell between the two thresholds
/// and was resolved by the Monthly default.
pub struct Inference {
    pub cadence: Cadence,
    pub ambiguous: bool,
}

/// Classify a series from the median of its consecutive day gaps.
/// Fewer than 2 observations means there are no gaps to look at.
pub fn infer(series: &[Observation], cfg: &ScanConfig) -> Inference {
    let gaps: Vec<f64> = series
        .windows(2)
        .map(|w| (w[1].ex_date - w[0].ex_date).num_days().abs() as f64)
        .collect();

    let med = match median(&gaps) {
        Some(m) => m,
        None => {
            return Inference {
                cadence: Cadence::Unknown,
                ambiguous: false,
            }
        }
    };

    if med <= cfg.weekly_gap_max {
        Inference {
            cadence: Cadence::Weekly,
            ambiguous: false,
        }
    } else if med >= cfg.monthly_gap_min {
        Inference {
            cadence: Cadence::Monthly,
            ambiguous: false,
        }
    } else {
        // Between the thresholds: assume the wider window
        Inference {
            cadence: Cadence::Monthly,
            ambiguous: true,
        }
    }
}

/// Median of an unsorted list; even counts average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(start: (i32, u32, u32), step_days: i64, count: usize) -> Vec<Observation> {
        let first = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        (0..count)
            .map(|i| Observation {
                ex_date: first + chrono::Duration::days(step_days * i as i64),
                amount: 0.10 + 0.01 * i as f64,
            })
            .collect()
    }

    #[test]
    fn seven_day_gaps_are_weekly() {
        let inf = infer(&series((2025, 1, 3), 7, 10), &ScanConfig::default());
        assert_eq!(inf.cadence, Cadence::Weekly);
        assert!(!inf.ambiguous);
    }

    #[test]
    fn thirty_day_gaps_are_monthly() {
        let inf = infer(&series((2025, 1, 15), 30, 6), &ScanConfig::default());
        assert_eq!(inf.cadence, Cadence::Monthly);
        assert!(!inf.ambiguous);
    }

    #[test]
    fn fourteen_day_gaps_default_to_monthly() {
        let inf = infer(&series((2025, 1, 3), 14, 6), &ScanConfig::default());
        assert_eq!(inf.cadence, Cadence::Monthly);
        assert!(inf.ambiguous);
    }

    #[test]
    fn short_series_is_unknown() {
        let cfg = ScanConfig::default();
        assert_eq!(infer(&[], &cfg).cadence, Cadence::Unknown);
        assert_eq!(infer(&series((2025, 1, 3), 7, 1), &cfg).cadence, Cadence::Unknown);
    }

    #[test]
    fn median_ignores_input_order() {
        assert_eq!(median(&[30.0, 7.0, 14.0]), Some(14.0));
        assert_eq!(median(&[7.0, 14.0, 30.0]), Some(14.0));
        assert_eq!(median(&[14.0, 30.0, 7.0]), Some(14.0));
    }

    #[test]
    fn median_even_count_averages_middle() {
        assert_eq!(median(&[7.0, 7.0, 28.0, 30.0]), Some(17.5));
        assert_eq!(median(&[]), None);
    }
}
