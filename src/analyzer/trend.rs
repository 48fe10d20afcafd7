use serde::Serialize;

use super::Observation;

/// Magnitude of change across a window, raw and unrounded. Rounding is a
/// presentation concern and happens exactly once, at render time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Change {
    pub dollar: f64,
    pub percent: f64,
}

/// Some(change) only when the window's amounts are strictly increasing.
/// A window shorter than 2 is never considered increasing.
pub fn classify(window: &[Observation]) -> Option<Change> {
    if !strictly_increasing(window) {
        return None;
    }
    let first = window[0].amount;
    let last = window[window.len() - 1].amount;
    let dollar = last - first;
    let percent = if first == 0.0 {
        0.0
    } else {
        (last / first - 1.0) * 100.0
    };
    Some(Change { dollar, percent })
}

fn strictly_increasing(window: &[Observation]) -> bool {
    if window.len() < 2 {
        return false;
    }
    window.windows(2).all(|w| w[1].amount > w[0].amount)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window(amounts: &[f64]) -> Vec<Observation> {
        let first = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Observation {
                ex_date: first + chrono::Duration::days(7 * i as i64),
                amount: *amount,
            })
            .collect()
    }

    #[test]
    fn flat_step_is_not_monotonic() {
        assert!(classify(&window(&[1.00, 1.00, 1.05])).is_none());
    }

    #[test]
    fn decreasing_is_not_monotonic() {
        assert!(classify(&window(&[1.25, 1.10, 1.00])).is_none());
    }

    #[test]
    fn increasing_window_reports_change() {
        let change = classify(&window(&[1.00, 1.10, 1.25])).unwrap();
        assert!((change.dollar - 0.25).abs() < 1e-9);
        assert!((change.percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn short_windows_never_qualify() {
        assert!(classify(&window(&[])).is_none());
        assert!(classify(&window(&[1.00])).is_none());
    }

    #[test]
    fn zero_start_pins_percent_to_zero() {
        let change = classify(&window(&[0.0, 0.10])).unwrap();
        assert!((change.dollar - 0.10).abs() < 1e-9);
        assert_eq!(change.percent, 0.0);
    }
}
