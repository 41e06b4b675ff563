//! Status reporter
//!
//! Derives the observer-facing [`StatusSnapshot`] from the session, the
//! remaining print lane and the last temperature reading.

use chrono::{DateTime, Duration, Utc};
use printhost_core::{PrintProgress, PrintStatus, StatusSnapshot};

/// Minutes a print must run before an ETA is estimated
pub const ETA_MIN_ELAPSED_MINUTES: f64 = 2.0;

/// Share of the print lane already sent, in percent
pub fn progress_percent(total_lines: usize, remaining_lines: usize) -> f64 {
    if total_lines == 0 {
        return 0.0;
    }
    let sent = total_lines.saturating_sub(remaining_lines);
    sent as f64 / total_lines as f64 * 100.0
}

/// Fractional minutes between `start` and `now`, direction ignored
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - start).num_milliseconds().unsigned_abs() as f64 / 60_000.0
}

/// Linear completion estimate
///
/// Only available once more than two minutes have elapsed and some progress
/// was made.
pub fn estimate_completion(
    start: DateTime<Utc>,
    elapsed_minutes: f64,
    progress_percent: f64,
) -> Option<DateTime<Utc>> {
    if elapsed_minutes <= ETA_MIN_ELAPSED_MINUTES || progress_percent <= 0.0 {
        return None;
    }
    let total_minutes = elapsed_minutes / progress_percent * 100.0;
    let total_ms = (total_minutes * 60_000.0).round() as i64;
    start.checked_add_signed(Duration::milliseconds(total_ms))
}

/// Build the snapshot for the current state
pub fn snapshot(
    status: PrintStatus,
    temperature: Option<f64>,
    start_time: Option<DateTime<Utc>>,
    total_lines: usize,
    remaining_lines: usize,
    now: DateTime<Utc>,
) -> StatusSnapshot {
    let progress = match (status, start_time) {
        (PrintStatus::Printing, Some(start)) => {
            let percent = progress_percent(total_lines, remaining_lines);
            let elapsed = elapsed_minutes(start, now);
            Some(PrintProgress {
                progress: percent.round(),
                print_start_time: start,
                elapsed_minutes: elapsed.floor() as u64,
                eta: estimate_completion(start, elapsed, percent),
            })
        }
        _ => None,
    };

    StatusSnapshot {
        print_status: status,
        temperature,
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(4, 4), 0.0);
        assert_eq!(progress_percent(4, 1), 75.0);
        assert_eq!(progress_percent(4, 0), 100.0);
        assert_eq!(progress_percent(0, 0), 0.0);
    }

    #[test]
    fn test_eta_absent_at_two_minutes() {
        let now = start() + Duration::minutes(2);
        let snap = snapshot(PrintStatus::Printing, Some(200.0), Some(start()), 10, 5, now);
        let progress = snap.progress.unwrap();
        assert_eq!(progress.elapsed_minutes, 2);
        assert_eq!(progress.progress, 50.0);
        assert!(progress.eta.is_none());
    }

    #[test]
    fn test_eta_present_after_threshold() {
        let now = start() + Duration::minutes(10);
        let snap = snapshot(PrintStatus::Printing, None, Some(start()), 4, 2, now);
        let progress = snap.progress.unwrap();
        assert_eq!(progress.elapsed_minutes, 10);
        // 10 minutes for half the lines -> 20 minutes total
        assert_eq!(progress.eta, Some(start() + Duration::minutes(20)));
    }

    #[test]
    fn test_eta_absent_without_progress() {
        let now = start() + Duration::minutes(30);
        let snap = snapshot(PrintStatus::Printing, None, Some(start()), 4, 4, now);
        assert!(snap.progress.unwrap().eta.is_none());
    }

    #[test]
    fn test_elapsed_is_floored() {
        let now = start() + Duration::seconds(179);
        assert_eq!(elapsed_minutes(start(), now).floor() as u64, 2);
        assert!(elapsed_minutes(start(), now) > ETA_MIN_ELAPSED_MINUTES);
    }

    #[test]
    fn test_progress_rounded() {
        let now = start() + Duration::minutes(1);
        let snap = snapshot(PrintStatus::Printing, None, Some(start()), 3, 2, now);
        assert_eq!(snap.progress.unwrap().progress, 33.0);
    }

    #[test]
    fn test_only_printing_reports_progress() {
        for status in [
            PrintStatus::Ready,
            PrintStatus::Paused,
            PrintStatus::Disconnected,
        ] {
            let snap = snapshot(status, Some(21.0), Some(start()), 10, 3, start());
            assert_eq!(snap, StatusSnapshot::idle(status, Some(21.0)));
        }
    }
}
