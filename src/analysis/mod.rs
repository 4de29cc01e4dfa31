//! Rule-based analyzers over a deal's activity records.
//!
//! Each analyzer is a pure function over already-fetched records plus an
//! explicit `now`; nothing in this module touches storage or the wall clock,
//! which keeps every rule testable at fixed instants.

pub mod activity;
pub mod email;
pub mod roadblocks;
pub mod scoring;
pub mod stage;
pub mod summary;

pub use activity::analyze_action_logs;
pub use email::analyze_emails;
pub use roadblocks::detect_roadblocks;
pub use scoring::{assess_performance, classify_responsiveness, score_likelihood};
pub use stage::analyze_stage_progress;
pub use summary::compose_summary;

use chrono::{DateTime, Utc};

/// Fractional hours elapsed from `ts` to `now`. Negative when `ts` lies in
/// the future.
pub(crate) fn hours_since(now: DateTime<Utc>, ts: DateTime<Utc>) -> f64 {
    (now - ts).num_milliseconds() as f64 / 3_600_000.0
}

/// Render an elapsed duration the way the product phrases it: hours below a
/// day, days from there up, one decimal either way.
pub(crate) fn format_elapsed_hours(hours: f64) -> String {
    if hours < 24.0 {
        format!("{:.1} hours", hours)
    } else {
        format!("{:.1} days", hours / 24.0)
    }
}

/// Sort newest-first by the extracted timestamp. Records without one sink to
/// the end; ties keep their incoming order.
pub(crate) fn sort_most_recent_first<T>(items: &mut [T], ts: impl Fn(&T) -> Option<DateTime<Utc>>) {
    items.sort_by(|a, b| match (ts(a), ts(b)) {
        (Some(a_ts), Some(b_ts)) => b_ts.cmp(&a_ts),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
