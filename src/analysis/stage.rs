//! Stage dwell and progression analysis.

use chrono::{DateTime, Utc};

use crate::analysis::{format_elapsed_hours, hours_since};
use crate::types::{DealProgress, DealStage, StageHistoryEntry};

/// Analyze how long the deal has sat in its current stage and whether it has
/// ever moved. History arrives most-recent-first, already capped.
pub fn analyze_stage_progress(
    stage: &DealStage,
    history: &[StageHistoryEntry],
    now: DateTime<Utc>,
) -> DealProgress {
    // The newest transition into the current stage marks the entry time. A
    // match without a usable timestamp reads the same as no match.
    let entered_at = history
        .iter()
        .find(|entry| entry.stage == stage.as_str())
        .and_then(|entry| entry.timestamp);

    let time_in_stage = match entered_at {
        Some(ts) => format_elapsed_hours(hours_since(now, ts)),
        None => "Unknown".to_string(),
    };

    let stage_advancement = if history.len() > 1 {
        "Progressive"
    } else {
        "Initial stage"
    };

    DealProgress {
        stage: stage.as_str().to_string(),
        time_in_stage,
        stage_advancement: stage_advancement.to_string(),
    }
}
