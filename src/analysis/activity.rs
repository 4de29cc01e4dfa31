//! Automated-action-log analysis.
//!
//! Reads the assistant's recorded actions on a deal into a recency
//! classification plus a short list of templated key insights.

use chrono::{DateTime, Utc};

use crate::analysis::hours_since;
use crate::types::{ActionLogEntry, AiLogsAnalysis};

/// Newest entries scanned for key insights.
const INSIGHT_SCAN_WINDOW: usize = 10;
/// Cap on insights surfaced per run.
const MAX_KEY_INSIGHTS: usize = 5;

const NO_RECENT_ACTIVITY: &str = "No recent AI activity";

/// Analyze the fetched action-log entries (most-recent-first, already
/// capped).
pub fn analyze_action_logs(logs: &[ActionLogEntry], now: DateTime<Utc>) -> AiLogsAnalysis {
    if logs.is_empty() {
        return AiLogsAnalysis {
            total_logs: 0,
            recent_activity: NO_RECENT_ACTIVITY.to_string(),
            key_insights: Vec::new(),
        };
    }

    let mut key_insights = Vec::new();
    for entry in logs.iter().take(INSIGHT_SCAN_WINDOW) {
        // Substring checks are independent; one entry can contribute more
        // than one insight.
        if entry.action.contains("stage_advance") {
            let new_stage = entry
                .new_stage
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("next stage");
            key_insights.push(format!("Stage advanced to {new_stage}"));
        }
        if entry.action.contains("email_sent") {
            key_insights.push("Follow-up email sent".to_string());
        }
        if entry.action.contains("meeting_scheduled") {
            key_insights.push("Meeting scheduled".to_string());
        }
        if entry.action.contains("proposal_sent") {
            key_insights.push("Proposal sent to customer".to_string());
        }
    }
    key_insights.truncate(MAX_KEY_INSIGHTS);

    // Entries arrive newest first; an unusable timestamp on the newest entry
    // reads as zero hours old.
    let hours = logs[0]
        .timestamp
        .map(|ts| hours_since(now, ts))
        .unwrap_or(0.0);

    AiLogsAnalysis {
        total_logs: logs.len(),
        recent_activity: classify_recency(hours).to_string(),
        key_insights,
    }
}

fn classify_recency(hours: f64) -> &'static str {
    if hours < 24.0 {
        "Very recent (within 24 hours)"
    } else if hours < 72.0 {
        "Recent (within 3 days)"
    } else if hours < 168.0 {
        "Moderate (within 1 week)"
    } else {
        "Stale (over 1 week)"
    }
}
