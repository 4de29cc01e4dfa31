//! Tri-state classifiers: responsiveness, likelihood to close, performance.
//!
//! Likelihood and performance are additive scores bucketed at shared
//! cutoffs; responsiveness is a direct read of engagement.

use chrono::{DateTime, Utc};

use crate::analysis::hours_since;
use crate::types::{ActionLogEntry, DealStage, EngagementLevel, PerformanceGrade, Rating};

/// Score at or above which a signal classifies high / excellent.
const HIGH_CUTOFF: f64 = 0.7;
/// Score at or above which a signal classifies medium / good.
const MEDIUM_CUTOFF: f64 = 0.4;

/// Recent-activity window for the likelihood score.
const LIKELIHOOD_ACTIVITY_HOURS: f64 = 168.0;
/// Recent-activity window for the performance score.
const PERFORMANCE_ACTIVITY_HOURS: f64 = 72.0;

/// Customer responsiveness is a passthrough of engagement; the Unknown
/// no-data fallback grades low.
pub fn classify_responsiveness(engagement: EngagementLevel) -> Rating {
    match engagement {
        EngagementLevel::High => Rating::High,
        EngagementLevel::Medium => Rating::Medium,
        _ => Rating::Low,
    }
}

/// Likelihood to close: stage weight plus engagement bonus plus a
/// recent-activity adjustment.
pub fn score_likelihood(
    stage: &DealStage,
    engagement: EngagementLevel,
    logs: &[ActionLogEntry],
    now: DateTime<Utc>,
) -> Rating {
    let mut score = stage_weight(stage);
    score += engagement_bonus(engagement);

    let recent = logs_within(logs, now, LIKELIHOOD_ACTIVITY_HOURS);
    if recent > 5 {
        score += 0.1;
    } else if recent == 0 {
        score -= 0.2;
    }

    if score >= HIGH_CUTOFF {
        Rating::High
    } else if score >= MEDIUM_CUTOFF {
        Rating::Medium
    } else {
        Rating::Low
    }
}

/// Salesperson performance: follow-up cadence, stage advancement, engagement,
/// and a short-window activity burst.
pub fn assess_performance(
    engagement: EngagementLevel,
    logs: &[ActionLogEntry],
    now: DateTime<Utc>,
) -> PerformanceGrade {
    let mut score = 0.0;

    let follow_ups = logs
        .iter()
        .filter(|entry| entry.action.contains("email_sent") || entry.action.contains("follow_up"))
        .count();
    if follow_ups > 5 {
        score += 0.3;
    } else if follow_ups > 2 {
        score += 0.2;
    }

    if logs.iter().any(|entry| entry.action.contains("stage_advance")) {
        score += 0.3;
    }

    score += engagement_bonus(engagement);

    if logs_within(logs, now, PERFORMANCE_ACTIVITY_HOURS) > 3 {
        score += 0.2;
    }

    if score >= HIGH_CUTOFF {
        PerformanceGrade::Excellent
    } else if score >= MEDIUM_CUTOFF {
        PerformanceGrade::Good
    } else {
        PerformanceGrade::NeedsImprovement
    }
}

/// Weight of each pipeline stage toward likelihood. Extension stages carry
/// the entry-stage weight.
fn stage_weight(stage: &DealStage) -> f64 {
    match stage {
        DealStage::Discovery => 0.1,
        DealStage::Qualification => 0.2,
        DealStage::Proposal => 0.4,
        DealStage::Negotiation => 0.7,
        DealStage::ClosedWon => 1.0,
        DealStage::ClosedLost => 0.0,
        DealStage::Other(_) => 0.1,
    }
}

fn engagement_bonus(engagement: EngagementLevel) -> f64 {
    match engagement {
        EngagementLevel::High => 0.2,
        EngagementLevel::Medium => 0.1,
        _ => 0.0,
    }
}

/// Count entries that can be placed within the last `window_hours`. Undated
/// entries never count.
fn logs_within(logs: &[ActionLogEntry], now: DateTime<Utc>, window_hours: f64) -> usize {
    logs.iter()
        .filter_map(|entry| entry.timestamp)
        .filter(|ts| hours_since(now, *ts) < window_hours)
        .count()
}
