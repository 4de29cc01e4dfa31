//! Roadblock detection.
//!
//! Four independent rules over the deal record and its activity. Every rule
//! runs; the output order is the rule order, not a severity ranking.

use chrono::{DateTime, Utc};

use crate::analysis::hours_since;
use crate::types::{ActionLogEntry, Deal, EmailRecord};

/// Hours without stage movement after which a deal counts as stalled.
const STALLED_STAGE_HOURS: f64 = 168.0;
/// Hours of email silence after which communication counts as lapsed.
const QUIET_EMAIL_HOURS: f64 = 168.0;

/// Run every detection rule against the fetched records.
pub fn detect_roadblocks(
    deal: &Deal,
    logs: &[ActionLogEntry],
    emails: &[EmailRecord],
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut roadblocks = Vec::new();

    // Logs arrive newest first, so the first stage-tagged entry is the most
    // recent stage movement.
    let last_stage_touch = logs
        .iter()
        .find(|entry| entry.action.contains("stage"))
        .and_then(|entry| entry.timestamp);
    if let Some(ts) = last_stage_touch {
        if hours_since(now, ts) > STALLED_STAGE_HOURS {
            roadblocks.push("Deal stalled in current stage for over 1 week".to_string());
        }
    }

    let recent_email = emails
        .iter()
        .filter_map(|email| email.timestamp)
        .any(|ts| hours_since(now, ts) < QUIET_EMAIL_HOURS);
    if !recent_email {
        roadblocks.push("No recent email communication with customer".to_string());
    }

    let qualification = deal
        .stage_data
        .as_ref()
        .and_then(|data| data.qualification.as_ref());
    if !has_text(qualification.and_then(|q| q.expected_close_date.as_deref())) {
        roadblocks.push("Missing expected close date".to_string());
    }
    if !has_text(qualification.and_then(|q| q.timeline.as_deref())) {
        roadblocks.push("Missing timeline information".to_string());
    }

    roadblocks
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DealStage, EmailDirection, QualificationData, StageData};
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn deal_with(qualification: Option<QualificationData>) -> Deal {
        Deal {
            id: "deal-1".to_string(),
            name: "Acme Renewal".to_string(),
            stage: DealStage::Negotiation,
            stage_data: qualification.map(|q| StageData {
                qualification: Some(q),
                other: Default::default(),
            }),
            ai_summary: None,
            ai_summary_last_updated: None,
        }
    }

    fn qualified() -> QualificationData {
        QualificationData {
            expected_close_date: Some("2026-06-30".to_string()),
            timeline: Some("Legal review through Q2".to_string()),
            other: Default::default(),
        }
    }

    fn log(action: &str, ts: Option<DateTime<Utc>>) -> ActionLogEntry {
        ActionLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.to_string(),
            timestamp: ts,
            new_stage: None,
        }
    }

    fn inbound_email(ts: Option<DateTime<Utc>>) -> EmailRecord {
        EmailRecord {
            id: uuid::Uuid::new_v4().to_string(),
            direction: EmailDirection::Inbound,
            subject: "Re: Renewal".to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_healthy_deal_has_no_roadblocks() {
        let now = base();
        let logs = vec![log("stage_advance", Some(now - Duration::hours(20)))];
        let emails = vec![inbound_email(Some(now - Duration::hours(3)))];
        let found = detect_roadblocks(&deal_with(Some(qualified())), &logs, &emails, now);
        assert!(found.is_empty(), "unexpected roadblocks: {found:?}");
    }

    #[test]
    fn test_stalled_stage_flagged_after_a_week() {
        let now = base();
        let logs = vec![
            log("note_added", Some(now - Duration::hours(2))),
            log("stage_advance", Some(now - Duration::hours(200))),
        ];
        let emails = vec![inbound_email(Some(now))];
        let found = detect_roadblocks(&deal_with(Some(qualified())), &logs, &emails, now);
        assert_eq!(found, vec!["Deal stalled in current stage for over 1 week"]);
    }

    #[test]
    fn test_fresh_stage_movement_is_not_stalled() {
        let now = base();
        // The newest stage-tagged entry is fresh; the stale one behind it no
        // longer counts.
        let logs = vec![
            log("stage_advance", Some(now - Duration::hours(12))),
            log("stage_advance", Some(now - Duration::hours(400))),
        ];
        let emails = vec![inbound_email(Some(now))];
        let found = detect_roadblocks(&deal_with(Some(qualified())), &logs, &emails, now);
        assert!(found.is_empty());
    }

    #[test]
    fn test_no_stage_logs_means_no_stall_signal() {
        let now = base();
        let logs = vec![log("email_sent", Some(now - Duration::hours(500)))];
        let emails = vec![inbound_email(Some(now))];
        let found = detect_roadblocks(&deal_with(Some(qualified())), &logs, &emails, now);
        assert!(found.is_empty());
    }

    #[test]
    fn test_email_silence_flagged() {
        let now = base();
        let emails = vec![inbound_email(Some(now - Duration::hours(300)))];
        let found = detect_roadblocks(&deal_with(Some(qualified())), &[], &emails, now);
        assert_eq!(found, vec!["No recent email communication with customer"]);
    }

    #[test]
    fn test_no_emails_at_all_counts_as_silence() {
        let found = detect_roadblocks(&deal_with(Some(qualified())), &[], &[], base());
        assert_eq!(found, vec!["No recent email communication with customer"]);
    }

    #[test]
    fn test_undated_emails_do_not_count_as_recent() {
        let found =
            detect_roadblocks(&deal_with(Some(qualified())), &[], &[inbound_email(None)], base());
        assert_eq!(found, vec!["No recent email communication with customer"]);
    }

    #[test]
    fn test_missing_qualification_fields_flagged() {
        let now = base();
        let emails = vec![inbound_email(Some(now))];
        let found = detect_roadblocks(&deal_with(None), &[], &emails, now);
        assert_eq!(
            found,
            vec!["Missing expected close date", "Missing timeline information"]
        );
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let now = base();
        let emails = vec![inbound_email(Some(now))];
        let qualification = QualificationData {
            expected_close_date: Some("2026-06-30".to_string()),
            timeline: Some(String::new()),
            other: Default::default(),
        };
        let found = detect_roadblocks(&deal_with(Some(qualification)), &[], &emails, now);
        assert_eq!(found, vec!["Missing timeline information"]);
    }

    #[test]
    fn test_rules_report_in_fixed_order() {
        let now = base();
        let logs = vec![log("stage_advance", Some(now - Duration::hours(400)))];
        let found = detect_roadblocks(&deal_with(None), &logs, &[], now);
        assert_eq!(
            found,
            vec![
                "Deal stalled in current stage for over 1 week",
                "No recent email communication with customer",
                "Missing expected close date",
                "Missing timeline information",
            ]
        );
    }
}
