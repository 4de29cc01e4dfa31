//! Email responsiveness analysis.
//!
//! Pairs outbound mail with the inbound replies that followed and reads the
//! inbound/outbound balance as an engagement level.

use chrono::{DateTime, Utc};

use crate::analysis::format_elapsed_hours;
use crate::types::{EmailAnalysis, EmailDirection, EmailRecord, EngagementLevel};

/// Inbound-to-outbound ratio above which engagement reads high.
const ENGAGED_HIGH_RATIO: f64 = 0.8;
/// Ratio above which engagement reads medium.
const ENGAGED_MEDIUM_RATIO: f64 = 0.4;

const NO_EMAIL_DATA: &str = "No email data available";

/// Analyze the fetched email set (most-recent-first, already capped).
pub fn analyze_emails(emails: &[EmailRecord]) -> EmailAnalysis {
    if emails.is_empty() {
        return EmailAnalysis {
            total_emails: 0,
            response_time: NO_EMAIL_DATA.to_string(),
            engagement_level: EngagementLevel::Unknown,
        };
    }

    let inbound: Vec<&EmailRecord> = emails
        .iter()
        .filter(|e| e.direction == EmailDirection::Inbound)
        .collect();
    let outbound: Vec<&EmailRecord> = emails
        .iter()
        .filter(|e| e.direction == EmailDirection::Outbound)
        .collect();

    let mut total_response_ms: i64 = 0;
    let mut response_count: u32 = 0;
    for sent in &outbound {
        let Some(sent_at) = sent.timestamp else {
            continue;
        };
        if let Some(replied_at) = find_response(sent, sent_at, &inbound) {
            total_response_ms += (replied_at - sent_at).num_milliseconds();
            response_count += 1;
        }
    }

    let avg_hours = if response_count > 0 {
        total_response_ms as f64 / f64::from(response_count) / 3_600_000.0
    } else {
        0.0
    };

    EmailAnalysis {
        total_emails: emails.len(),
        response_time: format_elapsed_hours(avg_hours),
        engagement_level: engagement_level(inbound.len(), outbound.len()),
    }
}

/// The earliest inbound email that reads as a reply to `sent`: strictly
/// later, with a subject containing whatever follows the `"Re:"` marker in
/// the outbound subject.
///
/// An outbound subject without a `"Re:"` marker yields an empty needle,
/// which every subject contains, so any later inbound email counts as the
/// response. Kept as documented behavior pending product clarification of
/// thread matching.
fn find_response(
    sent: &EmailRecord,
    sent_at: DateTime<Utc>,
    inbound: &[&EmailRecord],
) -> Option<DateTime<Utc>> {
    let needle = sent
        .subject
        .split_once("Re:")
        .map(|(_, rest)| rest)
        .unwrap_or("");

    inbound
        .iter()
        .filter(|reply| reply.subject.contains(needle))
        .filter_map(|reply| reply.timestamp)
        .filter(|replied_at| *replied_at > sent_at)
        .min()
}

/// Inbound-to-outbound balance. The ratio guard pins zero-outbound sets to
/// low rather than dividing by zero.
fn engagement_level(inbound_count: usize, outbound_count: usize) -> EngagementLevel {
    let ratio = if outbound_count > 0 {
        inbound_count as f64 / outbound_count as f64
    } else {
        0.0
    };

    if ratio > ENGAGED_HIGH_RATIO {
        EngagementLevel::High
    } else if ratio > ENGAGED_MEDIUM_RATIO {
        EngagementLevel::Medium
    } else {
        EngagementLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn email(direction: EmailDirection, subject: &str, ts: Option<DateTime<Utc>>) -> EmailRecord {
        EmailRecord {
            id: uuid::Uuid::new_v4().to_string(),
            direction,
            subject: subject.to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_empty_set_short_circuits() {
        let analysis = analyze_emails(&[]);
        assert_eq!(analysis.total_emails, 0);
        assert_eq!(analysis.response_time, "No email data available");
        assert_eq!(analysis.engagement_level, EngagementLevel::Unknown);
    }

    #[test]
    fn test_zero_outbound_reads_low_even_with_inbound() {
        let now = base();
        let emails = vec![
            email(EmailDirection::Inbound, "Question about pricing", Some(now)),
            email(
                EmailDirection::Inbound,
                "Another question",
                Some(now - Duration::hours(1)),
            ),
        ];
        let analysis = analyze_emails(&emails);
        assert_eq!(analysis.engagement_level, EngagementLevel::Low);
        assert_eq!(analysis.total_emails, 2);
    }

    #[test]
    fn test_near_balanced_thread_reads_high() {
        let now = base();
        let mut emails = Vec::new();
        for i in 0..10 {
            emails.push(email(
                EmailDirection::Outbound,
                &format!("Update {i}"),
                Some(now - Duration::hours(i * 2)),
            ));
        }
        for i in 0..9 {
            emails.push(email(
                EmailDirection::Inbound,
                &format!("Re: Update {i}"),
                Some(now - Duration::hours(i * 2 - 1)),
            ));
        }
        let analysis = analyze_emails(&emails);
        assert_eq!(analysis.total_emails, 19);
        assert_eq!(analysis.engagement_level, EngagementLevel::High);
    }

    #[test]
    fn test_moderate_ratio_reads_medium() {
        let now = base();
        let mut emails: Vec<EmailRecord> = (0..4)
            .map(|i| {
                email(
                    EmailDirection::Outbound,
                    &format!("Check-in {i}"),
                    Some(now - Duration::hours(i)),
                )
            })
            .collect();
        emails.push(email(
            EmailDirection::Inbound,
            "Thanks for the check-ins",
            Some(now),
        ));
        emails.push(email(
            EmailDirection::Inbound,
            "One more thing",
            Some(now),
        ));
        // 2 inbound over 4 outbound sits between the ratio cutoffs.
        assert_eq!(analyze_emails(&emails).engagement_level, EngagementLevel::Medium);
    }

    #[test]
    fn test_reply_matching_takes_earliest_later_inbound() {
        let now = base();
        let emails = vec![
            email(
                EmailDirection::Outbound,
                "Re: Contract terms",
                Some(now - Duration::hours(10)),
            ),
            email(
                EmailDirection::Inbound,
                "Re: Contract terms",
                Some(now - Duration::hours(6)),
            ),
            email(
                EmailDirection::Inbound,
                "Re: Contract terms",
                Some(now - Duration::hours(2)),
            ),
        ];
        // The earlier of the two replies wins: 4.0 hours, not 8.0.
        assert_eq!(analyze_emails(&emails).response_time, "4.0 hours");
    }

    #[test]
    fn test_unrelated_inbound_subject_is_not_a_response() {
        let now = base();
        let emails = vec![
            email(
                EmailDirection::Outbound,
                "Re: Renewal quote",
                Some(now - Duration::hours(10)),
            ),
            email(
                EmailDirection::Inbound,
                "Invoice overdue",
                Some(now - Duration::hours(5)),
            ),
        ];
        assert_eq!(analyze_emails(&emails).response_time, "0.0 hours");
    }

    #[test]
    fn test_missing_re_marker_matches_any_later_inbound() {
        let now = base();
        let emails = vec![
            email(
                EmailDirection::Outbound,
                "Proposal",
                Some(now - Duration::hours(8)),
            ),
            email(
                EmailDirection::Inbound,
                "Completely unrelated subject",
                Some(now - Duration::hours(5)),
            ),
        ];
        // No "Re:" marker means an empty needle, so any later inbound email
        // counts as the response. Documented behavior, asserted as-is.
        assert_eq!(analyze_emails(&emails).response_time, "3.0 hours");
    }

    #[test]
    fn test_response_must_be_strictly_later() {
        let now = base();
        let emails = vec![
            email(
                EmailDirection::Outbound,
                "Kickoff agenda",
                Some(now - Duration::hours(2)),
            ),
            email(
                EmailDirection::Inbound,
                "Re: Kickoff agenda",
                Some(now - Duration::hours(4)),
            ),
        ];
        assert_eq!(analyze_emails(&emails).response_time, "0.0 hours");
    }

    #[test]
    fn test_outbound_without_timestamp_is_skipped_for_pairing() {
        let now = base();
        let emails = vec![
            email(EmailDirection::Outbound, "Pricing sheet", None),
            email(EmailDirection::Inbound, "Re: Pricing sheet", Some(now)),
        ];
        let analysis = analyze_emails(&emails);
        assert_eq!(analysis.response_time, "0.0 hours");
        // The undated email still counts toward volume and ratio.
        assert_eq!(analysis.total_emails, 2);
    }

    #[test]
    fn test_multi_day_average_formats_in_days() {
        let now = base();
        let emails = vec![
            email(
                EmailDirection::Outbound,
                "Re: Security review",
                Some(now - Duration::hours(72)),
            ),
            email(
                EmailDirection::Inbound,
                "Re: Security review",
                Some(now - Duration::hours(24)),
            ),
        ];
        assert_eq!(analyze_emails(&emails).response_time, "2.0 days");
    }
}
