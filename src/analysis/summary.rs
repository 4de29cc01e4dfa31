//! Narrative summary composition.

use crate::types::{AiLogsAnalysis, DealProgress, EmailAnalysis};

/// Compose the narrative paragraph from the analyzer outputs.
///
/// Clause order is fixed; optional clauses append only when their guard
/// holds. Output keeps its trailing space.
pub fn compose_summary(
    deal_name: &str,
    email: &EmailAnalysis,
    activity: &AiLogsAnalysis,
    progress: &DealProgress,
    roadblocks: &[String],
) -> String {
    let mut summary = String::new();

    summary.push_str(&format!(
        "Deal \"{}\" is currently in the {} stage. ",
        deal_name, progress.stage
    ));

    if email.total_emails > 0 {
        summary.push_str(&format!(
            "Customer engagement is {} with an average response time of {}. ",
            email.engagement_level, email.response_time
        ));
    } else {
        summary.push_str("Limited email communication data available. ");
    }

    summary.push_str(&format!(
        "The deal has been in the current stage for {}. ",
        progress.time_in_stage
    ));

    if activity.total_logs > 0 {
        summary.push_str(&format!(
            "Recent AI activity shows {} with {} key actions. ",
            activity.recent_activity,
            activity.key_insights.len()
        ));
    }

    if !roadblocks.is_empty() {
        summary.push_str(&format!(
            "Key roadblocks identified: {}. ",
            roadblocks.join(", ")
        ));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngagementLevel;

    fn no_email_data() -> EmailAnalysis {
        EmailAnalysis {
            total_emails: 0,
            response_time: "No email data available".to_string(),
            engagement_level: EngagementLevel::Unknown,
        }
    }

    fn no_activity() -> AiLogsAnalysis {
        AiLogsAnalysis {
            total_logs: 0,
            recent_activity: "No recent AI activity".to_string(),
            key_insights: Vec::new(),
        }
    }

    fn progress(stage: &str, time_in_stage: &str) -> DealProgress {
        DealProgress {
            stage: stage.to_string(),
            time_in_stage: time_in_stage.to_string(),
            stage_advancement: "Initial stage".to_string(),
        }
    }

    #[test]
    fn test_bare_deal_narrative() {
        let roadblocks = vec![
            "No recent email communication with customer".to_string(),
            "Missing expected close date".to_string(),
            "Missing timeline information".to_string(),
        ];
        let summary = compose_summary(
            "Acme Renewal",
            &no_email_data(),
            &no_activity(),
            &progress("negotiation", "Unknown"),
            &roadblocks,
        );

        assert!(summary.starts_with(
            "Deal \"Acme Renewal\" is currently in the negotiation stage. \
             Limited email communication data available. \
             The deal has been in the current stage for Unknown. "
        ));
        assert!(summary.contains(
            "Key roadblocks identified: No recent email communication with customer, \
             Missing expected close date, Missing timeline information. "
        ));
        // No activity clause when the log is empty.
        assert!(!summary.contains("Recent AI activity"));
    }

    #[test]
    fn test_full_narrative_clause_order() {
        let email = EmailAnalysis {
            total_emails: 12,
            response_time: "6.5 hours".to_string(),
            engagement_level: EngagementLevel::High,
        };
        let activity = AiLogsAnalysis {
            total_logs: 9,
            recent_activity: "Very recent (within 24 hours)".to_string(),
            key_insights: vec![
                "Follow-up email sent".to_string(),
                "Meeting scheduled".to_string(),
            ],
        };
        let roadblocks = vec!["Missing timeline information".to_string()];
        let summary = compose_summary(
            "Globex Expansion",
            &email,
            &activity,
            &progress("proposal", "2.5 days"),
            &roadblocks,
        );

        assert_eq!(
            summary,
            "Deal \"Globex Expansion\" is currently in the proposal stage. \
             Customer engagement is high with an average response time of 6.5 hours. \
             The deal has been in the current stage for 2.5 days. \
             Recent AI activity shows Very recent (within 24 hours) with 2 key actions. \
             Key roadblocks identified: Missing timeline information. "
        );
    }

    #[test]
    fn test_clean_deal_skips_roadblock_clause() {
        let email = EmailAnalysis {
            total_emails: 3,
            response_time: "0.0 hours".to_string(),
            engagement_level: EngagementLevel::Medium,
        };
        let summary = compose_summary(
            "Initech Pilot",
            &email,
            &no_activity(),
            &progress("discovery", "3.0 hours"),
            &[],
        );
        assert!(!summary.contains("Key roadblocks identified"));
        assert!(!summary.is_empty());
    }
}
