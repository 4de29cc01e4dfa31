//! Domain records and the analysis result value objects.
//!
//! The records the engine consumes come out of a loosely validated document
//! store: fields are optional, inconsistently present, and timestamps arrive
//! in whatever shape the writing client used. Every record is reconstructed
//! here as an explicit struct with defaulting rules instead of an open-ended
//! dictionary, and deserialization is forward-compatible (`#[serde(default)]`
//! plus flattened carry-through for fields the engine does not read).
//!
//! Wire shapes are camelCase JSON throughout.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Flexible timestamps
// =============================================================================

/// Serde adapter for instants that arrive as RFC 3339 strings, epoch
/// milliseconds, epoch seconds, or `{seconds, nanoseconds}` maps.
///
/// Reads normalize every shape to `Option<DateTime<Utc>>`; anything
/// unparseable reads as absent. Writes always emit RFC 3339.
pub mod flex_time {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(from_value))
    }

    /// Normalize a raw JSON value to an instant, if it holds one.
    pub fn from_value(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    // Epoch-millisecond values are 13 digits, epoch-second values 10.
                    if int.abs() >= 100_000_000_000 {
                        Utc.timestamp_millis_opt(int).single()
                    } else {
                        Utc.timestamp_opt(int, 0).single()
                    }
                } else {
                    n.as_f64()
                        .and_then(|secs| Utc.timestamp_millis_opt((secs * 1000.0) as i64).single())
                }
            }
            Value::Object(map) => {
                let seconds = map.get("seconds").and_then(Value::as_i64)?;
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("nanos"))
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                Utc.timestamp_opt(seconds, nanos as u32).single()
            }
            _ => None,
        }
    }
}

// =============================================================================
// Pipeline stages
// =============================================================================

/// Pipeline stage of a deal.
///
/// The six core stages are closed; deployments extend the pipeline with
/// custom stages, carried through as `Other`. Serializes as the snake_case
/// wire string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DealStage {
    Discovery,
    Qualification,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
    Other(String),
}

impl DealStage {
    /// Wire string for storage and display.
    pub fn as_str(&self) -> &str {
        match self {
            DealStage::Discovery => "discovery",
            DealStage::Qualification => "qualification",
            DealStage::Proposal => "proposal",
            DealStage::Negotiation => "negotiation",
            DealStage::ClosedWon => "closed_won",
            DealStage::ClosedLost => "closed_lost",
            DealStage::Other(s) => s,
        }
    }

    /// Parse from a wire string. Unrecognized stages become `Other`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "discovery" => DealStage::Discovery,
            "qualification" => DealStage::Qualification,
            "proposal" => DealStage::Proposal,
            "negotiation" => DealStage::Negotiation,
            "closed_won" => DealStage::ClosedWon,
            "closed_lost" => DealStage::ClosedLost,
            other => DealStage::Other(other.to_string()),
        }
    }
}

impl Default for DealStage {
    /// Records written before the stage field became mandatory read as
    /// discovery, the entry stage.
    fn default() -> Self {
        DealStage::Discovery
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DealStage {
    fn from(s: String) -> Self {
        DealStage::from_str_lossy(&s)
    }
}

impl From<DealStage> for String {
    fn from(stage: DealStage) -> Self {
        stage.as_str().to_string()
    }
}

// =============================================================================
// Input records
// =============================================================================

/// A sales opportunity as the engine sees it.
///
/// The CRM document carries far more than this; the engine reads `name`,
/// `stage`, and the qualification block of `stageData`, and writes back
/// `aiSummary` + `aiSummaryLastUpdated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stage: DealStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_data: Option<StageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<AiSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary_last_updated: Option<DateTime<Utc>>,
}

/// Stage-scoped fields nested on the deal document, keyed by stage name.
///
/// Only the qualification block feeds the engine; blocks for other stages
/// are carried through opaquely so a round-trip never drops them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<QualificationData>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Seller-entered qualification fields. Both are free text; empty counts as
/// missing for roadblock purposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// One automated-assistant action recorded against a deal.
///
/// `action` is a free-text tag; analyzers match on substrings like
/// `stage_advance` or `email_sent` rather than a closed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, with = "flex_time")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_stage: Option<String>,
}

/// Which side of the conversation an email belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailDirection {
    Inbound,
    Outbound,
    /// Anything else the writing client recorded. Such mail counts toward
    /// the total but joins neither side of the thread analysis.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One email associated with a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub direction: EmailDirection,
    #[serde(default)]
    pub subject: String,
    #[serde(default, with = "flex_time")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One recorded stage transition, scoped to a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    #[serde(default)]
    pub stage: String,
    #[serde(default, with = "flex_time")]
    pub timestamp: Option<DateTime<Utc>>,
}

// =============================================================================
// Analysis result
// =============================================================================

/// Tri-state rating shared by the responsiveness and likelihood signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    High,
    Medium,
    Low,
}

/// Salesperson performance grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceGrade {
    Excellent,
    Good,
    NeedsImprovement,
}

/// Inbound-vs-outbound email balance.
///
/// `Unknown` is reserved for the no-email-data case and keeps its
/// capitalized wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl EngagementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::High => "high",
            EngagementLevel::Medium => "medium",
            EngagementLevel::Low => "low",
            EngagementLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email responsiveness breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAnalysis {
    pub total_emails: usize,
    /// Average reply latency, pre-formatted (`"5.2 hours"` / `"1.3 days"`),
    /// or a placeholder when no email data exists.
    pub response_time: String,
    pub engagement_level: EngagementLevel,
}

/// Automated-action-log breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiLogsAnalysis {
    pub total_logs: usize,
    /// One of five fixed recency phrases.
    pub recent_activity: String,
    /// At most five templated insight phrases, in scan order.
    pub key_insights: Vec<String>,
}

/// Stage dwell and progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealProgress {
    pub stage: String,
    /// Elapsed time in the current stage, pre-formatted, or `"Unknown"`.
    pub time_in_stage: String,
    /// `"Progressive"` once the deal has moved at least once, else
    /// `"Initial stage"`.
    pub stage_advancement: String,
}

/// The engine's sole output: one fully assembled intelligence snapshot.
///
/// Constructed fresh on every invocation, never partially mutated, and
/// persisted once as a whole, replacing any prior value on the deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    /// Narrative paragraph; non-empty whenever the engine completes.
    pub summary: String,
    /// Detected obstacles in detection order, not severity order.
    pub roadblocks: Vec<String>,
    pub customer_responsiveness: Rating,
    pub likelihood_to_close: Rating,
    pub salesperson_performance: PerformanceGrade,
    /// When the engine ran.
    pub last_updated: DateTime<Utc>,
    pub email_analysis: EmailAnalysis,
    pub ai_logs_analysis: AiLogsAnalysis,
    pub deal_progress: DealProgress,
}

// =============================================================================
// Tests
// =============================================================================
