//! Engine tunables.

use serde::{Deserialize, Serialize};

/// Caps on how much history one analysis run reads.
///
/// Defaults match the product behavior; overriding them is mostly useful in
/// tests and backfills.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Newest automated-action log entries fetched per run.
    pub max_action_logs: usize,
    /// Newest emails fetched per run.
    pub max_emails: usize,
    /// Newest stage transitions fetched per run.
    pub max_stage_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_action_logs: 50,
            max_emails: 100,
            max_stage_history: 10,
        }
    }
}
