//! SQLite-backed document store for deals and their activity records.
//!
//! The database lives at `~/.dealsense/dealsense.db`. Deals get discrete
//! columns for the fields the engine queries on plus JSON columns for the
//! nested blocks; activity records are stored as whole JSON documents and
//! normalized on read, which keeps the store tolerant of the mixed shapes
//! older writers produced.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ActionLogEntry, AiSummary, Deal, EmailRecord, StageHistoryEntry};

pub mod sqlite;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read and write access the analysis engine needs, scoped per tenant.
///
/// The engine treats the store as an external collaborator: reads are
/// bounded, the summary write replaces whatever was there, and nothing else
/// on the deal is touched.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Fetch one deal by id within a tenant.
    async fn get_deal(&self, tenant_id: &str, deal_id: &str) -> Result<Option<Deal>, StoreError>;

    /// The newest action-log entries for the deal, up to `limit`. Order is
    /// not guaranteed; callers sort in memory.
    async fn recent_action_logs(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<ActionLogEntry>, StoreError>;

    /// The newest emails for the deal, up to `limit`. Order is not
    /// guaranteed; callers sort in memory.
    async fn recent_emails(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<EmailRecord>, StoreError>;

    /// The newest stage transitions for the deal, up to `limit`. Order is
    /// not guaranteed; callers sort in memory.
    async fn recent_stage_history(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<StageHistoryEntry>, StoreError>;

    /// Write the derived summary onto the deal. Touches exactly two fields:
    /// `aiSummary` and `aiSummaryLastUpdated`.
    async fn save_ai_summary(
        &self,
        tenant_id: &str,
        deal_id: &str,
        summary: &AiSummary,
    ) -> Result<(), StoreError>;
}

// =============================================================================
// Shared test utilities
// =============================================================================
