//! Deal analysis orchestrator.
//!
//! Runs the fetch, analyze, assemble, persist pipeline for one deal: a
//! mandatory deal lookup, three best-effort activity fetches, the pure
//! analyzers, then a single write of the assembled summary back onto the
//! deal record. Requests for different deals (or reruns for the same deal)
//! are independent; the last persisted summary wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    analyze_action_logs, analyze_emails, analyze_stage_progress, assess_performance,
    classify_responsiveness, compose_summary, detect_roadblocks, score_likelihood,
    sort_most_recent_first,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{DealStore, StoreError};
use crate::types::AiSummary;

/// Identifies the deal to analyze. Both fields are required; blank values
/// are rejected the same as missing ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    pub tenant_id: Option<String>,
    pub deal_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(tenant_id: impl Into<String>, deal_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            deal_id: Some(deal_id.into()),
        }
    }

    fn validated(&self) -> Result<(&str, &str), EngineError> {
        let tenant_id = self
            .tenant_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(EngineError::MissingField("tenantId"))?;
        let deal_id = self
            .deal_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(EngineError::MissingField("dealId"))?;
        Ok((tenant_id, deal_id))
    }
}

/// Success payload returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub ai_summary: AiSummary,
}

/// Analyze one deal against the current wall clock and persist the result.
pub async fn analyze_deal(
    store: &dyn DealStore,
    request: &AnalyzeRequest,
    config: &EngineConfig,
) -> Result<AiSummary, EngineError> {
    analyze_deal_at(store, request, config, Utc::now()).await
}

/// Analyze one deal against an explicit instant. Every time-relative
/// computation derives from `now`, so a run is reproducible given the same
/// stored data.
pub async fn analyze_deal_at(
    store: &dyn DealStore,
    request: &AnalyzeRequest,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<AiSummary, EngineError> {
    let (tenant_id, deal_id) = request.validated()?;

    // The deal lookup gates the side fetches.
    let deal = store
        .get_deal(tenant_id, deal_id)
        .await?
        .ok_or_else(|| EngineError::DealNotFound(deal_id.to_string()))?;

    let (logs, emails, history) = tokio::join!(
        store.recent_action_logs(tenant_id, deal_id, config.max_action_logs),
        store.recent_emails(tenant_id, deal_id, config.max_emails),
        store.recent_stage_history(tenant_id, deal_id, config.max_stage_history),
    );
    let mut action_logs = collect_or_empty(logs, "action logs", deal_id);
    let mut emails = collect_or_empty(emails, "emails", deal_id);
    let mut stage_history = collect_or_empty(history, "stage history", deal_id);

    // Analyzers assume most-recent-first input; the store does not
    // guarantee order.
    sort_most_recent_first(&mut action_logs, |entry| entry.timestamp);
    sort_most_recent_first(&mut emails, |email| email.timestamp);
    sort_most_recent_first(&mut stage_history, |entry| entry.timestamp);

    let email_analysis = analyze_emails(&emails);
    let ai_logs_analysis = analyze_action_logs(&action_logs, now);
    let deal_progress = analyze_stage_progress(&deal.stage, &stage_history, now);
    let roadblocks = detect_roadblocks(&deal, &action_logs, &emails, now);

    let engagement = email_analysis.engagement_level;
    let summary = AiSummary {
        summary: compose_summary(
            &deal.name,
            &email_analysis,
            &ai_logs_analysis,
            &deal_progress,
            &roadblocks,
        ),
        roadblocks,
        customer_responsiveness: classify_responsiveness(engagement),
        likelihood_to_close: score_likelihood(&deal.stage, engagement, &action_logs, now),
        salesperson_performance: assess_performance(engagement, &action_logs, now),
        last_updated: now,
        email_analysis,
        ai_logs_analysis,
        deal_progress,
    };

    store.save_ai_summary(tenant_id, deal_id, &summary).await?;
    log::info!(
        "Generated summary for deal {deal_id} ({} roadblocks)",
        summary.roadblocks.len()
    );

    Ok(summary)
}

/// A failed side read degrades to an empty collection; only the deal lookup
/// is fatal.
fn collect_or_empty<T>(result: Result<Vec<T>, StoreError>, what: &str, deal_id: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Failed to load {what} for deal {deal_id}: {e}");
            Vec::new()
        }
    }
}
