//! Rule-based signal analysis for CRM deals.
//!
//! Given a deal and its recorded activity (emails, automated action logs,
//! stage history), the engine derives a structured [`AiSummary`]: engagement
//! and responsiveness ratings, a likelihood-to-close estimate, a salesperson
//! performance grade, detected roadblocks, and a short narrative. The summary
//! is persisted back onto the deal record, so the newest analysis is always
//! one read away.
//!
//! Entry point is [`analyze_deal`] (or [`analyze_deal_at`] for an explicit
//! clock); storage is abstracted behind [`DealStore`], with [`SqliteStore`]
//! as the shipped implementation.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use engine::{analyze_deal, analyze_deal_at, AnalyzeRequest, AnalyzeResponse};
pub use error::{EngineError, ErrorKind, ErrorReport};
pub use store::{DealStore, SqliteStore, StoreError};
pub use types::{AiSummary, Deal, DealStage};
