//! dealsense command line entry point.
//!
//! Two subcommands: `seed` writes a small demo tenant into the local
//! database, `analyze` runs the signal engine for one deal and prints the
//! persisted summary as JSON. The database defaults to
//! `~/.dealsense/dealsense.db`; pass `--db PATH` to point elsewhere.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use dealsense::types::{
    ActionLogEntry, EmailDirection, EmailRecord, QualificationData, StageData, StageHistoryEntry,
};
use dealsense::{
    analyze_deal, AnalyzeRequest, AnalyzeResponse, Deal, DealStage, EngineConfig, EngineError,
    ErrorReport, SqliteStore,
};

const DEMO_TENANT: &str = "demo";

// =============================================================================
// Argument parsing
// =============================================================================

struct CliArgs {
    command: String,
    positional: Vec<String>,
    db_path: Option<PathBuf>,
}

impl CliArgs {
    fn parse(mut raw: impl Iterator<Item = String>) -> Option<Self> {
        let command = raw.next()?;
        let mut positional = Vec::new();
        let mut db_path = None;

        while let Some(arg) = raw.next() {
            if arg == "--db" {
                db_path = Some(PathBuf::from(raw.next()?));
            } else {
                positional.push(arg);
            }
        }

        Some(Self {
            command,
            positional,
            db_path,
        })
    }
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  dealsense seed [--db PATH]");
    eprintln!("  dealsense analyze <TENANT_ID> <DEAL_ID> [--db PATH]");
    std::process::exit(2);
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    env_logger::init();

    let Some(args) = CliArgs::parse(std::env::args().skip(1)) else {
        usage();
    };

    if let Err(e) = run(args).await {
        let report = ErrorReport::from(&e);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("{}", report.message),
        }
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), EngineError> {
    let store = match &args.db_path {
        Some(path) => SqliteStore::open_at(path.clone()),
        None => SqliteStore::open(),
    }?;

    match args.command.as_str() {
        "seed" => seed(&store),
        "analyze" => analyze(&store, &args.positional).await,
        _ => usage(),
    }
}

async fn analyze(store: &SqliteStore, positional: &[String]) -> Result<(), EngineError> {
    let request = AnalyzeRequest {
        tenant_id: positional.first().cloned(),
        deal_id: positional.get(1).cloned(),
    };
    let summary = analyze_deal(store, &request, &EngineConfig::default()).await?;
    let response = AnalyzeResponse { ai_summary: summary };

    println!(
        "{}",
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| format!("Error: {e}"))
    );
    Ok(())
}

// =============================================================================
// Demo data
// =============================================================================

fn seed(store: &SqliteStore) -> Result<(), EngineError> {
    let now = Utc::now();
    seed_acme(store, now)?;
    seed_globex(store, now)?;
    seed_initech(store)?;

    println!("Seeded tenant '{DEMO_TENANT}' with 3 deals:");
    println!("  deal-acme     Acme Renewal (negotiation)");
    println!("  deal-globex   Globex Expansion (qualification)");
    println!("  deal-initech  Initech Pilot (discovery)");
    println!();
    println!("Try: dealsense analyze {DEMO_TENANT} deal-acme");
    Ok(())
}

/// Healthy, active deal: balanced email traffic, fresh activity, complete
/// qualification data.
fn seed_acme(store: &SqliteStore, now: DateTime<Utc>) -> Result<(), EngineError> {
    store.upsert_deal(
        DEMO_TENANT,
        &deal(
            "deal-acme",
            "Acme Renewal",
            DealStage::Negotiation,
            Some(QualificationData {
                expected_close_date: Some("2026-09-30".to_string()),
                timeline: Some("Contract signature this quarter".to_string()),
                other: Default::default(),
            }),
        ),
    )?;

    for hours in [70, 46, 20] {
        store.insert_email(
            DEMO_TENANT,
            "deal-acme",
            &email(
                EmailDirection::Outbound,
                "Renewal pricing",
                now - Duration::hours(hours),
            ),
        )?;
    }
    for hours in [60, 30, 8] {
        store.insert_email(
            DEMO_TENANT,
            "deal-acme",
            &email(
                EmailDirection::Inbound,
                "Re: Renewal pricing",
                now - Duration::hours(hours),
            ),
        )?;
    }

    store.insert_action_log(
        DEMO_TENANT,
        "deal-acme",
        &log_entry("stage_advance", Some("negotiation"), now - Duration::days(2)),
    )?;
    for hours in [50, 26, 12] {
        store.insert_action_log(
            DEMO_TENANT,
            "deal-acme",
            &log_entry("email_sent", None, now - Duration::hours(hours)),
        )?;
    }
    store.insert_action_log(
        DEMO_TENANT,
        "deal-acme",
        &log_entry("meeting_scheduled", None, now - Duration::hours(6)),
    )?;

    for (stage, days) in [
        ("discovery", 30),
        ("qualification", 21),
        ("proposal", 10),
        ("negotiation", 2),
    ] {
        store.insert_stage_history(
            DEMO_TENANT,
            "deal-acme",
            &stage_entry(stage, now - Duration::days(days)),
        )?;
    }
    Ok(())
}

/// Stalled deal: quiet inbox, old stage activity, incomplete qualification
/// data. Exercises every roadblock rule except the close-date one.
fn seed_globex(store: &SqliteStore, now: DateTime<Utc>) -> Result<(), EngineError> {
    store.upsert_deal(
        DEMO_TENANT,
        &deal(
            "deal-globex",
            "Globex Expansion",
            DealStage::Qualification,
            Some(QualificationData {
                expected_close_date: Some("2026-11-15".to_string()),
                timeline: None,
                other: Default::default(),
            }),
        ),
    )?;

    for days in [10, 9] {
        store.insert_email(
            DEMO_TENANT,
            "deal-globex",
            &email(
                EmailDirection::Outbound,
                "Expansion scope",
                now - Duration::days(days),
            ),
        )?;
    }

    store.insert_action_log(
        DEMO_TENANT,
        "deal-globex",
        &log_entry("stage_advance", Some("qualification"), now - Duration::days(9)),
    )?;

    for (stage, days) in [("discovery", 16), ("qualification", 12)] {
        store.insert_stage_history(
            DEMO_TENANT,
            "deal-globex",
            &stage_entry(stage, now - Duration::days(days)),
        )?;
    }
    Ok(())
}

/// Brand-new deal with no recorded activity at all; the engine degrades to
/// its no-data texts.
fn seed_initech(store: &SqliteStore) -> Result<(), EngineError> {
    store.upsert_deal(
        DEMO_TENANT,
        &deal("deal-initech", "Initech Pilot", DealStage::Discovery, None),
    )?;
    Ok(())
}

fn deal(
    id: &str,
    name: &str,
    stage: DealStage,
    qualification: Option<QualificationData>,
) -> Deal {
    Deal {
        id: id.to_string(),
        name: name.to_string(),
        stage,
        stage_data: qualification.map(|q| StageData {
            qualification: Some(q),
            other: Default::default(),
        }),
        ai_summary: None,
        ai_summary_last_updated: None,
    }
}

fn email(direction: EmailDirection, subject: &str, at: DateTime<Utc>) -> EmailRecord {
    EmailRecord {
        id: Uuid::new_v4().to_string(),
        direction,
        subject: subject.to_string(),
        timestamp: Some(at),
    }
}

fn log_entry(action: &str, new_stage: Option<&str>, at: DateTime<Utc>) -> ActionLogEntry {
    ActionLogEntry {
        id: Uuid::new_v4().to_string(),
        action: action.to_string(),
        timestamp: Some(at),
        new_stage: new_stage.map(str::to_string),
    }
}

fn stage_entry(stage: &str, at: DateTime<Utc>) -> StageHistoryEntry {
    StageHistoryEntry {
        stage: stage.to_string(),
        timestamp: Some(at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(parts: &[&str]) -> impl Iterator<Item = String> {
        parts
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_analyze_with_db_flag() {
        let args = CliArgs::parse(strings(&[
            "analyze", "demo", "deal-acme", "--db", "/tmp/d.db",
        ]))
        .expect("parses");
        assert_eq!(args.command, "analyze");
        assert_eq!(args.positional, vec!["demo", "deal-acme"]);
        assert_eq!(args.db_path, Some(PathBuf::from("/tmp/d.db")));
    }

    #[test]
    fn test_parse_db_flag_before_positionals() {
        let args =
            CliArgs::parse(strings(&["analyze", "--db", "x.db", "demo", "deal-1"])).expect("parses");
        assert_eq!(args.positional, vec!["demo", "deal-1"]);
        assert_eq!(args.db_path, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn test_parse_rejects_empty_and_dangling_flag() {
        assert!(CliArgs::parse(strings(&[])).is_none());
        assert!(CliArgs::parse(strings(&["seed", "--db"])).is_none());
    }
}
