//! Command-line entry point for the tutoring core.
//!
//! # Responsibility
//! - Provide a minimal probe that verifies `tutoring_core` linkage.
//! - Run the session generation job once against a configured database.

use chrono::{NaiveDate, Utc};
use std::process::ExitCode;
use tutoring_core::repo::session_repo::SqliteSessionRepository;
use tutoring_core::{init_logging, open_db, AppConfig, ScheduleService};

const USAGE: &str = "usage:
  tutoring_cli version
  tutoring_cli generate-sessions <config.toml> [YYYY-MM-DD]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["version"] => {
            println!("tutoring_core version={}", tutoring_core::core_version());
            Ok(())
        }
        ["generate-sessions", config_path] => generate_sessions(config_path, None),
        ["generate-sessions", config_path, from] => generate_sessions(config_path, Some(*from)),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn generate_sessions(config_path: &str, from: Option<&str>) -> Result<(), String> {
    let config = AppConfig::from_file(config_path).map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let from = match from {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|err| format!("invalid start date `{text}`: {err}"))?,
        None => Utc::now().date_naive(),
    };

    let mut conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    let repo = SqliteSessionRepository::try_new(&mut conn).map_err(|err| err.to_string())?;
    let created = ScheduleService::new(repo)
        .generate_sessions(from, config.schedule_window_days)
        .map_err(|err| err.to_string())?;

    log::info!("event=cli_generate module=cli status=ok created={created}");
    println!(
        "created {created} session(s) from {from} over {} day(s)",
        config.schedule_window_days
    );
    Ok(())
}
