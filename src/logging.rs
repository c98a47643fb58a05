//! Tracing subscriber setup used by the server.

use std::{env, sync::OnceLock};

use tracing_appender::{
    non_blocking,
    non_blocking::NonBlocking,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{fmt, time::ChronoLocal, writer::MakeWriterExt},
};

/// Guard to ensure buffered logs are flushed on shutdown.
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,valshop=debug"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let file_writer = env::var("LOG_DIR")
        .ok()
        .and_then(|dir| match init_file_writer(&dir) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("failed to open log directory {dir}: {e}");
                None
            }
        });

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_level(true);

    match (json, file_writer) {
        (true, Some(file)) => {
            let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
            builder.json().with_writer(stdout.and(file)).init();
        }
        (true, None) => builder.json().init(),
        (false, Some(file)) => {
            let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
            builder.with_ansi(false).with_writer(stdout.and(file)).init();
        }
        (false, None) => builder.with_ansi(true).init(),
    }

    tracing::info!("logger initialized");
}

fn init_file_writer(dir: &str) -> Result<NonBlocking, InitError> {
    let max_files = env::var("LOG_MAX_FILES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok());

    let mut file_builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("valshop.log");

    if let Some(n) = max_files {
        file_builder = file_builder.max_log_files(n);
    }

    let file_appender = file_builder.build(dir)?;

    let (file_writer, guard) = non_blocking(file_appender);

    // A second init keeps the first guard alive, which is all we need.
    let _ = LOG_GUARD.set(guard);

    Ok(file_writer)
}
