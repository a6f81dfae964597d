pub mod commands;
pub mod error;
pub mod models;
pub mod services;

pub use commands::compile::{CompileOutcome, CompileRequest, CompiledStats, StatsCompiler};
pub use error::{PipelineError, GENERIC_FAILURE_MESSAGE};
pub use models::config::AppConfig;
pub use models::game::{GameTitle, Side, StatField};
pub use models::roster::{EntityRef, MatchContext};
pub use models::stat_record::{PlayerStatRecord, RecordIssue, StatLine};
pub use services::image_loader::ImageInput;
pub use services::ocr::{HttpOcrClient, OcrEngine};
pub use services::roster::{InMemoryRoster, RosterCache, RosterSource};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `debug` or
/// `info,scoreboard_stats::services::ocr=trace`
pub const LOG_LEVEL_ENV: &str = "SCOREBOARD_LOG";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber: human-readable or JSON lines on stderr
pub fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding)
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
