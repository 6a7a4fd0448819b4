//! Logging setup for nav-sim.
//!
//! Logs go to stderr so stdout stays machine-readable. With `--log-dir`, a
//! daily rolling file is written as well.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "NAV_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "nav-sim.log";

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn env_filter() -> EnvFilter {
    let forced = debug_forced(std::env::var(DEBUG_ENV).ok().as_deref());
    if forced {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Hold the returned guard for the life of
/// the process, or buffered file output is lost.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr_layer)
            .try_init();
        return None;
    };

    if let Err(err) = fs_err::create_dir_all(dir) {
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr_layer)
            .try_init();
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr only");
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        dir,
        LOG_FILE_PREFIX,
    ));
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    Some(guard)
}

/// Default location for `--log-dir` when given without a value.
pub fn default_log_dir() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("healthchat").join("logs"))
}
