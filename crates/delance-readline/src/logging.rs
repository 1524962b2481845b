use anyhow::Result;
use delance_core::config::LoggingConfig;
use delance_infrastructure::DelancePaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Sends tracing output to a daily log file so it never interleaves with the prompt.
///
/// `RUST_LOG` takes precedence over the configured filter. The returned guard
/// flushes buffered lines when dropped and must live until exit.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let logs_dir = DelancePaths::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "delance.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
