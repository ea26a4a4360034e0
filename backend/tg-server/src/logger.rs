use crate::error::{Result as ServerErrorResult, ServerError};

use std::fmt::Arguments;
use std::path::PathBuf;
use std::time::SystemTime;

use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{Record, info};

// Dependencies that are chatty at debug level
const QUIET_TARGETS: [&str; 3] = ["sqlx", "hyper", "tower_http"];

/// Initialize the global fern logger.
///
/// # Arguments
/// * `log_level` - Log level filter
/// * `log_file` - Also append to this file (plain format)
/// * `colored` - Colored stdout output
///
/// Noisy dependency targets get `LogLevel::dependency_filter`.
pub fn initialize(
    log_level: tg_config::LogLevel,
    log_file: Option<PathBuf>,
    colored: bool,
) -> ServerErrorResult<()> {
    let level_filter = log_level.filter();

    let mut base = Dispatch::new().level(level_filter);
    for target in QUIET_TARGETS {
        base = base.level_for(target, log_level.dependency_filter());
    }

    let stdout = if colored {
        let colors = ColoredLevelConfig::new()
            .trace(Color::Magenta)
            .debug(Color::Blue)
            .info(Color::Green)
            .warn(Color::Yellow)
            .error(Color::Red);

        Dispatch::new()
            .format(move |out, message, record| {
                write_line(out, colors.color(record.level()), message, record)
            })
            .chain(std::io::stdout())
    } else {
        // systemd, docker logs
        Dispatch::new()
            .format(|out, message, record| write_line(out, record.level(), message, record))
            .chain(std::io::stdout())
    };
    base = base.chain(stdout);

    if let Some(ref log_path) = log_file {
        let file = fern::log_file(log_path).map_err(|e| ServerError::Logger {
            message: format!("Failed to open log file {}: {}", log_path.display(), e),
        })?;

        base = base.chain(
            Dispatch::new()
                .format(|out, message, record| write_line(out, record.level(), message, record))
                .chain(file),
        );
    }

    base.apply().map_err(|e| ServerError::Logger {
        message: format!("Failed to initialize logger: {e}"),
    })?;

    match log_file {
        Some(ref path) => info!(
            "Logger initialized: level={}, stdout + {}",
            log_level,
            path.display()
        ),
        None => info!("Logger initialized: level={}, stdout", log_level),
    }

    // tracing bridge; a second init is a no-op
    tracing_log::LogTracer::init().ok();

    Ok(())
}

fn write_line(
    out: FormatCallback,
    level: impl std::fmt::Display,
    message: &Arguments,
    record: &Record,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = humantime::format_rfc3339(SystemTime::now()),
        level = level,
        message = message,
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
