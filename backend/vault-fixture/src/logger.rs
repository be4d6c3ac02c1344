//! Logging setup for test binaries that use the fixture.
//!
//! The fixture itself only logs through the `log` facade. Test suites call
//! [`initialize`] once from their setup to see that output on stderr.

use crate::error::FixtureError;

use common::ErrorLocation;

use std::env;
use std::io::stderr;
use std::panic::Location;
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const ENV_LOG_LEVEL: &str = "VAULT_FIXTURE_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install a coloured stderr logger.
///
/// Safe to call from every test: only the first call does anything. The
/// level comes from `VAULT_FIXTURE_LOG` (`trace`, `debug`, ...) when set.
///
/// # Errors
///
/// Returns [`FixtureError::Logger`] if another global logger is already
/// installed.
pub fn initialize() -> Result<(), FixtureError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let level = level_from(env::var(ENV_LOG_LEVEL).ok().as_deref());
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// Parse a level name, falling back to the build default.
pub(crate) fn level_from(raw: Option<&str>) -> LevelFilter {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => LevelFilter::from_str(raw).unwrap_or_else(|_| {
            warn!("Ignoring unknown log level '{raw}'");
            DEFAULT_LOG_LEVEL
        }),
        None => DEFAULT_LOG_LEVEL,
    }
}

#[track_caller]
fn initialize_internal(level: LevelFilter) -> Result<(), FixtureError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    Dispatch::new()
        .level(level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = colors.color(record.level()),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stderr())
        .apply()
        .map_err(|e| FixtureError::Logger {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
