//! This module provides observability for the engine's decision-making.
//!
//! Inference, classification and downcasting are all best-effort: most of their
//! outcomes are "kept the input". The `log_metric!` macro makes those decisions
//! visible as structured key/value lines at `debug` level, and `init_logging`
//! wires the `log` facade to an `env_logger` backend once per process.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use crate::error::CastError;

/// Logs a structured key-value metric line at `debug` level.
///
/// # Example
/// ```
/// use dtypecast::log_metric;
/// let from = "object";
/// log_metric!("event"="downcast", "outcome"="kept", "from"=&from);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!($crate::__log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!("DTYPECAST_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend printing `[LEVEL] message` lines, optionally
/// appending to `log_file` instead of stderr. Only the first call has any effect.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), CastError> {
    let file = log_file
        .map(|path| OpenOptions::new().append(true).create(true).open(path))
        .transpose()?;

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
