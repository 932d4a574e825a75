//! Structured logging: a colorized `fern` dispatch with per-facility debug
//! gating in place of a single verbose flag.

use std::sync::OnceLock;

use colored::Colorize;

use crate::config::model::FacilitySet;
use crate::config::Facility;

static DEBUG_FACILITIES: OnceLock<FacilitySet> = OnceLock::new();

/// `true` if debug-level logging is enabled for `facility`, per
/// `general.print_debug_messages_from`.
#[must_use]
pub fn facility_enabled(facility: Facility) -> bool {
    DEBUG_FACILITIES
        .get()
        .is_some_and(|set| set.is_enabled(facility))
}

/// Logs at debug level only if `$facility` is enabled in
/// `print_debug_messages_from`, skipping the format step entirely
/// otherwise.
#[macro_export]
macro_rules! debug_for {
    ($facility:expr, $($arg:tt)*) => {
        if $crate::logging::facility_enabled($facility) {
            log::debug!($($arg)*);
        }
    };
}

/// Installs the global logger. `verbose` additionally prefixes each line
/// with the emitting module's top-level component.
pub fn enable_logger(verbose: bool, debug_facilities: FacilitySet) {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}: {}",
                format!(
                    "{}{}",
                    match record.level() {
                        log::Level::Error => "ERROR".red().bold().to_string(),
                        log::Level::Warn => "WARN ".yellow().bold().to_string(),
                        log::Level::Info => "INFO ".green().bold().to_string(),
                        log::Level::Debug => "DEBUG".bright_blue().bold().to_string(),
                        log::Level::Trace => "TRACE".bright_white().bold().to_string(),
                    },
                    match verbose {
                        true => format!(" [{}]", record.target().split("::").next().unwrap()),
                        false => String::new(),
                    }
                    .bright_black()
                ),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()
        .expect("logger must only be installed once");

    DEBUG_FACILITIES
        .set(debug_facilities)
        .expect("logger must only be installed once");
}
