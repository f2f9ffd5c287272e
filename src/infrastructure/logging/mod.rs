// Logging module - tracing subscriber setup
use crate::domain::error::{DualComError, DualComResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a configured level name to a filter directive for this crate
pub fn level_directive(log_level: &str, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        match log_level.to_ascii_lowercase().as_str() {
            "error" => "error",
            "warn" => "warn",
            "debug" => "debug",
            "trace" => "trace",
            _ => "info",
        }
    };
    format!("dualcom={},warn", level)
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable. `RUST_LOG` overrides `log_level`.
pub fn init_logging(log_level: &str, verbose: bool) -> DualComResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level, verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .map_err(|e| DualComError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!("Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("warn", false), "dualcom=warn,warn");
        assert_eq!(level_directive("warn", true), "dualcom=debug,warn");
        assert_eq!(level_directive("bogus", false), "dualcom=info,warn");
    }

    #[test]
    fn test_second_init_reports_error() {
        let _ = init_logging("info", false);
        assert!(init_logging("info", false).is_err());
    }
}
