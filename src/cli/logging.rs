//! Logging setup: `tracing` to stderr, human-readable or JSON

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Default directives per `-v` count; `RUST_LOG` overrides them
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "info,delivery_dash=info",
        1 => "info,delivery_dash=debug",
        _ => "debug,delivery_dash=trace",
    }
}

pub fn init_logging(format: LogFormat, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_crate_level() {
        assert_eq!(default_directives(0), "info,delivery_dash=info");
        assert_eq!(default_directives(1), "info,delivery_dash=debug");
        assert_eq!(default_directives(5), "debug,delivery_dash=trace");
    }

    #[test]
    fn test_default_directives_parse() {
        for verbose in 0..3 {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }
}
