//! # Delivery-dash CLI
//!
//! Command-line interface for the delivery-dash library.
//! Serves the upload dashboard, or renders it for local files in one shot.

use clap::{Args, Parser, Subcommand};
use delivery_dash::server::{self, ServerConfig};
use std::time::Duration;
use tracing::error;

mod cli;

use cli::{init_logging, run_render, LogFormat, RenderArgs};

/// Command-line interface for delivery-dash
#[derive(Parser)]
#[command(name = "delivery-dash")]
#[command(about = "Interactive dashboard for pre-computed delivery routes")]
#[command(long_about = "Shows optimized delivery routes as a table, a map and a chart:
  delivery-dash serve                          # Dashboard on http://127.0.0.1:8501/
  delivery-dash serve --port 9000              # Custom port
  delivery-dash render --geocode stores.csv --routes routes.csv \\
    --distance distance.npy --duration duration.npy -o page.html

Logging:
  -v / -vv raise the log level, RUST_LOG overrides it entirely
  --log-format json                            # One JSON object per line")]
#[command(version = env!("DASH_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the upload dashboard in the browser
    Serve(ServeArgs),
    /// Render the dashboard for four local files to a standalone HTML page
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8501)]
    port: u16,

    /// Largest accepted request body, in MiB
    #[arg(long, default_value_t = 64)]
    max_upload_mb: usize,

    /// Minutes of inactivity after which a browser's uploads are dropped
    #[arg(long, default_value_t = 120)]
    session_ttl_mins: u64,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
            session_ttl: Duration::from_secs(args.session_ttl_mins.saturating_mul(60)),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose)?;

    if cli.verbose > 0 {
        eprintln!("🚚 Delivery-dash v{} starting...", env!("DASH_VERSION"));
    }

    match cli.command {
        Command::Serve(args) => server::serve(args.into()).await,
        Command::Render(args) => run_render(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["delivery-dash", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("Expected serve command");
        };
        let config = ServerConfig::from(args);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8501);
        assert_eq!(config.max_upload_bytes, 64 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(7200));
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_render_args() {
        let cli = Cli::try_parse_from([
            "delivery-dash",
            "render",
            "--geocode",
            "stores.csv",
            "--routes",
            "routes.csv",
            "--distance",
            "d.npy",
            "--duration",
            "t.npy",
            "--day",
            "friday",
            "--vehicle",
            "3",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Render(args) = cli.command else {
            panic!("Expected render command");
        };
        assert_eq!(args.day, delivery_dash::DeliveryDay::Friday);
        assert_eq!(args.vehicle, Some(3));
        assert_eq!(args.output.to_str(), Some("dashboard.html"));
    }

    #[test]
    fn test_render_requires_all_inputs() {
        assert!(Cli::try_parse_from(["delivery-dash", "render", "--geocode", "stores.csv"]).is_err());
    }
}
