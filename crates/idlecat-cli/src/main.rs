use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use idlecat_core::config::{
    DEFAULT_ACTIVE_TO_IDLE_THRESHOLD_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_IDLE_TO_ACTIVE_THRESHOLD_SECS,
};
use idlecat_core::{raw_stdout, ActionSet, Monitor, MonitorConfig, ShellRunner, StdinSource, SystemClock};
use tracing::info;
use tracing_subscriber::EnvFilter;


#[derive(Debug, Parser)]
#[command(name = "idlecat")]
#[command(about = "Copy stdin to stdout, running commands when the stream turns idle or active")]
struct Cli {
    /// Set idle timeout
    #[arg(
        short = 't',
        long = "idle-timeout",
        value_name = "SECONDS",
        default_value_t = DEFAULT_IDLE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    idle_timeout: u64,

    /// Set idle to active threshold
    #[arg(
        short = 'i',
        long = "idle-to-active",
        value_name = "SECONDS",
        default_value_t = DEFAULT_IDLE_TO_ACTIVE_THRESHOLD_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    idle_to_active_threshold: u64,

    /// Set active to idle threshold
    #[arg(
        short = 'a',
        long = "active-to-idle",
        value_name = "SECONDS",
        default_value_t = DEFAULT_ACTIVE_TO_IDLE_THRESHOLD_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    active_to_idle_threshold: u64,

    /// Command to run on transition from idle to active
    #[arg(short = 'I', long = "on-active", value_name = "COMMAND")]
    on_active: Option<String>,

    /// Command to run on transition from active to idle
    #[arg(short = 'A', long = "on-idle", value_name = "COMMAND")]
    on_idle: Option<String>,

    /// Command to run on EOF
    #[arg(short = 'E', long = "on-eof", value_name = "COMMAND")]
    on_eof: Option<String>,

    /// Print a JSON run summary to stderr after EOF
    #[arg(long)]
    summary: bool,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        MonitorConfig {
            idle_timeout: Duration::from_secs(self.idle_timeout),
            idle_to_active_threshold: Duration::from_secs(self.idle_to_active_threshold),
            active_to_idle_threshold: Duration::from_secs(self.active_to_idle_threshold),
            actions: ActionSet {
                idle_to_active: self.on_active,
                active_to_idle: self.on_idle,
                eof: self.on_eof,
            },
            ..MonitorConfig::default()
        }
    }
}

/// Usage and parse errors, `-h` included, go to stderr with a failure status.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprint!("{}", err.render());
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout carries the forwarded stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = parse_cli();
    let print_summary = cli.summary;
    let config = cli.into_config();
    config.validate()?;

    let source = StdinSource::new().context("failed to prepare standard input")?;
    let mut output = raw_stdout().context("failed to prepare standard output")?;

    info!(
        idle_timeout_s = config.idle_timeout.as_secs(),
        idle_to_active_s = config.idle_to_active_threshold.as_secs(),
        active_to_idle_s = config.active_to_idle_threshold.as_secs(),
        "monitoring stdin"
    );

    let mut monitor = Monitor::new(source, ShellRunner::default(), SystemClock, config)?;
    let summary = monitor.run(&mut output).await?;

    if print_summary {
        eprintln!("{}", serde_json::to_string(&summary)?);
    }

    Ok(())
}
