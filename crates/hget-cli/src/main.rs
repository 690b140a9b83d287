use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hget_core::{Client, ClientConfig, FetchError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for transport, URL, protocol and config failures.
const EXIT_FAILURE: u8 = 1;
/// Exit status when the server answered with a non-200 status.
const EXIT_NO_SUCCESS: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "hget",
    about = "Fetch a URL over HTTP/1.1 and write the body to stdout",
    version
)]
struct Cli {
    /// URL to fetch, e.g. http://www.example.com/index.html
    url: String,
    /// Client configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log more to stderr (-v info, -vv debug). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("hget: invalid log filter: {e:#}");
        return ExitCode::from(EXIT_FAILURE);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hget: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    // stdout carries the body, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(verbose, rust_log.as_deref())?)
        .init();
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level for hget's crates.
fn log_filter(verbose: u8, rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return Ok(EnvFilter::try_new(directives)?);
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Ok(EnvFilter::try_new(format!("hget={level},hget_core={level}"))?)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let settings = config.transport_settings()?;
    debug!(?settings, "transport settings");

    let body = Client::new(settings).fetch_body(&cli.url)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body).context("writing body to stdout")?;
    stdout.flush().context("flushing stdout")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::from_file(path),
        None => Ok(ClientConfig::default()),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<FetchError>() {
        Some(e) if e.is_no_success() => EXIT_NO_SUCCESS,
        _ => EXIT_FAILURE,
    }
}
