//! `tracklink` command: listen for trackers or replay a capture, printing
//! every decoded record.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracklink::{DecodedPacket, FramingMode, OutputFormat, ServerConfig, TrackerError, Tracklink};

#[derive(Parser, Debug)]
#[command(name = "tracklink", version, about = "Decode GPS tracker telemetry packets")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Packet framing on the socket
    #[arg(long, value_enum)]
    framing: Option<FramingMode>,

    /// Trackers served at once
    #[arg(long, value_name = "N")]
    max_connections: Option<usize>,

    /// Output format for decoded records
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Replay a capture file (one packet per line) instead of listening
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

impl Cli {
    /// Configuration file (or defaults) with command line overrides applied.
    fn server_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(framing) = self.framing {
            config.framing = framing;
        }
        if let Some(max_connections) = self.max_connections {
            config.max_connections = max_connections;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Print a full record; short packets were already logged by the driver.
fn emit(packet: &DecodedPacket, format: OutputFormat) -> Result<()> {
    let Some(record) = packet.outcome.record() else {
        return Ok(());
    };
    let rendered = format.render(record)?;

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => writeln!(stdout, "{rendered}")?,
        OutputFormat::Yaml => write!(stdout, "---\n{rendered}")?,
    }
    stdout.flush()?;
    Ok(())
}

async fn listen(config: ServerConfig, format: OutputFormat) -> Result<()> {
    let mut server = Tracklink::listen(config).await?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Interrupted");
                server.shutdown();
                break;
            }
            packet = server.recv() => match packet {
                Some(packet) => emit(&packet, format)?,
                None => break,
            },
        }
    }
    Ok(())
}

async fn replay(path: PathBuf, config: ServerConfig, format: OutputFormat) -> Result<()> {
    let mut connection = Tracklink::replay(&path, &config).await?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Interrupted");
                connection.stop();
                break;
            }
            packet = connection.recv() => match packet {
                Some(packet) => emit(&packet, format)?,
                None => break,
            },
        }
    }

    let summary = connection.finish().await?;
    info!(
        path = %path.display(),
        packets = summary.packets,
        full = summary.full,
        header_only = summary.header_only,
        truncated = summary.truncated,
        "Replay finished"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.server_config()?;
    debug!(?config, "Resolved configuration");

    match cli.replay {
        Some(path) => replay(path, config, cli.format).await,
        None => listen(config, cli.format).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Some(error) = result.as_ref().err().and_then(|e| e.downcast_ref::<TrackerError>()) {
        for suggestion in error.recovery_suggestions() {
            eprintln!("  hint: {suggestion}");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "tracklink",
            "--bind",
            "127.0.0.1:9000",
            "--framing",
            "line",
            "--max-connections",
            "4",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let config = cli.server_config().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.framing, FramingMode::Line);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.queue_capacity, ServerConfig::default().queue_capacity);
    }

    #[test]
    fn zero_connections_rejected() {
        let cli = Cli::parse_from(["tracklink", "--max-connections", "0"]);
        assert!(cli.server_config().is_err());
    }

    #[test]
    fn config_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address: 127.0.0.1:7000\nqueue_capacity: 8").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["tracklink", "-c", path, "--format", "yaml"]);
        assert_eq!(cli.format, OutputFormat::Yaml);
        let config = cli.server_config().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:7000");
        assert_eq!(config.queue_capacity, 8);
    }
}
