//! battlecon: command-line remote console for Frostbite game servers.
//!
//! Connects to a Battlefield 3/4/Hardline server, logs in, runs one command
//! and prints the reply.  With `--watch` it stays connected and prints the
//! events the server pushes until Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! battlecon [OPTIONS] [COMMAND]...
//!
//! Options:
//!   --config   <FILE>  TOML config file
//!   --host     <HOST>  Server hostname or IP
//!   --port     <PORT>  RCON port
//!   --password <PW>    RCON password
//!   --game     <NAME>  Game module: frostbite, bf3, bf4, bfh, none
//!   --no-events        Do not ask the server to push events
//!   --watch            Stream server events until Ctrl+C
//!   --json             Print replies and events as JSON lines
//!   --table            Print the reply as a column/row table
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable             | Description             |
//! |----------------------|-------------------------|
//! | `BATTLECON_CONFIG`   | Config file path        |
//! | `BATTLECON_HOST`     | Server hostname or IP   |
//! | `BATTLECON_PORT`     | RCON port               |
//! | `BATTLECON_PASSWORD` | RCON password           |
//! | `BATTLECON_GAME`     | Game module name        |
//!
//! Precedence, highest first: CLI flag, environment variable, config file,
//! built-in default.
//!
//! # Examples
//!
//! ```text
//! battlecon --host 203.0.113.10 --password secret serverInfo
//! battlecon --table admin.listPlayers all
//! battlecon --watch --json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use battlecon_client::{ClientConfig, Command, ConnectionEvent, RconClient};
use battlecon_core::tabulate;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote console for Frostbite (Battlefield) game servers.
#[derive(Debug, Parser)]
#[command(name = "battlecon", about = "Remote console for Frostbite game servers", version)]
struct Cli {
    /// TOML file with connection settings.  Flags override its values.
    #[arg(long, env = "BATTLECON_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname or IP address of the game server.
    #[arg(long, env = "BATTLECON_HOST")]
    host: Option<String>,

    /// RCON TCP port.
    #[arg(long, env = "BATTLECON_PORT")]
    port: Option<u16>,

    /// RCON password.
    #[arg(long, env = "BATTLECON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Game module (`frostbite`, `bf3`, `bf4`, `bfh`, or `none` for no login).
    #[arg(long, env = "BATTLECON_GAME")]
    game: Option<String>,

    /// Do not ask the server to push events after login.
    #[arg(long)]
    no_events: bool,

    /// Stay connected and print server events until Ctrl+C.
    #[arg(long)]
    watch: bool,

    /// Print replies and events as JSON lines.
    #[arg(long)]
    json: bool,

    /// Print the reply as a table (for list-style commands).
    #[arg(long)]
    table: bool,

    /// Index of the first reply word that belongs to the table.
    #[arg(long, default_value_t = 0, requires = "table")]
    table_offset: usize,

    /// The command to run, e.g. `serverInfo` or `admin.say hello all`.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

impl Cli {
    /// Layers the CLI flags over the config file (or the defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(game) = &self.game {
            config.game = Some(game.clone());
        }
        if self.no_events {
            config.events_enabled = false;
        }
        Ok(config)
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_reply(cli: &Cli, words: &[String]) -> anyhow::Result<()> {
    if cli.table {
        let table = tabulate(words, cli.table_offset).context("reply is not a table")?;
        if cli.json {
            let records: Vec<_> = table.records().collect();
            println!("{}", serde_json::to_string(&records)?);
        } else {
            println!("{}", table.columns.join("\t"));
            for row in &table.rows {
                println!("{}", row.join("\t"));
            }
        }
    } else if cli.json {
        println!("{}", serde_json::to_string(words)?);
    } else {
        println!("{}", words.join(" "));
    }
    Ok(())
}

/// One human-readable line per event worth showing in `--watch` mode.
fn describe(event: &ConnectionEvent) -> Option<String> {
    match event {
        ConnectionEvent::Connected { host, port } => Some(format!("* connected to {host}:{port}")),
        ConnectionEvent::Closed => Some("* connection closed".to_string()),
        ConnectionEvent::Error(e) => Some(format!("! {e}")),
        ConnectionEvent::ServerEvent(message) => Some(message.words.join(" ")),
        ConnectionEvent::LoggedIn => Some("* logged in".to_string()),
        ConnectionEvent::Ready => Some("* ready".to_string()),
        ConnectionEvent::Recovering(reason) => Some(format!("* recovering: {reason}")),
        ConnectionEvent::ReconnectScheduled { delay } => {
            Some(format!("* reconnecting in {:.1}s", delay.as_secs_f64()))
        }
        ConnectionEvent::Game(_) | ConnectionEvent::Message(_) | ConnectionEvent::Exec(_) => None,
    }
}

async fn watch(client: &RconClient, json: bool) -> anyhow::Result<()> {
    let mut events = client.subscribe();
    info!("watching {}; press Ctrl+C to stop", client.config().address());
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("received Ctrl+C; disconnecting");
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(event) if json => println!("{}", serde_json::to_string(&event)?),
                Ok(event) => {
                    if let Some(line) = describe(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("skipped {skipped} events"),
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.command.is_empty() && !cli.watch {
        bail!("nothing to do: give a command to run, or --watch");
    }

    let config = cli.client_config()?;
    let address = config.address();
    let client = RconClient::from_config(config)?;

    client
        .connect()
        .await
        .with_context(|| format!("could not connect to {address}"))?;

    if !cli.command.is_empty() {
        let command = Command::from(cli.command.clone());
        let words = client
            .exec(command.clone())
            .await
            .with_context(|| format!("'{command}' failed"))?;
        print_reply(&cli, &words)?;
    }

    if cli.watch {
        watch(&client, cli.json).await?;
    }

    client.disconnect().await?;
    client.shutdown();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
