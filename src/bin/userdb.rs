//! UserDB Server Binary
//!
//! # Examples
//!
//! ```bash
//! # Start server with the demo user preloaded
//! userdb serve --bind 0.0.0.0 --port 8080 --seed
//!
//! # Create and fetch a user
//! curl -X POST localhost:8080/create -d '{"name":"ilya","passwd":"asdfgh","email":"a@b"}'
//! curl localhost:8080/get/1000
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use userdb::server::{start_server, ServerConfig};
use userdb::{NewUser, StoreConfig, UserStore};

/// UserDB - concurrent in-memory user record store
#[derive(Parser, Debug)]
#[command(name = "userdb")]
#[command(version = userdb::VERSION)]
#[command(about = "UserDB - concurrent in-memory user record store", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Log directory path; logs go to stdout only when unset
    #[arg(long, global = true, env = "USERDB_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the UserDB server
    Serve(ServeArgs),

    /// Show server version
    Version,
}

/// Server configuration arguments
#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(short, long, default_value = "127.0.0.1", env = "USERDB_BIND")]
    bind: String,

    /// HTTP port
    #[arg(short, long, default_value = "8080", env = "USERDB_PORT")]
    port: u16,

    /// Enable CORS
    #[arg(long)]
    cors: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Maximum request body size (KB)
    #[arg(long, default_value = "64")]
    max_body_size: usize,

    /// Record slots per slab block
    #[arg(long, default_value = "1024", env = "USERDB_BLOCK_CAPACITY")]
    block_capacity: usize,

    /// First UID handed out
    #[arg(long, default_value = "1000", env = "USERDB_BASE_UID")]
    base_uid: u64,

    /// Preload a demo user
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; the guard keeps the file writer flushing until exit
    let _guard = setup_logging(&cli)?;

    match cli.command {
        Commands::Serve(args) => serve_command(args).await,
        Commands::Version => {
            println!("UserDB {}", userdb::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with console output and an optional rolling file
fn setup_logging(cli: &Cli) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "userdb.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let (json_layer, text_layer) = if cli.log_json {
        (Some(fmt::layer().json().with_writer(std::io::stdout)), None)
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(!cli.no_color),
            ),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Serve command - start the UserDB server
async fn serve_command(args: ServeArgs) -> anyhow::Result<()> {
    info!(version = %userdb::VERSION, "UserDB starting");

    let store = Arc::new(UserStore::new(StoreConfig {
        block_capacity: args.block_capacity,
        base_uid: args.base_uid,
    })?);

    if args.seed {
        // Fictitious user for manual testing
        let uid = store.create(NewUser::new(
            "JoeSmith",
            "1234abcd",
            "jsmith@mmm.com",
            "2 Brodway",
        ))?;
        info!(uid, "Seeded demo user");
    }

    if args.cors {
        warn!("CORS enabled for all origins");
    }

    let server_config = ServerConfig {
        http_addr: args.bind,
        http_port: args.port,
        enable_cors: args.cors,
        timeout_secs: args.timeout,
        max_body_size: args.max_body_size * 1024,
    };

    start_server(server_config, store).await
}
