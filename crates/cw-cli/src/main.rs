use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "cw")]
#[command(about = "Call-watch operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail when the config carries keys the service does not read
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Call record commands
    Calls {
        /// Layered config paths (defaults to CW_CONFIG)
        #[arg(long = "config", global = true)]
        config_paths: Vec<String>,

        #[command(subcommand)]
        cmd: CallsCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations
    Migrate,
}

#[derive(Subcommand)]
enum CallsCmd {
    /// Print one call record as JSON
    Show {
        /// Provider call id
        #[arg(long, conflicts_with = "internal_id", required_unless_present = "internal_id")]
        call_id: Option<String>,

        /// Store-assigned id
        #[arg(long)]
        internal_id: Option<Uuid>,
    },

    /// Submit one event, exactly as a provider webhook would
    Submit {
        #[arg(long)]
        call_id: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        /// Start timestamp (RFC 3339)
        #[arg(long)]
        started: Option<String>,

        /// End timestamp (RFC 3339)
        #[arg(long)]
        ended: Option<String>,
    },

    /// Print unfinished and stale counts as of now
    Unfinished,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::db_status().await?,
            DbCmd::Migrate => commands::db::db_migrate().await?,
        },

        Commands::ConfigHash { paths, strict } => commands::config_hash(&paths, strict)?,

        Commands::Calls { config_paths, cmd } => match cmd {
            CallsCmd::Show {
                call_id,
                internal_id,
            } => commands::calls::calls_show(&config_paths, call_id, internal_id).await?,
            CallsCmd::Submit {
                call_id,
                from,
                to,
                started,
                ended,
            } => {
                let raw = cw_reconcile::RawCallEvent {
                    call_id,
                    from,
                    to,
                    started,
                    ended,
                };
                commands::calls::calls_submit(&config_paths, raw).await?
            }
            CallsCmd::Unfinished => commands::calls::calls_unfinished(&config_paths).await?,
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
