use akm::{cli, commands, storage::ProfileStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "akm")]
#[command(about = "akm - API key profiles and credential validation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path or URL to configuration file (defaults to ~/.akm/config.toml)
    /// Also settable via AKM_CONFIG env var
    #[arg(short, long, global = true, env = "AKM_CONFIG")]
    config: Option<String>,

    /// Path to the profiles file (overrides storage.profiles_path)
    #[arg(long, global = true, env = "AKM_PROFILES")]
    profiles: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AKM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Use JSON-formatted logs
    #[arg(long, global = true, env = "AKM_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all profiles
    List {
        /// Print key values instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },
    /// Show one profile
    Get {
        name: String,
        /// Print key values instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },
    /// Create a profile
    Add {
        name: String,
        #[command(flatten)]
        fields: commands::ProfileFields,
    },
    /// Update a profile (only the given fields change; --keys replaces all keys)
    Update {
        name: String,
        #[command(flatten)]
        fields: commands::ProfileFields,
    },
    /// Delete a profile
    Delete { name: String },
    /// Check a profile's key against its API with real calls
    Test {
        name: String,
        /// Key to test (defaults to apiKey, then the first key)
        #[arg(long)]
        key: Option<String>,
    },
    /// Send a chat message through a profile
    Send {
        name: String,
        #[arg(short, long)]
        model: String,
        #[arg(long)]
        message: String,
        /// Key to use (defaults to apiKey, then the first key)
        #[arg(long)]
        key: Option<String>,
    },
    /// Start the web API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "AKM_PORT")]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long, env = "AKM_HOST")]
        host: Option<String>,
    },
    /// Run offline diagnostic checks
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        commands::cmd_completions::<Cli>(shell);
        return Ok(());
    }

    // Resolve config source: --config / AKM_CONFIG (path or URL) or default
    let config_source = cli::ConfigSource::parse(cli.config.as_deref());
    let config = cli::AppConfig::from_source(&config_source).await?;

    // Initialize tracing: RUST_LOG env var takes precedence, then CLI flag, then config
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = cli.log_level.as_deref().unwrap_or(&config.server.log_level);
        EnvFilter::new(level)
    });
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let profiles_path = cli
        .profiles
        .unwrap_or_else(|| config.storage.resolved_profiles_path());
    let store = Arc::new(ProfileStore::new(profiles_path.clone()));

    match cli.command {
        Commands::List { show_secrets } => commands::cmd_list(&store, show_secrets)?,
        Commands::Get { name, show_secrets } => commands::cmd_get(&store, &name, show_secrets)?,
        Commands::Add { name, fields } => commands::cmd_add(&store, &name, fields)?,
        Commands::Update { name, fields } => commands::cmd_update(&store, &name, fields)?,
        Commands::Delete { name } => commands::cmd_delete(&store, &name)?,
        Commands::Test { name, key } => {
            if !commands::cmd_test(&config, store, &name, key.as_deref()).await? {
                std::process::exit(1);
            }
        }
        Commands::Send {
            name,
            model,
            message,
            key,
        } => {
            if !commands::cmd_send(&config, store, &name, key.as_deref(), &model, &message).await? {
                std::process::exit(1);
            }
        }
        Commands::Serve { port, host } => {
            commands::cmd_serve(config, profiles_path, port, host).await?
        }
        Commands::Doctor => {
            if commands::cmd_doctor(&config, &config_source, &store) > 0 {
                std::process::exit(1);
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
