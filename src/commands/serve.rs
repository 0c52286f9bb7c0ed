use crate::cli::{self, AppConfig};
use std::path::PathBuf;

pub async fn cmd_serve(
    mut config: AppConfig,
    profiles_path: PathBuf,
    port: Option<u16>,
    host: Option<String>,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    tracing::info!("Starting akm on port {}", config.server.port);
    println!("🚀 akm v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "📡 Starting server on {}",
        cli::format_bind_addr(&config.server.host, config.server.port)
    );
    println!("📁 Profiles: {}", profiles_path.display());
    println!();
    println!("Press Ctrl+C to stop");

    crate::server::start_server(config, profiles_path).await
}
