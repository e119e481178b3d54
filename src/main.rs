use clap::Parser;
use std::env;
use std::path::PathBuf;
use tracing::info;

use filedesk_core::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "filedesk-core", version, about = "Sandboxed workspace file server")]
struct Cli {
    /// TOML config file (falls back to FILEDESK_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workspace root
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| env::var_os("FILEDESK_CONFIG").map(PathBuf::from));
    let mut config = AppConfig::load(config_path.as_deref())?;

    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    filedesk_core::util::init_logging(&config.log);

    info!(
        "Starting FileDesk Core v{} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.bind,
        config.port
    );

    filedesk_core::server::run_server(config).await
}
