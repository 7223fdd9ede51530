use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "eventory-backend")]
#[command(about = "Eventory deadline tracker: chat ingestion and deadline API", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("EVENTORY_CONFIG", config);
    }

    let config = backend_bootstrap::load_config().await?;
    let _log_guard = backend_bootstrap::init_logging(config.log_dir.as_deref());
    info!(
        "eventory-backend starting (storage={}, bind={})",
        config.storage_backend, config.bind_addr
    );

    backend_bootstrap::run_standalone(config).await
}
