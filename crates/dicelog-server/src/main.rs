use anyhow::{Context, Result};
use clap::Parser;
use dicelog_config::RuntimeConfig;
use std::path::PathBuf;

/// Log sharing backend storing uploads under key+password pairs
#[derive(Parser)]
#[command(name = "dicelog")]
#[command(version)]
#[command(about = "Log sharing backend storing uploads under key+password pairs", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Directory for local record files (filesystem backend only)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Frontend base URL used for retrieval links and CORS
    #[arg(short, long, value_name = "URL")]
    frontend_url: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run async server
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli)?;

    // Step 3: Run server; validation happens against the resolved config
    dicelog_server::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    use dicelog_config::{ServerConfig, StorageBackend};

    // Override port
    if let Some(port) = cli.port {
        let server = config.server.get_or_insert_with(ServerConfig::default);
        server.listen_addr = format!("0.0.0.0:{}", port);
    }

    // Override record directory (only valid for fs backend)
    if let Some(data_dir) = &cli.data_dir {
        if config.storage.backend != StorageBackend::Fs {
            anyhow::bail!(
                "--data-dir flag only works with the filesystem backend, but backend is '{}'.\n\
                Either remove the --data-dir flag or set backend to 'fs' in the config file.",
                config.storage.backend
            );
        }

        let fs_config = config.storage.fs.get_or_insert_with(Default::default);
        fs_config.path = data_dir.to_string_lossy().to_string();
    }

    // Override frontend base URL
    if let Some(url) = &cli.frontend_url {
        config.frontend_url = Some(url.clone());
    }

    // Override log level
    if let Some(level) = &cli.log_level {
        let server = config.server.get_or_insert_with(ServerConfig::default);
        server.log_level = level.clone();
    }

    Ok(())
}
