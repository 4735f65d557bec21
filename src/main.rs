mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pf_core::config::Config;

/// Load the config file (or defaults) and layer environment overrides on top.
fn load_config(path: Option<&std::path::Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = load_config(config_path);

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting portalfs");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    pf_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "portalfs=trace,pf_server=trace,pf_store=debug,pf_core=debug,tower_http=debug"
                .to_string()
        } else {
            "portalfs=info,pf_server=info,pf_store=info,pf_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("portalfs {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::HashPassword { password } => hash_password(&password),
        Commands::GenerateApiKey => {
            println!("{}", generate_api_key());
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let mut config = Config::load(p)
                .with_context(|| format!("failed to load config from {}", p.display()))?;
            config.apply_overrides(|key| std::env::var(key).ok());
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            load_config(None)
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Storage backend: {:?}", config.storage.backend);
    println!("  Bucket: {}", config.storage.bucket);
    println!("  Root prefix: {}", config.key_paths().root());
    println!("  Auth enabled: {}", config.auth.enabled);
    println!("  Upload limit: {} bytes", config.upload.max_bytes);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}

fn hash_password(password: &str) -> Result<()> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    println!("{}", hash);
    Ok(())
}

/// 32 random bytes, URL-safe base64 without padding.
fn generate_api_key() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::Rng;

    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
