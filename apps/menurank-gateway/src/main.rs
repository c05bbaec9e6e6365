//! # MenuRank Gateway
//!
//! ```bash
//! MENURANK_GATEWAY_UPSTREAM=https://shop.example/api/admin/v5 menurank-gateway --port 3001
//! MENURANK_GATEWAY_DRY_RUN=true menurank-gateway
//! ```

use clap::Parser;
use menurank_core::MenuRankError;
use menurank_gateway::{GatewayConfig, GatewayState, run_server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Allowlisting proxy for menurank priority updates
#[derive(Parser, Debug)]
#[command(name = "menurank-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Log batches instead of forwarding them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let log_format = std::env::var("MENURANK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "menurank_gateway=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), MenuRankError> {
    let config = GatewayConfig::from_lookup(|key| {
        if args.dry_run && key == "MENURANK_GATEWAY_DRY_RUN" {
            Some("true".to_string())
        } else {
            std::env::var(key).ok()
        }
    })?;

    if config.dry_run {
        tracing::warn!("Dry run: batches are logged, never forwarded");
    }
    let state = GatewayState::from_config(&config)?;
    run_server(&format!("{}:{}", args.host, args.port), state).await
}
