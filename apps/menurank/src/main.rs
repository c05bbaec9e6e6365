//! # MenuRank
//!
//! ```bash
//! # Offline, on files
//! menurank categories -f products_export.xml
//! menurank view -f products_export.xml -c 'SKLEP\Kurtki\Zimowe'
//! menurank reorder -f products_export.xml -c 'SKLEP\Kurtki\Zimowe' --order 5180,77,5235
//!
//! # Session server
//! menurank server --host 0.0.0.0 --port 8080 -f products_export.xml
//! ```

use clap::Parser;
use menurank::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // MENURANK_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("MENURANK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "menurank=info,menurank_core=info,tower_http=debug".into());

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
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  menurank v{}
  per-category display ranking
"#,
        env!("CARGO_PKG_VERSION")
    );
}
