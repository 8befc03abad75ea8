//! storefront-guard
//!
//! A storefront served behind a session / CSRF / security-header pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ ┌──────────────────────────────┐
//!                                            │        guard pipeline        │
//!                                            │  session store  (resolve,    │
//!                                            │                  touch)      │
//!                                            │  CSRF manager   (mutating    │
//!                                            │                  methods)     │
//!                                            └──────────────┬───────────────┘
//!                                                 403 / 503 │ dispatch
//!                                                           ▼
//!                                                  storefront handlers
//!     Client Response                                       │
//!     ◀───────────── security headers + session cookie ◀────┘
//! ```
//!
//! Configuration comes from the TOML file given with `--config`, or from
//! defaults plus the environment when no file is given.

use std::path::PathBuf;

use clap::Parser;

use storefront_guard::config::{self, GuardConfig};
use storefront_guard::lifecycle::startup;
use storefront_guard::observability::init_logging;

#[derive(Parser)]
#[command(name = "storefront-guard", version, about = "Storefront behind a session and CSRF guard")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config: GuardConfig = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "storefront-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        secure_cookies = config.session.secure_cookies,
        sliding_renewal = config.session.sliding_renewal,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
