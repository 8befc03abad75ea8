use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::{rngs::OsRng, RngCore};

use storefront_guard::config::{self, validation::MIN_SECRET_LEN, ConfigError};

/// Upper bound for `gen-secret --bytes`.
const MAX_SECRET_BYTES: usize = 1024;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Operator tooling for storefront-guard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a random hex secret suitable for session.secret
    GenSecret {
        /// Number of random bytes (the hex string is twice as long)
        #[arg(short, long, default_value_t = 32)]
        bytes: usize,
    },
    /// Load and validate a config file, then print the effective settings
    CheckConfig {
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenSecret { bytes } => match generate_secret(bytes) {
            Some(secret) => println!("{}", secret),
            None => {
                eprintln!(
                    "Error: --bytes must be between {} and {}",
                    min_secret_bytes(),
                    MAX_SECRET_BYTES
                );
                return ExitCode::FAILURE;
            }
        },
        Commands::CheckConfig { path } => {
            let _ = dotenvy::dotenv();
            match config::load_config(&path) {
                Ok(config) => {
                    println!("{} is valid\n", path.display());
                    println!("{:#?}", config);
                }
                Err(ConfigError::Validation(errors)) => {
                    eprintln!("{} is invalid:", path.display());
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                    return ExitCode::FAILURE;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

/// Hex doubles the length, so half the minimum already passes validation.
fn min_secret_bytes() -> usize {
    MIN_SECRET_LEN.div_ceil(2)
}

/// Hex-encoded random secret of `bytes` bytes, or `None` when out of range.
fn generate_secret(bytes: usize) -> Option<String> {
    if !(min_secret_bytes()..=MAX_SECRET_BYTES).contains(&bytes) {
        return None;
    }
    let mut secret = vec![0u8; bytes];
    OsRng.fill_bytes(&mut secret);
    Some(hex::encode(secret))
}
