//! Marketplace CLI - Inspect and edit a file-backed cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! cart-cli show
//!
//! # Add a product (or one more unit of it)
//! cart-cli add --id p1 --title "Shirt" --image-url https://cdn.example.com/shirt.png --price 10
//!
//! # Change quantities
//! cart-cli increment p1
//! cart-cli decrement p1
//!
//! # Forget the persisted cart
//! cart-cli clear
//! ```
//!
//! Storage location and key come from `CART_STORAGE_DIR` and
//! `CART_STORAGE_KEY` (see `marketplace_cart::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marketplace_cart::CartConfig;
use marketplace_core::{Price, ProductId, ProductInput};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Go Marketplace cart tools")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the persisted cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(short, long)]
        id: String,

        /// Display name
        #[arg(short, long)]
        title: String,

        /// Image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price (non-negative decimal)
        #[arg(short, long)]
        price: Price,
    },
    /// Raise a product's quantity by one
    Increment {
        /// Product ID
        id: String,
    },
    /// Lower a product's quantity by one, removing it at zero
    Decrement {
        /// Product ID
        id: String,
    },
    /// Delete the persisted cart
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_cart=info,marketplace_cli=info".into());

    // Logs go to stderr so stdout carries only the rendered cart
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;

    let output = match cli.command {
        Commands::Show => commands::cart::show(config).await?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => {
            let product = ProductInput {
                id: ProductId::new(id),
                title,
                image_url,
                price,
            };
            commands::cart::add(config, product).await?
        }
        Commands::Increment { id } => {
            commands::cart::increment(config, ProductId::new(id)).await?
        }
        Commands::Decrement { id } => {
            commands::cart::decrement(config, ProductId::new(id)).await?
        }
        Commands::Clear => commands::cart::clear(config).await?,
    };

    emit(&output);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    print!("{output}");
}
