use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod browser;
pub mod extract;
pub mod form;
pub mod link;

use crate::core::AppConfig;
use link::LinkArgs;

#[derive(Subcommand)]
enum Command {
    /// Fill in the booking form interactively
    Form {
        /// Open each generated link in the browser
        #[arg(long, action, default_value = "false")]
        open: bool,
    },
    /// Extract a booking from screenshots and print the calendar link
    Extract {
        /// Screenshot files, sent to the model in this order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, action, default_value = "false")]
        open: bool,
    },
    /// Create a calendar link from booking fields without extraction
    Link {
        #[command(flatten)]
        args: LinkArgs,
        #[arg(long, action, default_value = "false")]
        open: bool,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        // Keep stdout for links and JSON
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let config = AppConfig::default();

    match args.command {
        Some(Command::Form { open }) => {
            form::run(&config, open).await?;
        }
        Some(Command::Extract { paths, open }) => {
            extract::run(&config, &paths, open).await?;
        }
        Some(Command::Link { args, open }) => {
            link::run(&config, args, open).await?;
        }
        None => {}
    }

    Ok(())
}
