use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codedrive::Shutdown;
use log::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "codedrive", version, about = "Sync a working directory through a git mirror")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the working directory and push the mirror periodically
    Upload {
        /// Path to the JSON sync config
        #[arg(env = "CODEDRIVE_CONFIG")]
        config: PathBuf,
    },
    /// Poll the remote and copy changed files into the working directory
    Download {
        #[arg(env = "CODEDRIVE_CONFIG")]
        config: PathBuf,
    },
    /// Mirror the working directory into path_out without git
    Mirror {
        #[arg(env = "CODEDRIVE_CONFIG")]
        config: PathBuf,
    },
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Interrupt received, shutting down");
            shutdown.trigger();
        }) {
            error!("Failed to install Ctrl-C handler: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Command::Upload { config } => codedrive::upload(&config, shutdown).await,
            Command::Download { config } => codedrive::download(&config, shutdown).await,
            Command::Mirror { config } => codedrive::mirror(&config, shutdown).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
