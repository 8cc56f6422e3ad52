use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nexasales::error::AppError;

use crate::batch::{run_segmentation, RunArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "NexaSales",
    about = "Customer segmentation and market priority evaluation",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Execute one segmentation run and write the artifact to a JSON file
    Run(RunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON object of canned collaborator replies keyed by task or task:segment_id
    #[arg(long)]
    pub(crate) responses: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Run(args) => run_segmentation(args),
    }
}
