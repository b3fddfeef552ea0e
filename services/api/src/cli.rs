use crate::commands::{run_import, run_preview, run_template, ImportArgs, PreviewArgs, TemplateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_directory::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "talent-directory",
    about = "Serve the talent directory or check CSV uploads from the command line",
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
    /// Dry-run an import into a throwaway in-memory store and print the summary
    Import(ImportArgs),
    /// Show the first rows of a CSV file and any missing required columns
    Preview(PreviewArgs),
    /// Write the CSV template for an import type
    Template(TemplateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args),
        Command::Preview(args) => run_preview(args),
        Command::Template(args) => run_template(args),
    }
}
