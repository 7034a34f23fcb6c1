use crate::checklist::{run_checklist, ChecklistArgs};
use crate::upload::{run_upload, UploadArgs};
use clap::{Parser, Subcommand};
use dispute_evidence::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Dispute Evidence Intake",
    about = "Upload and track evidence documents for land dispute cases",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the document checklist for a dispute category
    Checklist(ChecklistArgs),
    /// Submit evidence files to the verification service and report progress
    Upload(UploadArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Checklist(args) => run_checklist(args),
        Command::Upload(args) => run_upload(args).await,
    }
}
