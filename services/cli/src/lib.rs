mod checklist;
mod cli;
mod infra;
mod upload;

use dispute_evidence::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
