mod batch;
mod cli;
mod infra;
mod routes;
mod server;

use nexasales::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
