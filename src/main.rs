mod auth;
mod credential_storage;
mod drive;
mod preferences;
mod cli;

use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::run().await
}
