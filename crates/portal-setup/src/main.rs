use std::process::ExitCode;

use clap::Parser;
use portal_setup::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.execute().await
}
