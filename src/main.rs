use clap::Parser;
use kubesweep::cli::Cli;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    if let Err(e) = kubesweep::run_command(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
