//! WEEE Checker - e-waste photo classification from detector output
//!
//! A CLI tool that turns raw vision-detection payloads into one of the
//! six WEEE disposal categories, with an optional LLM arbiter for
//! ambiguous photos.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
