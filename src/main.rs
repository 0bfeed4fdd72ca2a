use std::process;

use clap::Parser;

use sharpo::interfaces::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
