mod cli;
mod handlers;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "cnsim";
    pub const BIN_NAME: &str = "cnsim";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Simulate clonal tumor copy-number profiles with ground-truth coverage and allele counts for benchmarking genomic pipelines.")
        .subcommand_required(true)
        .subcommand(cli::create_simulate_cli())
        .subcommand(cli::create_config_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // SIMULATE
        //
        Some((cli::SIMULATE_CMD, matches)) => {
            handlers::run_simulate(matches)?;
        }

        //
        // CONFIG
        //
        Some((cli::CONFIG_CMD, matches)) => {
            handlers::run_config(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
