use clap::{Arg, Command};

pub const SIMULATE_CMD: &str = "simulate";
pub const CONFIG_CMD: &str = "config";

pub fn create_simulate_cli() -> Command {
    Command::new(SIMULATE_CMD)
        .about("Run a full copy-number profile simulation")
        .long_about(
            "Run a full copy-number profile simulation from a TOML configuration file.\n\n\
            Always writes the segment (major/minor) and phased (paternal/maternal) tables.\n\
            When the config provides a binned coverage track, a ploidy-corrected coverage\n\
            file is written; when it provides a VCF and depth table, a het-site allele-count\n\
            file is written.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML simulation configuration file")
                .required(true),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("NUMBER")
                .help("Override the RNG seed from the config file")
                .value_parser(clap::value_parser!(u64))
                .required(false),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Override the output directory from the config file")
                .required(false),
        )
}

pub fn create_config_cli() -> Command {
    Command::new(CONFIG_CMD)
        .about("Generate an example TOML configuration file")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output configuration file")
                .default_value("cnsim_config.toml"),
        )
}
