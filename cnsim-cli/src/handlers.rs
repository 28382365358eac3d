use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;

use cnsim_core::{genome, CnvProfile, SimulationConfig};

pub fn run_simulate(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .ok_or_else(|| anyhow::anyhow!("Config file is required"))?;
    let mut config = SimulationConfig::from_file(&PathBuf::from(config_path))
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(output_dir) = matches.get_one::<String>("output_dir") {
        config.output_dir = PathBuf::from(output_dir);
    }
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", config.output_dir))?;

    println!(
        "Simulating {} subclones, {} arm events, {} focal events",
        config.num_subclones, config.arm_num, config.focal_num
    );

    let csize = match &config.chrom_sizes {
        Some(path) => genome::read_chrom_sizes(path)?,
        None => genome::default_chrom_sizes(),
    };
    let cent_loc = match &config.centromeres {
        Some(path) => Some(genome::read_centromeres(path)?),
        None => None,
    };

    let mut profile =
        CnvProfile::with_genome(config.num_subclones, csize, cent_loc, config.seed);
    profile.add_cnv_events(
        config.arm_num,
        config.focal_num,
        config.p_whole,
        config.ratio_clonal,
        config.median_focal_length,
    )?;
    profile.calculate_cnv_profile()?;

    let seg_path = config.output_dir.join("cnv_segments.tsv");
    profile.write_seg_table(&seg_path)?;
    println!("Wrote segment table to {:?}", seg_path);

    let phased_path = config.output_dir.join("cnv_phased.tsv");
    profile.write_phased_table(&phased_path)?;
    println!("Wrote phased table to {:?}", phased_path);

    if let Some(cov_binned) = &config.coverage_bins {
        let cov_path = config.output_dir.join("coverage.tsv");
        profile.save_coverage_file(
            &cov_path,
            config.purity,
            cov_binned,
            config.x_coverage,
            config.sigma,
        )?;
        println!("Wrote coverage file to {:?}", cov_path);
    }

    match (&config.vcf, &config.depth_table) {
        (Some(vcf), Some(depth_table)) => {
            let hets_path = config.output_dir.join("hets.tsv");
            profile.save_hets_file(&hets_path, vcf, depth_table, config.purity)?;
            println!("Wrote hets file to {:?}", hets_path);
        }
        (Some(_), None) | (None, Some(_)) => {
            eprintln!("Warning: allele-count synthesis needs both vcf and depth_table; skipping");
        }
        (None, None) => {}
    }

    println!("Simulation complete");
    Ok(())
}

pub fn run_config(matches: &ArgMatches) -> Result<()> {
    let output = matches
        .get_one::<String>("output")
        .ok_or_else(|| anyhow::anyhow!("Output file is required"))?;
    let config = SimulationConfig::default();
    config.to_file(&PathBuf::from(output))?;
    println!("Wrote example configuration to {}", output);
    Ok(())
}
