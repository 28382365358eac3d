use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand_distr::{Distribution, Normal, Poisson};

use crate::consts::DEFAULT_COVERAGE_SIGMA;
use crate::errors::CnSimError;
use crate::genome::{self, get_dynamic_reader};
use crate::models::AlleleProfile;
use crate::profile::CnvProfile;

/// One bin of the supplied base coverage track.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageBin {
    pub contig: u8,
    pub start: u64,
    pub end: u64,
    pub coverage: f64,
}

/// One bin of synthesized tumor coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRecord {
    pub contig: u8,
    pub start: u64,
    pub end: u64,
    /// Coverage scaled by local ploidy.
    pub covcorr: u64,
    /// Coverage before ploidy correction.
    pub covraw: f64,
    pub ploidy: f64,
}

/// Average local ploidy of a tumor sample with the given purity over
/// `[start, end)`: the tumor fraction carries the simulated allele copy
/// numbers, the normal fraction is diploid.
pub fn get_average_ploidy(
    pat: &AlleleProfile,
    mat: &AlleleProfile,
    start: u64,
    end: u64,
    purity: f64,
) -> f64 {
    let pat_ploidy = pat.mean_over(start, end);
    let mat_ploidy = mat.mean_over(start, end);
    purity * (pat_ploidy + mat_ploidy) + 2.0 * (1.0 - purity)
}

/// Read a headered binned-coverage TSV (`chrom`, `start`, `end`,
/// `coverage`). Transparent to gzip.
pub fn read_binned_coverage(path: &Path) -> Result<Vec<CoverageBin>> {
    let reader = get_dynamic_reader(path)?;
    let mut bins = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;
        if line_num == 0 || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has {} fields (expected 4)",
                line_num + 1,
                path,
                fields.len()
            ))
            .into());
        }
        bins.push(CoverageBin {
            contig: genome::parse_contig(fields[0])?,
            start: fields[1]
                .parse()
                .with_context(|| format!("Invalid start on line {} of {:?}", line_num + 1, path))?,
            end: fields[2]
                .parse()
                .with_context(|| format!("Invalid end on line {} of {:?}", line_num + 1, path))?,
            coverage: fields[3]
                .parse()
                .with_context(|| format!("Invalid coverage on line {} of {:?}", line_num + 1, path))?,
        });
    }
    Ok(bins)
}

impl CnvProfile {
    /// Scale a binned coverage track by the simulated local ploidy.
    ///
    /// Bins on contigs outside the simulated genome are dropped. When
    /// `x_coverage` is given, raw bin coverage is replaced with a
    /// log-normal Poisson draw around `x_coverage * bin_len / 2`.
    /// Requires [`calculate_cnv_profile`] to have run.
    ///
    /// [`calculate_cnv_profile`]: CnvProfile::calculate_cnv_profile
    pub fn generate_coverage(
        &mut self,
        purity: f64,
        bins: &[CoverageBin],
        x_coverage: Option<f64>,
        sigma: Option<f64>,
    ) -> Result<Vec<CoverageRecord>, CnSimError> {
        let sigma = sigma.unwrap_or(DEFAULT_COVERAGE_SIGMA);
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?;

        let kept: Vec<&CoverageBin> = bins
            .iter()
            .filter(|b| self.csize.contains_key(&b.contig))
            .collect();

        let pb = ProgressBar::new(kept.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} bins covered")
                .unwrap(),
        );

        let mut records = Vec::with_capacity(kept.len());
        for bin in kept {
            let (pat, mat) = &self.cnv_profiles()?[&bin.contig];
            let ploidy = get_average_ploidy(pat, mat, bin.start, bin.end, purity);

            let covraw = match x_coverage {
                Some(x) => {
                    let dispersion = normal.sample(self.rng_mut());
                    let lambda = x * (bin.end - bin.start) as f64 / 2.0 + dispersion.exp();
                    Poisson::new(lambda)
                        .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?
                        .sample(self.rng_mut())
                }
                None => bin.coverage,
            };

            records.push(CoverageRecord {
                contig: bin.contig,
                start: bin.start,
                end: bin.end,
                covcorr: (covraw * ploidy / 2.0).floor() as u64,
                covraw,
                ploidy,
            });
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(records)
    }

    /// Run coverage synthesis end to end and write the result as a TSV with
    /// columns `chr`, `start`, `end`, `covcorr`, `covraw`, `ploidy`.
    pub fn save_coverage_file(
        &mut self,
        filename: &Path,
        purity: f64,
        cov_binned_file: &Path,
        x_coverage: Option<f64>,
        sigma: Option<f64>,
    ) -> Result<()> {
        let bins = read_binned_coverage(cov_binned_file)?;
        let records = self.generate_coverage(purity, &bins, x_coverage, sigma)?;

        let file = File::create(filename)
            .with_context(|| format!("Failed to create coverage file: {:?}", filename))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "chr\tstart\tend\tcovcorr\tcovraw\tploidy")?;
        for r in records {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                genome::contig_name(r.contig),
                r.start,
                r.end,
                r.covcorr,
                r.covraw,
                r.ploidy
            )?;
        }
        Ok(())
    }
}
