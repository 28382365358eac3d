use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand_distr::{Binomial, Distribution, Exp};

use crate::consts::PHASE_SWITCH_MEAN_LENGTH;
use crate::coverage::get_average_ploidy;
use crate::errors::CnSimError;
use crate::genome::{self, get_dynamic_reader};
use crate::profile::CnvProfile;

/// One heterozygous site from the germline VCF, with per-haplotype presence
/// of the alt allele taken from the phased genotype.
#[derive(Debug, Clone, PartialEq)]
pub struct HetSite {
    pub contig: u8,
    pub pos: u64,
    pub maternal_present: bool,
    pub paternal_present: bool,
}

/// One synthesized allele-count record.
#[derive(Debug, Clone, PartialEq)]
pub struct SnvRecord {
    pub contig: u8,
    pub pos: u64,
    pub ploidy: f64,
    pub maternal_prop: f64,
    pub paternal_prop: f64,
    pub adjusted_depth: u64,
    pub alt_count: u64,
    pub ref_count: u64,
}

/// Per-contig run-length-encoded phasing-correctness track. `false` runs
/// mark stretches where the reported phase is switched.
#[derive(Debug, Clone, Default)]
pub struct PhaseSwitchTrack {
    pub runs: BTreeMap<u8, Vec<(u64, u64, bool)>>,
}

impl PhaseSwitchTrack {
    /// Whether the phase at a position is correct. Positions past the last
    /// run keep the last run's state.
    pub fn correct_phase_at(&self, contig: u8, pos: u64) -> bool {
        let Some(runs) = self.runs.get(&contig) else {
            return true;
        };
        for &(start, end, correct) in runs {
            if start <= pos && pos < end {
                return correct;
            }
        }
        runs.last().map(|&(_, _, correct)| correct).unwrap_or(true)
    }
}

/// Parse heterozygous sites out of a VCF.
///
/// Only CHROM, POS and the first sample's phased GT are consumed; the alt
/// allele is "present" on a haplotype when the corresponding GT slot is 1.
/// Transparent to gzip.
pub fn read_vcf_sites(path: &Path) -> Result<Vec<HetSite>> {
    let reader = get_dynamic_reader(path)?;
    let mut sites = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 10 {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has {} fields (expected VCF with one sample)",
                line_num + 1,
                path,
                fields.len()
            ))
            .into());
        }
        let genotype = fields[9].as_bytes();
        if genotype.len() < 3 {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has a malformed genotype field",
                line_num + 1,
                path
            ))
            .into());
        }
        sites.push(HetSite {
            contig: genome::parse_contig(fields[0])?,
            pos: fields[1]
                .parse()
                .with_context(|| format!("Invalid POS on line {} of {:?}", line_num + 1, path))?,
            maternal_present: genotype[0] == b'1',
            paternal_present: genotype[2] == b'1',
        });
    }
    Ok(sites)
}

/// Read a headered per-site depth TSV (`chrom`, `pos`, `depth`).
pub fn read_depth_table(path: &Path) -> Result<HashMap<(u8, u64), u64>> {
    let reader = get_dynamic_reader(path)?;
    let mut depths = HashMap::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;
        if line_num == 0 || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has {} fields (expected 3)",
                line_num + 1,
                path,
                fields.len()
            ))
            .into());
        }
        let contig = genome::parse_contig(fields[0])?;
        let pos: u64 = fields[1]
            .parse()
            .with_context(|| format!("Invalid pos on line {} of {:?}", line_num + 1, path))?;
        let depth: u64 = fields[2]
            .parse()
            .with_context(|| format!("Invalid depth on line {} of {:?}", line_num + 1, path))?;
        depths.insert((contig, pos), depth);
    }
    Ok(depths)
}

/// Alt-read count for one site given per-haplotype proportions and
/// presence, after applying any phase switch.
pub fn get_alt_count(
    m_prop: f64,
    p_prop: f64,
    m_present: bool,
    p_present: bool,
    depth: u64,
    correct_phase: bool,
    rng: &mut StdRng,
) -> Result<u64, CnSimError> {
    let (m_prop, p_prop, m_present, p_present) = if correct_phase {
        (m_prop, p_prop, m_present, p_present)
    } else {
        (p_prop, m_prop, p_present, m_present)
    };

    if m_present && p_present {
        return Ok(depth);
    }
    if !m_present && !p_present {
        return Ok(0);
    }
    let prop = if m_present { m_prop } else { p_prop };
    let binomial = Binomial::new(depth, prop.clamp(0.0, 1.0))
        .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?;
    Ok(binomial.sample(rng))
}

impl CnvProfile {
    /// Generate an independent phase-switch track per contig: alternating
    /// correct/switched runs with exponential(mean 1e6) lengths.
    pub fn generate_phase_switches(&mut self) -> Result<PhaseSwitchTrack, CnSimError> {
        let exp = Exp::new(1.0 / PHASE_SWITCH_MEAN_LENGTH)
            .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?;

        let csize: Vec<(u8, u64)> = self.csize.iter().map(|(&c, &l)| (c, l)).collect();
        let mut track = PhaseSwitchTrack::default();
        for (contig, size) in csize {
            let mut runs = Vec::new();
            let mut start = 1u64;
            let mut correct_phase = true;
            while start < size {
                let run_length = (exp.sample(self.rng_mut()).floor() as u64).max(1);
                runs.push((start, (start + run_length).min(size), correct_phase));
                correct_phase = !correct_phase;
                start += run_length;
            }
            track.runs.insert(contig, runs);
        }
        Ok(track)
    }

    /// Synthesize alt/ref counts for every het site with a known depth.
    ///
    /// Sites are joined to the depth table on (contig, position); sites on
    /// contigs outside the simulated genome or without a depth entry are
    /// skipped. Requires [`calculate_cnv_profile`] to have run.
    ///
    /// [`calculate_cnv_profile`]: CnvProfile::calculate_cnv_profile
    pub fn generate_snv_counts(
        &mut self,
        purity: f64,
        sites: &[HetSite],
        depths: &HashMap<(u8, u64), u64>,
    ) -> Result<(Vec<SnvRecord>, PhaseSwitchTrack), CnSimError> {
        let switches = self.generate_phase_switches()?;

        let mut records = Vec::new();
        for site in sites {
            if !self.csize.contains_key(&site.contig) {
                continue;
            }
            let Some(&depth) = depths.get(&(site.contig, site.pos)) else {
                continue;
            };

            let (maternal_prop, paternal_prop, ploidy) = {
                let (pat, mat) = &self.cnv_profiles()?[&site.contig];
                let ploidy = get_average_ploidy(pat, mat, site.pos, site.pos + 1, purity);
                let maternal_prop =
                    (mat.value_at(site.pos) * purity + (1.0 - purity)) / ploidy;
                let paternal_prop =
                    (pat.value_at(site.pos) * purity + (1.0 - purity)) / ploidy;
                (maternal_prop, paternal_prop, ploidy)
            };
            let adjusted_depth = (depth as f64 * ploidy / 2.0).floor() as u64;

            let correct_phase = switches.correct_phase_at(site.contig, site.pos);
            let alt_count = get_alt_count(
                maternal_prop,
                paternal_prop,
                site.maternal_present,
                site.paternal_present,
                adjusted_depth,
                correct_phase,
                self.rng_mut(),
            )?;

            records.push(SnvRecord {
                contig: site.contig,
                pos: site.pos,
                ploidy,
                maternal_prop,
                paternal_prop,
                adjusted_depth,
                alt_count,
                ref_count: adjusted_depth - alt_count,
            });
        }
        Ok((records, switches))
    }

    /// Run allele-count synthesis end to end and write a hets TSV with
    /// columns `CONTIG`, `POSITION`, `REF_COUNT`, `ALT_COUNT`.
    pub fn save_hets_file(
        &mut self,
        filename: &Path,
        vcf: &Path,
        depth_table: &Path,
        purity: f64,
    ) -> Result<()> {
        let sites = read_vcf_sites(vcf)?;
        let depths = read_depth_table(depth_table)?;
        let (records, _) = self.generate_snv_counts(purity, &sites, &depths)?;

        let file = File::create(filename)
            .with_context(|| format!("Failed to create hets file: {:?}", filename))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "CONTIG\tPOSITION\tREF_COUNT\tALT_COUNT")?;
        for r in records {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                genome::contig_name(r.contig),
                r.pos,
                r.ref_count,
                r.alt_count
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_alt_count_both_present() {
        let mut rng = StdRng::seed_from_u64(42);
        let count = get_alt_count(0.5, 0.5, true, true, 80, true, &mut rng).unwrap();
        assert_eq!(count, 80);
    }

    #[test]
    fn test_alt_count_neither_present() {
        let mut rng = StdRng::seed_from_u64(42);
        let count = get_alt_count(0.5, 0.5, false, false, 80, true, &mut rng).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_alt_count_single_allele_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let count = get_alt_count(0.4, 0.6, true, false, 100, true, &mut rng).unwrap();
            assert!(count <= 100);
        }
    }

    #[test]
    fn test_alt_count_phase_switch_swaps_presence() {
        let mut rng = StdRng::seed_from_u64(42);
        // maternal-only site with all copies paternal; the switch makes the
        // paternal slot the present one and hands it the zero proportion
        let count = get_alt_count(0.0, 1.0, true, false, 60, false, &mut rng).unwrap();
        assert_eq!(count, 0);
        // same site read with correct phase samples from the maternal
        // proportion instead
        let count = get_alt_count(0.0, 1.0, true, false, 60, true, &mut rng).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_phase_switch_track_covers_genome() {
        let mut csize = std::collections::BTreeMap::new();
        csize.insert(1u8, 5_000_000u64);
        let mut profile = CnvProfile::with_genome(0, csize, None, Some(42));
        let track = profile.generate_phase_switches().unwrap();
        let runs = &track.runs[&1];
        assert!(!runs.is_empty());
        assert_eq!(runs[0].0, 1);
        assert_eq!(runs[0].2, true);
        // contiguous and alternating
        for pair in runs.windows(2) {
            assert_eq!(pair[0].1.min(5_000_000), pair[1].0.min(5_000_000));
            assert_ne!(pair[0].2, pair[1].2);
        }
    }

    #[test]
    fn test_read_vcf_sites() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "##fileformat=VCFv4.2").unwrap();
        writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878").unwrap();
        writeln!(file, "chr1\t12345\t.\tA\tG\t50\tPASS\t.\tGT\t1|0").unwrap();
        writeln!(file, "chr2\t999\t.\tC\tT\t50\tPASS\t.\tGT\t0|1").unwrap();
        let sites = read_vcf_sites(file.path()).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].contig, 1);
        assert_eq!(sites[0].pos, 12345);
        assert!(sites[0].maternal_present);
        assert!(!sites[0].paternal_present);
        assert!(!sites[1].maternal_present);
        assert!(sites[1].paternal_present);
    }

    #[test]
    fn test_read_depth_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "CHROM\tPOS\tDEPTH").unwrap();
        writeln!(file, "chr1\t12345\t88").unwrap();
        let depths = read_depth_table(file.path()).unwrap();
        assert_eq!(depths[&(1, 12345)], 88);
    }

    #[test]
    fn test_snv_counts_diploid_site() {
        let mut csize = std::collections::BTreeMap::new();
        csize.insert(1u8, 1_000_000u64);
        let mut profile = CnvProfile::with_genome(0, csize, None, Some(42));
        profile.calculate_cnv_profile().unwrap();

        let sites = vec![HetSite {
            contig: 1,
            pos: 500,
            maternal_present: true,
            paternal_present: true,
        }];
        let mut depths = HashMap::new();
        depths.insert((1u8, 500u64), 100u64);

        let (records, _) = profile.generate_snv_counts(1.0, &sites, &depths).unwrap();
        assert_eq!(records.len(), 1);
        // diploid site, purity 1: ploidy 2, depth unchanged, hom-alt
        assert!((records[0].ploidy - 2.0).abs() < 1e-12);
        assert_eq!(records[0].adjusted_depth, 100);
        assert_eq!(records[0].alt_count, 100);
        assert_eq!(records[0].ref_count, 0);
        assert!((records[0].maternal_prop - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_snv_counts_skip_unknown_sites() {
        let mut csize = std::collections::BTreeMap::new();
        csize.insert(1u8, 1_000_000u64);
        let mut profile = CnvProfile::with_genome(0, csize, None, Some(42));
        profile.calculate_cnv_profile().unwrap();

        let sites = vec![
            // no depth entry
            HetSite { contig: 1, pos: 10, maternal_present: true, paternal_present: false },
            // contig outside the genome
            HetSite { contig: 9, pos: 10, maternal_present: true, paternal_present: false },
        ];
        let depths = HashMap::new();
        let (records, _) = profile.generate_snv_counts(0.8, &sites, &depths).unwrap();
        assert!(records.is_empty());
    }
}
