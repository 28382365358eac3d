use std::collections::BTreeMap;
use std::f64::consts::LN_2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Poisson};

use crate::chromosome::Chromosome;
use crate::consts::{
    ARM_DELETION_ZERO_FRACTION_LIMIT, P_ARM_DELETION, P_ARM_FULL_DELETION, P_FOCAL_DELETION,
    FOCAL_AMP_POISSON_MEAN, FOCAL_DELETION_LAMBDA_SCALE,
};
use crate::errors::CnSimError;
use crate::genome;
use crate::models::{Allele, AlleleProfile, CnSegment, EventKind, PhasedRow, SegmentRow};
use crate::phylogeny::Phylogeny;

/// Deterministic arm-level operation, chosen by the randomized policy in
/// [`CnvProfile::add_arm_event`] but applicable directly for scripted
/// scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOp {
    /// Remove the entire lineage-visible level of the target allele.
    DeleteFull,
    /// Remove one copy wherever the lineage-visible level is nonzero.
    DeleteOne,
    /// Double the lineage-visible level (zero stays zero).
    Amplify,
}

/// Deterministic focal operation; the amplification gain is drawn once per
/// event, not per sub-interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocalOp {
    Delete,
    Amplify { gain: f64 },
}

/// Simulated tumor copy-number profile: one chromosome ledger per contig,
/// a subclone phylogeny, and the randomized event-generation policies.
///
/// Event generation is strictly sequential: each `add_*_event` call reads
/// the ledger state committed so far before appending new layers, so call
/// order is semantically significant. Aggregation into the final
/// CCF-weighted profiles is a separate, explicit step.
#[derive(Debug)]
pub struct CnvProfile {
    pub csize: BTreeMap<u8, u64>,
    pub cent_loc: BTreeMap<u8, u64>,
    pub chromosomes: BTreeMap<u8, Chromosome>,
    pub phylogeny: Phylogeny,
    cnv_profiles: Option<BTreeMap<u8, (AlleleProfile, AlleleProfile)>>,
    rng: StdRng,
}

impl CnvProfile {
    /// Profile over the compiled-in hg19 genome.
    pub fn new(num_subclones: usize, seed: Option<u64>) -> Self {
        Self::with_genome(num_subclones, genome::default_chrom_sizes(), None, seed)
    }

    /// Profile over a caller-supplied genome; centromeres default to each
    /// contig's midpoint when absent.
    pub fn with_genome(
        num_subclones: usize,
        csize: BTreeMap<u8, u64>,
        cent_loc: Option<BTreeMap<u8, u64>>,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let cent_loc = cent_loc.unwrap_or_else(|| genome::default_centromeres(&csize));
        let chromosomes = csize
            .iter()
            .map(|(&contig, &length)| (contig, Chromosome::new(contig, length)))
            .collect();
        let phylogeny = Phylogeny::new(num_subclones, &mut rng);
        Self {
            csize,
            cent_loc,
            chromosomes,
            phylogeny,
            cnv_profiles: None,
            rng,
        }
    }

    fn chromosome(&self, contig: u8) -> Result<&Chromosome, CnSimError> {
        self.chromosomes
            .get(&contig)
            .ok_or_else(|| CnSimError::UnknownContig(genome::contig_name(contig)))
    }

    fn pick_contig(&mut self) -> u8 {
        let keys: Vec<u8> = self.csize.keys().copied().collect();
        keys[self.rng.gen_range(0..keys.len())]
    }

    fn pick_allele(&mut self) -> Allele {
        if self.rng.gen::<f64>() > 0.5 {
            Allele::Paternal
        } else {
            Allele::Maternal
        }
    }

    // ------------------------------------------------------------------
    // Event generation
    // ------------------------------------------------------------------

    /// Add a batch of arm-level and focal events across the phylogeny.
    ///
    /// `ceil(n * ratio_clonal)` events of each kind go to the truncal
    /// cluster; the remaining share is split evenly (ceil) across each
    /// non-root subclone.
    pub fn add_cnv_events(
        &mut self,
        arm_num: usize,
        focal_num: usize,
        p_whole: f64,
        ratio_clonal: f64,
        median_focal_length: f64,
    ) -> Result<(), CnSimError> {
        let clonal_arm = (arm_num as f64 * ratio_clonal).ceil() as usize;
        let clonal_focal = (focal_num as f64 * ratio_clonal).ceil() as usize;
        for _ in 0..clonal_arm {
            self.add_arm_event(1, p_whole, None)?;
        }
        for _ in 0..clonal_focal {
            self.add_focal_event(1, median_focal_length)?;
        }

        let num_subclones = self.phylogeny.num_subclones;
        if num_subclones == 0 {
            return Ok(());
        }
        let per_subclone = |n: usize| -> usize {
            ((n as f64 * (1.0 - ratio_clonal)) / num_subclones as f64).ceil() as usize
        };
        let subclonal_arm = per_subclone(arm_num);
        let subclonal_focal = per_subclone(focal_num);
        for cluster in 2..num_subclones as u32 + 2 {
            for _ in 0..subclonal_arm {
                self.add_arm_event(cluster, p_whole, None)?;
            }
            for _ in 0..subclonal_focal {
                self.add_focal_event(cluster, median_focal_length)?;
            }
        }
        Ok(())
    }

    /// Add one arm-level event attributed to `cluster`.
    ///
    /// Region is the whole chromosome, or one side of the centromere with
    /// probability `1 - p_whole`. Target allele is uniform; deletion is
    /// chosen with probability 0.6 and degenerates to a full deletion with
    /// probability 0.3.
    pub fn add_arm_event(
        &mut self,
        cluster: u32,
        p_whole: f64,
        chrom: Option<u8>,
    ) -> Result<(), CnSimError> {
        let contig = match chrom {
            Some(c) => c,
            None => self.pick_contig(),
        };
        let length = *self
            .csize
            .get(&contig)
            .ok_or_else(|| CnSimError::UnknownContig(genome::contig_name(contig)))?;
        let mut start = 1;
        let mut end = length;

        if self.rng.gen::<f64>() > p_whole {
            let centromere = *self.cent_loc.get(&contig).unwrap_or(&(length / 2));
            if self.rng.gen::<f64>() > 0.5 {
                start = centromere;
            } else {
                end = centromere;
            }
        }

        let allele = self.pick_allele();
        let op = if self.rng.gen::<f64>() < P_ARM_DELETION {
            if self.rng.gen::<f64>() < P_ARM_FULL_DELETION {
                ArmOp::DeleteFull
            } else {
                ArmOp::DeleteOne
            }
        } else {
            ArmOp::Amplify
        };

        self.apply_arm_event(contig, start, end, allele, cluster, op)
    }

    /// Apply one arm-level operation over `[start, end)` of the target
    /// allele, reading the lineage-visible state first.
    ///
    /// Deletions consult the *other* allele: if more than 30% of the region
    /// (length-weighted) is already at copy number 0 there, the deletion is
    /// suppressed so both alleles cannot be driven to full loss.
    pub fn apply_arm_event(
        &mut self,
        contig: u8,
        start: u64,
        end: u64,
        allele: Allele,
        cluster: u32,
        op: ArmOp,
    ) -> Result<(), CnSimError> {
        let (pat, mat) = self
            .chromosome(contig)?
            .calc_current_lineage_cn(start, end, cluster, &self.phylogeny)?;
        let (target, reference) = match allele {
            Allele::Paternal => (pat, mat),
            Allele::Maternal => (mat, pat),
        };

        let deletion_adjust = {
            let zero_len: u64 = reference
                .iter()
                .filter(|s| s.cn == 0.0)
                .map(CnSegment::len)
                .sum();
            let zero_fraction = zero_len as f64 / (end - start) as f64;
            if zero_fraction > ARM_DELETION_ZERO_FRACTION_LIMIT {
                0.0
            } else {
                1.0
            }
        };

        let deltas: Vec<(u64, u64, f64)> = target
            .iter()
            .map(|seg| {
                let delta = match op {
                    ArmOp::DeleteFull => -seg.cn * deletion_adjust,
                    ArmOp::DeleteOne => {
                        if seg.cn == 0.0 || deletion_adjust == 0.0 {
                            0.0
                        } else {
                            -1.0
                        }
                    }
                    ArmOp::Amplify => seg.cn,
                };
                (seg.start, seg.end, delta)
            })
            .collect();

        let chromosome = self
            .chromosomes
            .get_mut(&contig)
            .ok_or_else(|| CnSimError::UnknownContig(genome::contig_name(contig)))?;
        for (seg_start, seg_end, delta) in deltas {
            chromosome.add_layer(EventKind::Arm, allele, cluster, delta, seg_start, seg_end);
        }
        Ok(())
    }

    /// Add one focal event attributed to `cluster`.
    ///
    /// Length is exponential with mean `median / ln 2` so the median equals
    /// the requested value; the start is uniform and the end is clamped to
    /// the contig. Deletion is chosen with probability 0.5; amplification
    /// draws a single `Poisson(0.8) + 1` gain shared across the event.
    pub fn add_focal_event(
        &mut self,
        cluster: u32,
        median_focal_length: f64,
    ) -> Result<(), CnSimError> {
        let contig = self.pick_contig();
        let length = self.csize[&contig];

        let mean_length = median_focal_length / LN_2;
        let exp = Exp::new(1.0 / mean_length)
            .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?;
        let focal_length = (exp.sample(&mut self.rng).floor() as u64).max(1);

        let upper = length.saturating_sub(focal_length).max(2);
        let start = self.rng.gen_range(1..upper);
        let end = (start + focal_length).min(length);
        if end <= start {
            return Err(CnSimError::DegenerateInterval { start, end });
        }

        let allele = self.pick_allele();
        let op = if self.rng.gen::<f64>() < P_FOCAL_DELETION {
            FocalOp::Delete
        } else {
            let poisson = Poisson::new(FOCAL_AMP_POISSON_MEAN)
                .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?;
            FocalOp::Amplify {
                gain: poisson.sample(&mut self.rng) + 1.0,
            }
        };

        self.apply_focal_event(contig, start, end, allele, cluster, op)
    }

    /// Apply one focal operation over `[start, end)` of the target allele.
    ///
    /// Deletion removes `max(1, level - Poisson(level / 10))` copies per
    /// sub-interval, biased toward deeper loss at amplified loci; points at
    /// level 0 are untouched on either branch.
    pub fn apply_focal_event(
        &mut self,
        contig: u8,
        start: u64,
        end: u64,
        allele: Allele,
        cluster: u32,
        op: FocalOp,
    ) -> Result<(), CnSimError> {
        let (pat, mat) = self
            .chromosome(contig)?
            .calc_current_lineage_cn(start, end, cluster, &self.phylogeny)?;
        let target = match allele {
            Allele::Paternal => pat,
            Allele::Maternal => mat,
        };

        let mut deltas: Vec<(u64, u64, f64)> = Vec::with_capacity(target.len());
        for seg in &target {
            let delta = match op {
                FocalOp::Delete => {
                    if seg.cn == 0.0 {
                        0.0
                    } else {
                        let lambda = seg.cn * FOCAL_DELETION_LAMBDA_SCALE;
                        let drawn = if lambda > 0.0 {
                            Poisson::new(lambda)
                                .map_err(|e| CnSimError::InvalidDistribution(e.to_string()))?
                                .sample(&mut self.rng)
                        } else {
                            0.0
                        };
                        -(seg.cn - drawn).max(1.0)
                    }
                }
                FocalOp::Amplify { gain } => {
                    if seg.cn == 0.0 {
                        0.0
                    } else {
                        gain
                    }
                }
            };
            deltas.push((seg.start, seg.end, delta));
        }

        let chromosome = self
            .chromosomes
            .get_mut(&contig)
            .ok_or_else(|| CnSimError::UnknownContig(genome::contig_name(contig)))?;
        for (seg_start, seg_end, delta) in deltas {
            chromosome.add_layer(EventKind::Focal, allele, cluster, delta, seg_start, seg_end);
        }
        Ok(())
    }

    // Extension points matching the simulator's roadmap. None of the
    // underlying biology is modeled yet.

    pub fn add_wgd(&mut self) -> Result<(), CnSimError> {
        Err(CnSimError::Unimplemented("whole-genome doubling"))
    }

    pub fn add_chromothripsis(&mut self) -> Result<(), CnSimError> {
        Err(CnSimError::Unimplemented("chromothripsis"))
    }

    pub fn add_cn_loh(&mut self) -> Result<(), CnSimError> {
        Err(CnSimError::Unimplemented("copy-neutral LOH"))
    }

    // ------------------------------------------------------------------
    // Aggregation and export
    // ------------------------------------------------------------------

    /// Collapse every chromosome's ledger into final CCF-weighted profiles.
    ///
    /// Must only run after event generation completes; re-derives from
    /// scratch each time rather than updating incrementally.
    pub fn calculate_cnv_profile(&mut self) -> Result<(), CnSimError> {
        let mut profiles = BTreeMap::new();
        for (&contig, chromosome) in &self.chromosomes {
            profiles.insert(contig, chromosome.calc_full_cnv(&self.phylogeny)?);
        }
        self.cnv_profiles = Some(profiles);
        Ok(())
    }

    /// Final per-contig `(paternal, maternal)` profiles.
    pub fn cnv_profiles(
        &self,
    ) -> Result<&BTreeMap<u8, (AlleleProfile, AlleleProfile)>, CnSimError> {
        self.cnv_profiles
            .as_ref()
            .ok_or(CnSimError::ProfileNotComputed)
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Concatenated major/minor segment table in natural contig order.
    pub fn segment_table(&self) -> Result<Vec<SegmentRow>, CnSimError> {
        let profiles = self.cnv_profiles()?;
        let mut rows = Vec::new();
        for (contig, (pat, mat)) in profiles {
            rows.extend(self.chromosome(*contig)?.segment_table(pat, mat));
        }
        Ok(rows)
    }

    /// Concatenated paternal/maternal segment table in natural contig order.
    pub fn phased_table(&self) -> Result<Vec<PhasedRow>, CnSimError> {
        let profiles = self.cnv_profiles()?;
        let mut rows = Vec::new();
        for (contig, (pat, mat)) in profiles {
            rows.extend(self.chromosome(*contig)?.phased_table(pat, mat));
        }
        Ok(rows)
    }

    pub fn write_seg_table(&self, path: &Path) -> Result<()> {
        let rows = self.segment_table()?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create segment table: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Chromosome\tStart.bp\tEnd.bp\tmajor\tminor")?;
        for row in rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                genome::contig_name(row.contig),
                row.start,
                row.end,
                row.major,
                row.minor
            )?;
        }
        Ok(())
    }

    pub fn write_phased_table(&self, path: &Path) -> Result<()> {
        let rows = self.phased_table()?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create phased table: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Chromosome\tStart.bp\tEnd.bp\tpaternal\tmaternal")?;
        for row in rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                genome::contig_name(row.contig),
                row.start,
                row.end,
                row.paternal,
                row.maternal
            )?;
        }
        Ok(())
    }
}
