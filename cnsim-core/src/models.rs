use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::consts;

// ============================================================================
// Event Model
// ============================================================================

/// Class of copy-number event a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Baseline single-copy layer laid down at chromosome initialization.
    Haploid,
    /// Whole-chromosome or single-arm event.
    Arm,
    /// Short, randomly placed event.
    Focal,
}

/// Parental haplotype an event acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allele {
    Paternal,
    Maternal,
}

impl Allele {
    /// The opposite haplotype, used as the reference allele in deletion checks.
    pub fn other(&self) -> Allele {
        match self {
            Allele::Paternal => Allele::Maternal,
            Allele::Maternal => Allele::Paternal,
        }
    }
}

/// One committed copy-number change contributed by a single subclone.
///
/// `cn_delta` is a relative increment layered on top of whatever the lineage
/// has already accumulated; only the initial `Haploid` layer carries the
/// absolute baseline of 1 copy. `cluster` is `None` only for merged states
/// produced by flattening, where the contributing subclone is no longer
/// identifiable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CnEvent {
    pub kind: EventKind,
    pub allele: Allele,
    pub cluster: Option<u32>,
    pub cn_delta: f64,
}

impl CnEvent {
    pub fn new(kind: EventKind, allele: Allele, cluster: u32, cn_delta: f64) -> Self {
        Self {
            kind,
            allele,
            cluster: Some(cluster),
            cn_delta,
        }
    }
}

/// One entry in a chromosome's append-only layer ledger.
///
/// Coordinates are 1-based, half-open `[start, end)`, and always lie within
/// the owning chromosome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CnLayer {
    pub start: u64,
    pub end: u64,
    pub event: CnEvent,
}

impl CnLayer {
    pub fn new(start: u64, end: u64, event: CnEvent) -> Self {
        Self { start, end, event }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && self.end > start
    }
}

// ============================================================================
// Flattened Profile Model
// ============================================================================

/// A maximal run of constant accumulated copy number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CnSegment {
    pub start: u64,
    pub end: u64,
    pub cn: f64,
}

impl CnSegment {
    pub fn new(start: u64, end: u64, cn: f64) -> Self {
        Self { start, end, cn }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Final CCF-weighted copy-number profile for one allele of one chromosome.
///
/// Segments are sorted and non-overlapping. Queries outside any segment
/// report a copy number of 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlleleProfile {
    pub segments: Vec<CnSegment>,
}

impl AlleleProfile {
    pub fn new(segments: Vec<CnSegment>) -> Self {
        Self { segments }
    }

    /// Copy number at a single genomic position.
    pub fn value_at(&self, pos: u64) -> f64 {
        self.segments
            .iter()
            .find(|s| s.start <= pos && pos < s.end)
            .map(|s| s.cn)
            .unwrap_or(0.0)
    }

    /// Length-weighted mean copy number over `[start, end)`.
    pub fn mean_over(&self, start: u64, end: u64) -> f64 {
        if end <= start {
            return 0.0;
        }
        let mut total = 0.0;
        for seg in &self.segments {
            let s = seg.start.max(start);
            let e = seg.end.min(end);
            if e > s {
                total += (e - s) as f64 * seg.cn;
            }
        }
        total / (end - start) as f64
    }
}

// ============================================================================
// Table Rows
// ============================================================================

/// Allele-order-independent segment table row (major/minor convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRow {
    pub contig: u8,
    pub start: u64,
    pub end: u64,
    pub major: f64,
    pub minor: f64,
}

/// Phase-preserving segment table row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasedRow {
    pub contig: u8,
    pub start: u64,
    pub end: u64,
    pub paternal: f64,
    pub maternal: f64,
}

// ============================================================================
// Configuration Model
// ============================================================================

/// Configuration for a full simulation run.
///
/// Controls phylogeny size, event counts and policies, and the optional
/// coverage/SNV synthesis inputs.
///
/// # Example
/// ```toml
/// num_subclones = 3
/// arm_num = 10
/// focal_num = 30
/// p_whole = 0.6
/// ratio_clonal = 0.5
/// purity = 0.8
/// output_dir = "output"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_subclones: usize,
    pub arm_num: usize,
    pub focal_num: usize,
    pub p_whole: f64,
    pub ratio_clonal: f64,
    pub median_focal_length: f64,
    pub purity: f64,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub chrom_sizes: Option<PathBuf>,
    #[serde(default)]
    pub centromeres: Option<PathBuf>,
    #[serde(default)]
    pub coverage_bins: Option<PathBuf>,
    #[serde(default)]
    pub x_coverage: Option<f64>,
    #[serde(default)]
    pub sigma: Option<f64>,
    #[serde(default)]
    pub vcf: Option<PathBuf>,
    #[serde(default)]
    pub depth_table: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_subclones: consts::DEFAULT_NUM_SUBCLONES,
            arm_num: 10,
            focal_num: 30,
            p_whole: 0.6,
            ratio_clonal: 0.5,
            median_focal_length: consts::DEFAULT_MEDIAN_FOCAL_LENGTH,
            purity: 0.8,
            output_dir: PathBuf::from("output"),
            seed: None,
            chrom_sizes: None,
            centromeres: None,
            coverage_bins: None,
            x_coverage: None,
            sigma: None,
            vcf: None,
            depth_table: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
