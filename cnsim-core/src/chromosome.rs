use crate::errors::CnSimError;
use crate::models::{Allele, AlleleProfile, CnEvent, CnLayer, CnSegment, EventKind, PhasedRow, SegmentRow};
use crate::phylogeny::Phylogeny;

/// One chromosome's dual-allele, append-only event ledger.
///
/// Each allele holds the full layered history of events: overlapping layers
/// with different clusters are expected and record which subclone added what,
/// where. Layers are only ever appended; flattening into actual copy-number
/// values happens on demand in [`calc_current_lineage_cn`] and
/// [`calc_full_cnv`].
///
/// [`calc_current_lineage_cn`]: Chromosome::calc_current_lineage_cn
/// [`calc_full_cnv`]: Chromosome::calc_full_cnv
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub name: u8,
    pub length: u64,
    paternal: Vec<CnLayer>,
    maternal: Vec<CnLayer>,
}

impl Chromosome {
    /// Create a chromosome seeded with one haploid baseline layer per allele
    /// spanning `[1, length)`.
    pub fn new(name: u8, length: u64) -> Self {
        let mut chromosome = Self {
            name,
            length,
            paternal: Vec::new(),
            maternal: Vec::new(),
        };
        chromosome.add_layer(EventKind::Haploid, Allele::Paternal, 1, 1.0, 1, length);
        chromosome.add_layer(EventKind::Haploid, Allele::Maternal, 1, 1.0, 1, length);
        chromosome
    }

    /// Append one event layer over `[start, end)` on one allele.
    pub fn add_layer(
        &mut self,
        kind: EventKind,
        allele: Allele,
        cluster: u32,
        cn_delta: f64,
        start: u64,
        end: u64,
    ) {
        let layer = CnLayer::new(start, end, CnEvent::new(kind, allele, cluster, cn_delta));
        match allele {
            Allele::Paternal => self.paternal.push(layer),
            Allele::Maternal => self.maternal.push(layer),
        }
    }

    pub fn layers(&self, allele: Allele) -> &[CnLayer] {
        match allele {
            Allele::Paternal => &self.paternal,
            Allele::Maternal => &self.maternal,
        }
    }

    /// Copy-number state accumulated so far along one subclone's lineage.
    ///
    /// For each allele: clip the ledger to `[start, end)`, keep only layers
    /// whose cluster is an ancestor of `cluster` (inclusive), and flatten by
    /// summing deltas at every point. Sibling and descendant layers are
    /// invisible. Cluster identity does not survive the summation; the
    /// result is "what is present", not "who caused it".
    pub fn calc_current_lineage_cn(
        &self,
        start: u64,
        end: u64,
        cluster: u32,
        phylogeny: &Phylogeny,
    ) -> Result<(Vec<CnSegment>, Vec<CnSegment>), CnSimError> {
        if end <= start {
            return Err(CnSimError::DegenerateInterval { start, end });
        }
        let (lineage, _) = phylogeny.get_lineage(cluster)?;

        let clip = |layers: &[CnLayer]| -> Vec<(u64, u64, f64)> {
            layers
                .iter()
                .filter(|l| l.overlaps(start, end))
                .filter(|l| l.event.cluster.map(|c| lineage.contains(&c)).unwrap_or(false))
                .map(|l| (l.start.max(start), l.end.min(end), l.event.cn_delta))
                .collect()
        };

        let pat = flatten_layers(&clip(&self.paternal));
        let mat = flatten_layers(&clip(&self.maternal));
        Ok((pat, mat))
    }

    /// Collapse the full layered history into final CCF-weighted profiles.
    ///
    /// Every layer of every cluster contributes `cn_delta * ccf[cluster]`;
    /// weighted deltas are summed pointwise. Pure derivation over the
    /// ledger, idempotent for a fixed event history.
    pub fn calc_full_cnv(
        &self,
        phylogeny: &Phylogeny,
    ) -> Result<(AlleleProfile, AlleleProfile), CnSimError> {
        let weight = |layers: &[CnLayer]| -> Result<Vec<(u64, u64, f64)>, CnSimError> {
            layers
                .iter()
                .map(|l| {
                    let cluster = l
                        .event
                        .cluster
                        .ok_or(CnSimError::UnknownCluster(0))?;
                    let ccf = phylogeny.ccf(cluster)?;
                    Ok((l.start, l.end, l.event.cn_delta * ccf))
                })
                .collect()
        };

        let pat = AlleleProfile::new(flatten_layers(&weight(&self.paternal)?));
        let mat = AlleleProfile::new(flatten_layers(&weight(&self.maternal)?));
        Ok((pat, mat))
    }

    /// Reduce the two allele profiles to major/minor rows, re-cut at every
    /// boundary present in either allele.
    pub fn segment_table(&self, pat: &AlleleProfile, mat: &AlleleProfile) -> Vec<SegmentRow> {
        combine_profiles(pat, mat)
            .into_iter()
            .map(|(start, end, p, m)| SegmentRow {
                contig: self.name,
                start,
                end,
                major: p.max(m),
                minor: p.min(m),
            })
            .collect()
    }

    /// Reduce the two allele profiles to order-preserving paternal/maternal
    /// rows.
    pub fn phased_table(&self, pat: &AlleleProfile, mat: &AlleleProfile) -> Vec<PhasedRow> {
        combine_profiles(pat, mat)
            .into_iter()
            .map(|(start, end, p, m)| PhasedRow {
                contig: self.name,
                start,
                end,
                paternal: p,
                maternal: m,
            })
            .collect()
    }
}

/// Flatten overlapping layers into maximal constant-value runs.
///
/// Cuts the axis at every layer boundary, sums the deltas of the layers
/// covering each atomic piece, and merges adjacent pieces with equal sums.
/// Pieces covered by no layer are omitted.
fn flatten_layers(layers: &[(u64, u64, f64)]) -> Vec<CnSegment> {
    let mut bounds: Vec<u64> = layers.iter().flat_map(|&(s, e, _)| [s, e]).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut segments: Vec<CnSegment> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let mut total = 0.0;
        let mut covered = false;
        for &(ls, le, delta) in layers {
            if ls < end && le > start {
                total += delta;
                covered = true;
            }
        }
        if !covered {
            continue;
        }
        match segments.last_mut() {
            Some(last) if last.end == start && last.cn == total => last.end = end,
            _ => segments.push(CnSegment::new(start, end, total)),
        }
    }
    segments
}

/// Re-cut two allele profiles at the union of their boundaries and pair the
/// values per atomic segment, merging runs where both values repeat.
fn combine_profiles(pat: &AlleleProfile, mat: &AlleleProfile) -> Vec<(u64, u64, f64, f64)> {
    let mut bounds: Vec<u64> = pat
        .segments
        .iter()
        .chain(mat.segments.iter())
        .flat_map(|s| [s.start, s.end])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    let covered = |profile: &AlleleProfile, start: u64, end: u64| {
        profile
            .segments
            .iter()
            .any(|s| s.start < end && s.end > start)
    };

    let mut rows: Vec<(u64, u64, f64, f64)> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        if !covered(pat, start, end) && !covered(mat, start, end) {
            continue;
        }
        let p = pat.value_at(start);
        let m = mat.value_at(start);
        match rows.last_mut() {
            Some(last) if last.1 == start && last.2 == p && last.3 == m => last.1 = end,
            _ => rows.push((start, end, p, m)),
        }
    }
    rows
}
