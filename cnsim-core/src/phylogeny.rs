use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::Rng;

use crate::consts::MAX_LINEAGE_DEPTH;
use crate::errors::CnSimError;

/// Rooted tree of tumor subclones with cancer-cell fractions.
///
/// Cluster 1 is the truncal (root) clone with CCF 1; subclones get ids
/// starting at 2. By construction the CCFs of a cluster's direct children
/// never sum past the cluster's own CCF, so a subclone's descendant
/// population can never exceed its own prevalence.
#[derive(Debug, Clone)]
pub struct Phylogeny {
    pub num_subclones: usize,
    /// cluster -> parent cluster; the root maps to `None`.
    pub parents: HashMap<u32, Option<u32>>,
    /// cluster -> cancer-cell fraction in (0, 1].
    pub ccfs: HashMap<u32, f64>,
}

impl Phylogeny {
    /// Build a random phylogeny with `num_subclones` subclones.
    ///
    /// CCFs are drawn uniformly, sorted descending, and attached greedily:
    /// a FIFO queue of parents with remaining CCF budget adopts any
    /// still-unassigned cluster whose CCF fits the budget, scanning the
    /// pool in descending-CCF (insertion) order. Each adopted cluster is
    /// enqueued as a future parent. Because the pool is sorted descending,
    /// every adopted cluster can host the next one, so the queue never
    /// runs dry before the pool does.
    pub fn new(num_subclones: usize, rng: &mut StdRng) -> Self {
        let mut drawn: Vec<f64> = (0..num_subclones).map(|_| rng.gen::<f64>()).collect();
        drawn.sort_by(|a, b| b.total_cmp(a));

        let mut ccfs: HashMap<u32, f64> = HashMap::new();
        ccfs.insert(1, 1.0);
        for (i, ccf) in drawn.iter().enumerate() {
            ccfs.insert(i as u32 + 2, *ccf);
        }

        let mut parents: HashMap<u32, Option<u32>> = HashMap::new();
        parents.insert(1, None);

        let mut unassigned: VecDeque<u32> = (2..num_subclones as u32 + 2).collect();
        let mut parent_queue: VecDeque<u32> = VecDeque::from([1]);

        while !unassigned.is_empty() {
            let parent = match parent_queue.pop_front() {
                Some(p) => p,
                None => break,
            };
            let mut ccf_remaining = ccfs[&parent];
            let candidates: Vec<u32> = unassigned.iter().copied().collect();
            for cluster in candidates {
                if ccfs[&cluster] <= ccf_remaining {
                    unassigned.retain(|&c| c != cluster);
                    parent_queue.push_back(cluster);
                    parents.insert(cluster, Some(parent));
                    ccf_remaining -= ccfs[&cluster];
                }
            }
        }

        Self {
            num_subclones,
            parents,
            ccfs,
        }
    }

    /// Assemble a phylogeny from externally supplied parent/CCF maps.
    pub fn from_parts(parents: HashMap<u32, Option<u32>>, ccfs: HashMap<u32, f64>) -> Self {
        let num_subclones = parents.len().saturating_sub(1);
        Self {
            num_subclones,
            parents,
            ccfs,
        }
    }

    /// CCF of a cluster, or an error for an unknown id.
    pub fn ccf(&self, cluster: u32) -> Result<f64, CnSimError> {
        self.ccfs
            .get(&cluster)
            .copied()
            .ok_or(CnSimError::UnknownCluster(cluster))
    }

    /// Ancestor chain of a cluster, self first, root last, with CCFs.
    ///
    /// Construction cannot produce cycles, but externally assembled parent
    /// maps can; the walk is bounded and fails structurally past the bound.
    pub fn get_lineage(&self, cluster: u32) -> Result<(Vec<u32>, Vec<f64>), CnSimError> {
        let mut clusters = Vec::new();
        let mut node = Some(cluster);

        while let Some(current) = node {
            if clusters.len() >= MAX_LINEAGE_DEPTH {
                return Err(CnSimError::LineageDepthExceeded(MAX_LINEAGE_DEPTH));
            }
            clusters.push(current);
            node = *self
                .parents
                .get(&current)
                .ok_or(CnSimError::UnknownCluster(current))?;
        }

        let mut ccfs = Vec::with_capacity(clusters.len());
        for c in &clusters {
            ccfs.push(self.ccf(*c)?);
        }
        Ok((clusters, ccfs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn children_of(phylogeny: &Phylogeny, parent: u32) -> Vec<u32> {
        phylogeny
            .parents
            .iter()
            .filter(|(_, p)| **p == Some(parent))
            .map(|(c, _)| *c)
            .collect()
    }

    #[test]
    fn test_root_ccf_is_one() {
        let mut rng = StdRng::seed_from_u64(42);
        let phylogeny = Phylogeny::new(5, &mut rng);
        assert_eq!(phylogeny.ccfs[&1], 1.0);
        assert_eq!(phylogeny.parents[&1], None);
    }

    #[test]
    fn test_all_subclones_assigned() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let phylogeny = Phylogeny::new(8, &mut rng);
            assert_eq!(phylogeny.parents.len(), 9);
            assert_eq!(phylogeny.ccfs.len(), 9);
            for cluster in 2..10u32 {
                assert!(phylogeny.parents[&cluster].is_some());
            }
        }
    }

    #[test]
    fn test_children_ccf_sum_bounded() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let phylogeny = Phylogeny::new(10, &mut rng);
            for (&cluster, &ccf) in &phylogeny.ccfs {
                let child_sum: f64 = children_of(&phylogeny, cluster)
                    .iter()
                    .map(|c| phylogeny.ccfs[c])
                    .sum();
                assert!(
                    child_sum <= ccf + 1e-12,
                    "children of {} sum to {} > {}",
                    cluster,
                    child_sum,
                    ccf
                );
            }
        }
    }

    #[test]
    fn test_root_lineage() {
        let mut rng = StdRng::seed_from_u64(7);
        let phylogeny = Phylogeny::new(3, &mut rng);
        let (clusters, ccfs) = phylogeny.get_lineage(1).unwrap();
        assert_eq!(clusters, vec![1]);
        assert_eq!(ccfs, vec![1.0]);
    }

    #[test]
    fn test_lineage_order_self_to_root() {
        let mut rng = StdRng::seed_from_u64(11);
        let phylogeny = Phylogeny::new(6, &mut rng);
        for cluster in 2..8u32 {
            let (clusters, _) = phylogeny.get_lineage(cluster).unwrap();
            assert_eq!(*clusters.first().unwrap(), cluster);
            assert_eq!(*clusters.last().unwrap(), 1);
            // every adjacent pair is child -> parent
            for pair in clusters.windows(2) {
                assert_eq!(phylogeny.parents[&pair[0]], Some(pair[1]));
            }
        }
    }

    #[test]
    fn test_lineage_unknown_cluster() {
        let mut rng = StdRng::seed_from_u64(3);
        let phylogeny = Phylogeny::new(2, &mut rng);
        assert!(matches!(
            phylogeny.get_lineage(99),
            Err(CnSimError::UnknownCluster(99))
        ));
    }

    #[test]
    fn test_lineage_cycle_guard() {
        let mut parents = HashMap::new();
        parents.insert(1, None);
        parents.insert(2, Some(3));
        parents.insert(3, Some(2));
        let mut ccfs = HashMap::new();
        ccfs.insert(1, 1.0);
        ccfs.insert(2, 0.5);
        ccfs.insert(3, 0.4);
        let phylogeny = Phylogeny::from_parts(parents, ccfs);
        assert!(matches!(
            phylogeny.get_lineage(2),
            Err(CnSimError::LineageDepthExceeded(_))
        ));
    }

    #[test]
    fn test_zero_subclones() {
        let mut rng = StdRng::seed_from_u64(1);
        let phylogeny = Phylogeny::new(0, &mut rng);
        assert_eq!(phylogeny.ccfs.len(), 1);
        assert_eq!(phylogeny.parents.len(), 1);
        let (clusters, _) = phylogeny.get_lineage(1).unwrap();
        assert_eq!(clusters, vec![1]);
    }
}
