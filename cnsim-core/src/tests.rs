#[cfg(test)]
mod tests {
    use crate::models::*;
    use crate::profile::{ArmOp, CnvProfile, FocalOp};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn small_genome() -> BTreeMap<u8, u64> {
        let mut csize = BTreeMap::new();
        csize.insert(1u8, 10_000_000u64);
        csize.insert(2u8, 5_000_000u64);
        csize
    }

    #[test]
    fn test_untouched_profile_is_diploid() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        profile.calculate_cnv_profile().unwrap();

        let rows = profile.segment_table().unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let length = profile.csize[&row.contig];
            assert_eq!((row.start, row.end), (1, length));
            assert_eq!((row.major, row.minor), (1.0, 1.0));
        }
    }

    #[test]
    fn test_truncal_full_deletion_zeroes_target_allele() {
        let mut profile = CnvProfile::with_genome(2, small_genome(), None, Some(42));
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Paternal, 1, ArmOp::DeleteFull)
            .unwrap();
        profile.calculate_cnv_profile().unwrap();

        let (pat, mat) = &profile.cnv_profiles().unwrap()[&1];
        // root CCF is 1, so the weighted paternal value drops to 0 everywhere
        for pos in [1u64, 5_000_000, 9_999_999] {
            assert_eq!(pat.value_at(pos), 0.0);
            assert_eq!(mat.value_at(pos), 1.0);
        }
        // untouched contig unchanged on both alleles
        let (pat2, mat2) = &profile.cnv_profiles().unwrap()[&2];
        assert_eq!(pat2.value_at(100), 1.0);
        assert_eq!(mat2.value_at(100), 1.0);
    }

    #[test]
    fn test_arm_deletion_suppressed_when_reference_lost() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        // wipe out the maternal allele first
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Maternal, 1, ArmOp::DeleteFull)
            .unwrap();
        // a paternal deletion must now be suppressed by the reference check
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Paternal, 1, ArmOp::DeleteOne)
            .unwrap();
        profile.calculate_cnv_profile().unwrap();

        let (pat, mat) = &profile.cnv_profiles().unwrap()[&1];
        assert_eq!(pat.value_at(500), 1.0);
        assert_eq!(mat.value_at(500), 0.0);
    }

    #[test]
    fn test_zero_floor_under_arm_events() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Paternal, 1, ArmOp::DeleteFull)
            .unwrap();
        // amplification doubles the current level; 0 stays 0
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Paternal, 1, ArmOp::Amplify)
            .unwrap();
        profile.calculate_cnv_profile().unwrap();

        let (pat, _) = &profile.cnv_profiles().unwrap()[&1];
        assert_eq!(pat.value_at(500), 0.0);
    }

    #[test]
    fn test_zero_floor_under_focal_events() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        profile
            .apply_arm_event(1, 1, 10_000_000, Allele::Maternal, 1, ArmOp::DeleteFull)
            .unwrap();
        profile
            .apply_focal_event(
                1,
                1000,
                2000,
                Allele::Maternal,
                1,
                FocalOp::Amplify { gain: 3.0 },
            )
            .unwrap();
        profile
            .apply_focal_event(1, 1000, 2000, Allele::Maternal, 1, FocalOp::Delete)
            .unwrap();
        profile.calculate_cnv_profile().unwrap();

        let (_, mat) = &profile.cnv_profiles().unwrap()[&1];
        assert_eq!(mat.value_at(1500), 0.0);
    }

    #[test]
    fn test_focal_single_copy_deletion() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        // at level 1 the deletion amount is always max(1, 1 - Poisson) = 1
        profile
            .apply_focal_event(1, 1000, 2000, Allele::Paternal, 1, FocalOp::Delete)
            .unwrap();
        profile.calculate_cnv_profile().unwrap();

        let (pat, _) = &profile.cnv_profiles().unwrap()[&1];
        assert_eq!(pat.value_at(1500), 0.0);
        assert_eq!(pat.value_at(999), 1.0);
        assert_eq!(pat.value_at(2000), 1.0);
    }

    #[test]
    fn test_sibling_events_are_invisible() {
        // with one subclone per branch, the phylogeny is 1 -> {2, 3} for
        // many seeds; find one where 2 and 3 are siblings
        let mut profile = None;
        for seed in 0..200 {
            let candidate = CnvProfile::with_genome(2, small_genome(), None, Some(seed));
            if candidate.phylogeny.parents[&2] == Some(1)
                && candidate.phylogeny.parents[&3] == Some(1)
            {
                profile = Some(candidate);
                break;
            }
        }
        let mut profile = profile.expect("no sibling phylogeny found in 200 seeds");

        // cluster 2 amplifies; cluster 3 must not see it
        profile
            .apply_focal_event(
                1,
                1000,
                2000,
                Allele::Paternal,
                2,
                FocalOp::Amplify { gain: 2.0 },
            )
            .unwrap();
        let (pat, _) = profile.chromosomes[&1]
            .calc_current_lineage_cn(1000, 2000, 3, &profile.phylogeny)
            .unwrap();
        assert_eq!(pat, vec![CnSegment::new(1000, 2000, 1.0)]);

        // while cluster 2's own lineage does see it
        let (pat, _) = profile.chromosomes[&1]
            .calc_current_lineage_cn(1000, 2000, 2, &profile.phylogeny)
            .unwrap();
        assert_eq!(pat, vec![CnSegment::new(1000, 2000, 3.0)]);
    }

    #[test]
    fn test_generation_only_appends_layers() {
        let mut profile = CnvProfile::with_genome(2, small_genome(), None, Some(42));
        profile.add_cnv_events(4, 6, 0.6, 0.5, 1.8e5).unwrap();
        // aggregation has not run yet
        assert!(profile.cnv_profiles().is_err());

        profile.calculate_cnv_profile().unwrap();
        assert!(profile.cnv_profiles().is_ok());
    }

    #[test]
    fn test_randomized_generation_preserves_floor() {
        for seed in 0..10 {
            let mut profile = CnvProfile::with_genome(3, small_genome(), None, Some(seed));
            profile.add_cnv_events(6, 12, 0.5, 0.5, 2.0e5).unwrap();

            // lineage-visible levels never go negative for any cluster
            for cluster in 1..5u32 {
                for (&contig, chromosome) in &profile.chromosomes {
                    let (pat, mat) = chromosome
                        .calc_current_lineage_cn(
                            1,
                            profile.csize[&contig],
                            cluster,
                            &profile.phylogeny,
                        )
                        .unwrap();
                    for seg in pat.iter().chain(mat.iter()) {
                        assert!(
                            seg.cn >= 0.0,
                            "negative level {} at [{}, {}) for cluster {}",
                            seg.cn,
                            seg.start,
                            seg.end,
                            cluster
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let run = |seed: u64| {
            let mut profile = CnvProfile::with_genome(2, small_genome(), None, Some(seed));
            profile.add_cnv_events(4, 8, 0.6, 0.5, 1.8e5).unwrap();
            profile.calculate_cnv_profile().unwrap();
            profile.segment_table().unwrap()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_extension_hooks_unimplemented() {
        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(1));
        assert!(profile.add_wgd().is_err());
        assert!(profile.add_chromothripsis().is_err());
        assert!(profile.add_cn_loh().is_err());
    }

    #[test]
    fn test_write_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        let seg_path = dir.path().join("segments.tsv");
        let phased_path = dir.path().join("phased.tsv");

        let mut profile = CnvProfile::with_genome(0, small_genome(), None, Some(42));
        profile.calculate_cnv_profile().unwrap();
        profile.write_seg_table(&seg_path).unwrap();
        profile.write_phased_table(&phased_path).unwrap();

        let seg = std::fs::read_to_string(&seg_path).unwrap();
        let mut lines = seg.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Chromosome\tStart.bp\tEnd.bp\tmajor\tminor"
        );
        assert_eq!(lines.next().unwrap(), "1\t1\t10000000\t1\t1");
        assert_eq!(lines.next().unwrap(), "2\t1\t5000000\t1\t1");

        let phased = std::fs::read_to_string(&phased_path).unwrap();
        assert!(phased.starts_with("Chromosome\tStart.bp\tEnd.bp\tpaternal\tmaternal"));
    }
}
