pub const CNSIM_CMD: &str = "cnsim";
pub const VERSION: &str = "0.1.0";

pub const DEFAULT_NUM_SUBCLONES: usize = 3;
pub const DEFAULT_MEDIAN_FOCAL_LENGTH: f64 = 1.8e6;

// arm-level event policy
pub const P_ARM_DELETION: f64 = 0.6;
pub const P_ARM_FULL_DELETION: f64 = 0.3;
pub const ARM_DELETION_ZERO_FRACTION_LIMIT: f64 = 0.3;

// focal event policy
pub const P_FOCAL_DELETION: f64 = 0.5;
pub const FOCAL_DELETION_LAMBDA_SCALE: f64 = 0.1;
pub const FOCAL_AMP_POISSON_MEAN: f64 = 0.8;

pub const PHASE_SWITCH_MEAN_LENGTH: f64 = 1e6;

pub const DEFAULT_COVERAGE_SIGMA: f64 = 1.0;

// guard for lineage walks over externally supplied parent maps
pub const MAX_LINEAGE_DEPTH: usize = 1024;

/// hg19 chromosome lengths, keyed by canonical contig (X = 23, Y = 24).
pub const DEFAULT_CHROM_SIZES: &[(u8, u64)] = &[
    (1, 249250621),
    (2, 243199373),
    (3, 198022430),
    (4, 191154276),
    (5, 180915260),
    (6, 171115067),
    (7, 159138663),
    (8, 146364022),
    (9, 141213431),
    (10, 135534747),
    (11, 135006516),
    (12, 133851895),
    (13, 115169878),
    (14, 107349540),
    (15, 102531392),
    (16, 90354753),
    (17, 81195210),
    (18, 78077248),
    (19, 59128983),
    (20, 63025520),
    (21, 48129895),
    (22, 51304566),
    (23, 156040895),
    (24, 57227415),
];
