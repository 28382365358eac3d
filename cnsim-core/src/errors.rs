use thiserror::Error;

#[derive(Error, Debug)]
pub enum CnSimError {
    #[error("Unrecognized contig name: {0}")]
    InvalidContig(String),

    #[error("Contig not present in the genome table: {0}")]
    UnknownContig(String),

    #[error("Unsupported table format: {0}")]
    UnsupportedTable(String),

    #[error("Unknown cluster id: {0}")]
    UnknownCluster(u32),

    #[error("Lineage walk exceeded {0} ancestors; parent map is malformed")]
    LineageDepthExceeded(usize),

    #[error("Degenerate interval: [{start}, {end})")]
    DegenerateInterval { start: u64, end: u64 },

    #[error("CNV profile has not been computed; call calculate_cnv_profile first")]
    ProfileNotComputed,

    #[error("Invalid distribution parameter: {0}")]
    InvalidDistribution(String),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
