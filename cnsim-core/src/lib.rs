//! # Cnsim: Clonal Copy-Number Profile Simulation Module
//!
//! A module for synthesizing plausible tumor copy-number profiles by
//! simulating clonal evolution: a subclone phylogeny with cancer-cell
//! fractions (CCFs) and a per-chromosome, per-allele layered history of
//! copy-number events.
//!
//! ## Overview
//!
//! Cnsim builds ground-truth-labeled inputs for benchmarking genomic
//! analysis pipelines. It's designed for:
//! - Benchmarking CNV callers and purity/ploidy estimators
//! - Testing allele-specific and phased copy-number pipelines
//! - Generating coverage and het-site allele counts with known truth
//!
//! ## Key Features
//!
//! - **Lineage-aware event layering** - every new event reads the state
//!   already committed along its subclone's ancestor chain
//! - **CCF-weighted aggregation** - the layered history collapses into
//!   expected per-base copy number under subclonal heterogeneity
//! - **Arm-level and focal events** - centromere-split arm events plus
//!   exponentially sized focal events
//! - **Coverage and SNV synthesis** - ploidy-scaled binned coverage and
//!   phase-switch-aware het-site allele counts
//!
//! ## Example
//!
//! ```rust,ignore
//! use cnsim_core::CnvProfile;
//!
//! let mut profile = CnvProfile::new(3, Some(42)); // 3 subclones, seeded
//! profile.add_cnv_events(10, 30, 0.6, 0.5, 1.8e6)?;
//! profile.calculate_cnv_profile()?;
//! profile.write_seg_table("segments.tsv".as_ref())?;
//! ```
//!
//! ## Module Structure
//!
//! - [`models`] - Core data structures (events, layers, segments, config)
//! - [`phylogeny`] - Greedy CCF phylogeny and lineage queries
//! - [`chromosome`] - Dual-allele layer ledgers and aggregation
//! - [`profile`] - Event-generation policies and export
//! - [`genome`] - Contig canonicalization and size/centromere tables
//! - [`coverage`] - Binned-coverage synthesis
//! - [`snv`] - Het-site allele-count synthesis

pub mod chromosome;
pub mod consts;
pub mod coverage;
pub mod errors;
pub mod genome;
pub mod models;
pub mod phylogeny;
pub mod profile;
pub mod snv;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chromosome::Chromosome;
pub use coverage::{CoverageBin, CoverageRecord};
pub use errors::CnSimError;
pub use models::{
    Allele, AlleleProfile, CnEvent, CnLayer, CnSegment, EventKind, PhasedRow, SegmentRow,
    SimulationConfig,
};
pub use phylogeny::Phylogeny;
pub use profile::{ArmOp, CnvProfile, FocalOp};
pub use snv::{HetSite, PhaseSwitchTrack, SnvRecord};
pub use consts::CNSIM_CMD;
