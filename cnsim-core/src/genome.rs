use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::consts::DEFAULT_CHROM_SIZES;
use crate::errors::CnSimError;

/// Get a reader for either a gzip'd or non-gzip'd file.
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Parse a contig name into its canonical numeric key.
///
/// Accepts an optional `chr` prefix followed by `1..=24`, `X` or `Y`.
/// X maps to 23 and Y to 24. Anything else is rejected rather than guessed.
pub fn parse_contig(name: &str) -> Result<u8, CnSimError> {
    let stripped = name.strip_prefix("chr").unwrap_or(name);
    match stripped {
        "X" | "x" => Ok(23),
        "Y" | "y" => Ok(24),
        other => match other.parse::<u8>() {
            Ok(n) if (1..=24).contains(&n) => Ok(n),
            _ => Err(CnSimError::InvalidContig(name.to_string())),
        },
    }
}

/// Display name for a canonical contig key (numeric, X/Y already folded in).
pub fn contig_name(key: u8) -> String {
    key.to_string()
}

/// Compiled-in hg19 chromosome lengths.
pub fn default_chrom_sizes() -> BTreeMap<u8, u64> {
    DEFAULT_CHROM_SIZES.iter().copied().collect()
}

/// Centromere fallback: the geometric midpoint of each contig.
pub fn default_centromeres(csize: &BTreeMap<u8, u64>) -> BTreeMap<u8, u64> {
    csize.iter().map(|(&k, &len)| (k, len / 2)).collect()
}

/// Read a chromosome-size table.
///
/// A `.bed` extension selects three-column parsing (`contig`, `start`,
/// `length`); anything else is parsed as two columns (`contig`, `length`).
/// Transparent to gzip. Unrecognized contig names fail the whole read.
pub fn read_chrom_sizes(path: &Path) -> Result<BTreeMap<u8, u64>> {
    let is_bed = path
        .to_str()
        .map(|p| p.trim_end_matches(".gz").ends_with(".bed"))
        .unwrap_or(false);
    let length_col = if is_bed { 2 } else { 1 };

    let reader = get_dynamic_reader(path)?;
    let mut sizes = BTreeMap::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= length_col {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has {} fields (expected at least {})",
                line_num + 1,
                path,
                fields.len(),
                length_col + 1
            ))
            .into());
        }
        let contig = parse_contig(fields[0])?;
        let length: u64 = fields[length_col]
            .parse()
            .with_context(|| format!("Invalid length on line {} of {:?}", line_num + 1, path))?;
        sizes.insert(contig, length);
    }
    if sizes.is_empty() {
        return Err(CnSimError::UnsupportedTable(format!("no rows in {:?}", path)).into());
    }
    Ok(sizes)
}

/// Read a two-column centromere-position table (`contig`, `position`).
pub fn read_centromeres(path: &Path) -> Result<BTreeMap<u8, u64>> {
    let reader = get_dynamic_reader(path)?;
    let mut positions = BTreeMap::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(CnSimError::UnsupportedTable(format!(
                "line {} of {:?} has {} fields (expected 2)",
                line_num + 1,
                path,
                fields.len()
            ))
            .into());
        }
        let contig = parse_contig(fields[0])?;
        let pos: u64 = fields[1]
            .parse()
            .with_context(|| format!("Invalid position on line {} of {:?}", line_num + 1, path))?;
        positions.insert(contig, pos);
    }
    if positions.is_empty() {
        return Err(CnSimError::UnsupportedTable(format!("no rows in {:?}", path)).into());
    }
    Ok(positions)
}
