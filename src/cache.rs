//! Binary cache of per-read candidate contigs.
//!
//! Candidate aggregation is deterministic for a fixed reference, LSH seed,
//! and read set, so its output can be stored once and reloaded to skip the
//! bucket-probing phase on reruns. A missing or malformed cache file is
//! fatal: silently recomputing (or worse, truncating) would make runs
//! incomparable.
//!
//! # Format (all fields little-endian)
//!
//! ```text
//! [4]  magic "VMC1"
//! u32  version
//! u64  read count
//! per read:
//!   u32  contig count
//!   per contig: u64 pos, u32 len, u8 strand, u16 n_table_hits
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::constants::{
    CACHE_BUF_SIZE, CACHE_MAGIC, CACHE_VERSION, MAX_CACHED_CONTIGS_PER_READ, MAX_CACHED_READS,
};
use crate::error::{MapError, Result};
use crate::types::{Contig, Strand};

fn strand_to_byte(strand: Strand) -> u8 {
    match strand {
        Strand::Forward => 0,
        Strand::ReverseComplement => 1,
    }
}

fn strand_from_byte(path: &Path, b: u8) -> Result<Strand> {
    match b {
        0 => Ok(Strand::Forward),
        1 => Ok(Strand::ReverseComplement),
        other => Err(MapError::format(
            path,
            format!("invalid strand byte: {}", other),
        )),
    }
}

/// Write all reads' candidate contigs to `path`.
pub fn store_contigs(path: &Path, contigs_per_read: &[Vec<Contig>]) -> Result<()> {
    let file =
        File::create(path).map_err(|e| MapError::io(path, "create contig cache", e))?;
    let mut w = BufWriter::with_capacity(CACHE_BUF_SIZE, file);
    let write_err = |e| MapError::io(path, "write contig cache", e);

    w.write_all(CACHE_MAGIC).map_err(write_err)?;
    w.write_all(&CACHE_VERSION.to_le_bytes()).map_err(write_err)?;
    w.write_all(&(contigs_per_read.len() as u64).to_le_bytes())
        .map_err(write_err)?;
    for contigs in contigs_per_read {
        w.write_all(&(contigs.len() as u32).to_le_bytes())
            .map_err(write_err)?;
        for c in contigs {
            w.write_all(&c.pos.to_le_bytes()).map_err(write_err)?;
            w.write_all(&c.len.to_le_bytes()).map_err(write_err)?;
            w.write_all(&[strand_to_byte(c.strand)]).map_err(write_err)?;
            w.write_all(&c.n_table_hits.to_le_bytes()).map_err(write_err)?;
        }
    }
    w.flush().map_err(write_err)?;
    info!(
        "stored contig cache for {} reads: {}",
        contigs_per_read.len(),
        path.display()
    );
    Ok(())
}

/// Load per-read candidate contigs from `path`.
pub fn load_contigs(path: &Path) -> Result<Vec<Vec<Contig>>> {
    let file = File::open(path).map_err(|e| MapError::io(path, "open contig cache", e))?;
    let mut r = BufReader::with_capacity(CACHE_BUF_SIZE, file);
    let read_err = |e| MapError::io(path, "read contig cache", e);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(read_err)?;
    if &magic != CACHE_MAGIC {
        return Err(MapError::format(path, "invalid magic bytes"));
    }
    let mut buf4 = [0u8; 4];
    r.read_exact(&mut buf4).map_err(read_err)?;
    let version = u32::from_le_bytes(buf4);
    if version != CACHE_VERSION {
        return Err(MapError::format(
            path,
            format!("unsupported version {} (expected {})", version, CACHE_VERSION),
        ));
    }
    let mut buf8 = [0u8; 8];
    r.read_exact(&mut buf8).map_err(read_err)?;
    let n_reads = u64::from_le_bytes(buf8);
    if n_reads > MAX_CACHED_READS {
        return Err(MapError::format(
            path,
            format!("read count {} exceeds sanity limit", n_reads),
        ));
    }
    let n_reads = n_reads as usize;

    let mut out = Vec::with_capacity(n_reads);
    for _ in 0..n_reads {
        r.read_exact(&mut buf4).map_err(read_err)?;
        let n_contigs = u32::from_le_bytes(buf4);
        if n_contigs > MAX_CACHED_CONTIGS_PER_READ {
            return Err(MapError::format(
                path,
                format!("contig count {} exceeds sanity limit", n_contigs),
            ));
        }
        let mut contigs = Vec::with_capacity(n_contigs as usize);
        for _ in 0..n_contigs {
            r.read_exact(&mut buf8).map_err(read_err)?;
            let pos = u64::from_le_bytes(buf8);
            r.read_exact(&mut buf4).map_err(read_err)?;
            let len = u32::from_le_bytes(buf4);
            let mut b = [0u8; 1];
            r.read_exact(&mut b).map_err(read_err)?;
            let strand = strand_from_byte(path, b[0])?;
            let mut buf2 = [0u8; 2];
            r.read_exact(&mut buf2).map_err(read_err)?;
            let n_table_hits = u16::from_le_bytes(buf2);
            contigs.push(Contig {
                pos,
                len,
                strand,
                n_table_hits,
            });
        }
        out.push(contigs);
    }
    info!("loaded contig cache for {} reads: {}", out.len(), path.display());
    Ok(out)
}
