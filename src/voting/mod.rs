//! Encrypted k-mer voting.
//!
//! Both backends consume the same inputs: the read's cipher sequence and one
//! candidate contig's `(offset, cipher)` pairs. Votes are cast into an array
//! of `contig_len + read_len` candidate alignment offsets, where index
//! `read_len` corresponds to offset 0 so that alignments starting before the
//! contig remain representable. The returned [`VoteTally`] carries offsets
//! relative to the contig start (possibly negative) and guarantees that best
//! and second-best refer to locations at least `delta_x * delta_inlier`
//! bases apart.

pub mod chaining;
pub mod windowed;

use crate::config::{MapperParams, VotingStrategy};
use crate::types::VoteTally;

/// Reusable per-thread buffers for the voting phase.
#[derive(Debug, Default)]
pub struct VotingWorkspace {
    /// Contig ciphers sorted by cipher value for binary search.
    sorted: Vec<(u64, u32)>,
    /// Vote weights per candidate offset.
    votes: Vec<i64>,
    /// Inclusive prefix sums over `votes`.
    prefix: Vec<i64>,
    /// `(contig_offset, read_pos)` match pairs (chaining backend).
    matches: Vec<(u32, u32)>,
}

impl VotingWorkspace {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Two offsets are considered the same location when they lie within the
/// separation tolerance of each other.
#[inline]
pub(crate) fn same_location(a: i64, b: i64, tolerance: i64) -> bool {
    (a - b).abs() <= tolerance
}

/// Sort contig ciphers by value and invoke `f(read_pos, contig_offset)` for
/// every match against a unique contig cipher.
///
/// Contig ciphers occurring more than once are skipped entirely: repeated
/// values cannot pin down an offset and would let one read k-mer vote for
/// several locations at once. Read-side repeats were already destroyed at
/// encryption time.
fn for_each_match<F: FnMut(u32, u32)>(
    read_ciphers: &[u64],
    contig_ciphers: &[(u32, u64)],
    sorted: &mut Vec<(u64, u32)>,
    mut f: F,
) {
    sorted.clear();
    sorted.extend(contig_ciphers.iter().map(|&(off, c)| (c, off)));
    sorted.sort_unstable();
    for (p, &c) in read_ciphers.iter().enumerate() {
        let start = sorted.partition_point(|&(v, _)| v < c);
        let end = start + sorted[start..].partition_point(|&(v, _)| v == c);
        if end - start == 1 {
            f(p as u32, sorted[start].1);
        }
    }
}

/// Tally votes for one candidate contig with the configured backend.
pub fn tally_votes(
    params: &MapperParams,
    read_ciphers: &[u64],
    contig_ciphers: &[(u32, u64)],
    contig_len: usize,
    read_len: usize,
    ws: &mut VotingWorkspace,
) -> VoteTally {
    if read_ciphers.is_empty() || contig_ciphers.is_empty() || contig_len == 0 {
        return VoteTally::default();
    }
    match params.strategy {
        VotingStrategy::Windowed => windowed::tally(
            read_ciphers,
            contig_ciphers,
            contig_len,
            read_len,
            params.k2,
            params.delta_inlier,
            params.delta_x,
            ws,
        ),
        VotingStrategy::Chaining => chaining::tally(
            read_ciphers,
            contig_ciphers,
            contig_len,
            read_len,
            params.k2,
            params.delta_inlier,
            params.delta_x,
            ws,
        ),
    }
}
