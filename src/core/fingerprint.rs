//! Fingerprint generation over k-mer windows.
//!
//! Converts a nucleotide sequence into compact numeric fingerprints used for
//! LSH bucketing and coarse similarity comparison:
//! - **minhash**: per hash function, the minimum scrambled k-mer hash over
//!   all valid windows (the fingerprint vector used for bucket projection)
//! - **simhash**: bit-wise majority vote over 64-bit k-mer hashes
//!
//! A window is valid when it contains no ambiguous base and its packed
//! encoding is absent from the high-frequency k-mer mask. A sequence with at
//! most `2*k` valid windows carries too little information and fails
//! fingerprinting.

use xxhash_rust::xxh3::xxh3_64;
use xxhash_rust::xxh32::xxh32;

use super::encoding::pack_kmer;
use crate::constants::{MIN_VALID_KMER_FACTOR, SIMHASH_BITLEN};

/// Seed for the 32-bit k-mer hash feeding minhash.
const KMER_HASH_SEED: u32 = 0;

/// Sorted set of high-frequency packed k-mers to exclude from fingerprints.
///
/// Construction of the underlying k-mer frequency histogram is external;
/// this type only consumes `(packed_kmer, count)` pairs.
#[derive(Debug, Clone)]
pub struct KmerMask {
    k: usize,
    packed: Vec<u32>,
}

impl KmerMask {
    /// An empty mask (no k-mer is excluded).
    pub fn empty(k: usize) -> Self {
        KmerMask { k, packed: Vec::new() }
    }

    /// Build a mask from histogram entries, keeping k-mers with
    /// `count > max_count`.
    pub fn from_counts(k: usize, counts: impl IntoIterator<Item = (u32, u32)>, max_count: u32) -> Self {
        let mut packed: Vec<u32> = counts
            .into_iter()
            .filter(|&(_, count)| count > max_count)
            .map(|(kmer, _)| kmer)
            .collect();
        packed.sort_unstable();
        packed.dedup();
        KmerMask { k, packed }
    }

    /// Build a mask directly from a set of packed k-mers.
    pub fn from_kmers(k: usize, kmers: impl IntoIterator<Item = u32>) -> Self {
        let mut packed: Vec<u32> = kmers.into_iter().collect();
        packed.sort_unstable();
        packed.dedup();
        KmerMask { k, packed }
    }

    /// K-mer length this mask applies to.
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn contains(&self, packed_kmer: u32) -> bool {
        self.packed.binary_search(&packed_kmer).is_ok()
    }

    /// Number of masked k-mers.
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }
}

/// Collect the 32-bit hashes of every valid k-mer window into `out`.
///
/// Windows with ambiguous bases or masked packed encodings are skipped.
/// Returns the number of valid windows.
pub(crate) fn collect_valid_kmer_hashes(
    seq: &[u8],
    k: usize,
    mask: &KmerMask,
    out: &mut Vec<u32>,
) -> usize {
    out.clear();
    if seq.len() < k {
        return 0;
    }
    for window in seq.windows(k) {
        let packed = match pack_kmer(window) {
            Some(p) => p,
            None => continue,
        };
        if mask.contains(packed) {
            continue;
        }
        out.push(xxh32(window, KMER_HASH_SEED));
    }
    out.len()
}

/// Minimum of `a * v` (wrapping) over all values, scalar path.
#[inline]
pub(crate) fn scrambled_min_scalar(values: &[u32], a: u32) -> u32 {
    let mut min = u32::MAX;
    for &v in values {
        let p = a.wrapping_mul(v);
        if p < min {
            min = p;
        }
    }
    min
}

/// Minimum of `a * v` (wrapping) over all values, four lanes at a time.
///
/// Must produce the exact same minimum as [`scrambled_min_scalar`]; only the
/// minimum value matters, not which window produced it.
#[inline]
pub(crate) fn scrambled_min_batched(values: &[u32], a: u32) -> u32 {
    let mut lanes = [u32::MAX; 4];
    let chunks = values.chunks_exact(4);
    let remainder = chunks.remainder();
    for chunk in chunks {
        lanes[0] = lanes[0].min(a.wrapping_mul(chunk[0]));
        lanes[1] = lanes[1].min(a.wrapping_mul(chunk[1]));
        lanes[2] = lanes[2].min(a.wrapping_mul(chunk[2]));
        lanes[3] = lanes[3].min(a.wrapping_mul(chunk[3]));
    }
    let mut min = lanes[0].min(lanes[1]).min(lanes[2].min(lanes[3]));
    for &v in remainder {
        min = min.min(a.wrapping_mul(v));
    }
    min
}

/// Compute the minhash fingerprint vector of a sequence.
///
/// `scramblers` holds one multiplicative constant per hash function; the
/// output vector has the same length. `scratch` is a reusable buffer for the
/// valid k-mer hashes.
///
/// Returns false (leaving `out` untouched beyond resizing) when fewer than
/// `2*k` valid windows remain.
pub fn minhash_into(
    seq: &[u8],
    k: usize,
    mask: &KmerMask,
    scramblers: &[u32],
    scratch: &mut Vec<u32>,
    out: &mut Vec<u32>,
) -> bool {
    let n_valid = collect_valid_kmer_hashes(seq, k, mask, scratch);
    out.clear();
    out.resize(scramblers.len(), u32::MAX);
    if n_valid <= MIN_VALID_KMER_FACTOR * k {
        return false;
    }
    for (h, &a) in scramblers.iter().enumerate() {
        out[h] = scrambled_min_batched(scratch, a);
    }
    true
}

/// Compute the simhash fingerprint of a sequence.
///
/// Each valid k-mer's 64-bit hash contributes +1/-1 per bit position; final
/// bit `b` is set iff the accumulator at `b` is non-negative. Returns `None`
/// when fewer than `2*k` valid windows remain.
pub fn simhash(seq: &[u8], k: usize, mask: &KmerMask) -> Option<u64> {
    if seq.len() < k {
        return None;
    }
    let mut acc = [0i32; SIMHASH_BITLEN];
    let mut n_valid = 0usize;
    for window in seq.windows(k) {
        let packed = match pack_kmer(window) {
            Some(p) => p,
            None => continue,
        };
        if mask.contains(packed) {
            continue;
        }
        n_valid += 1;
        let hash = xxh3_64(window);
        for (b, slot) in acc.iter_mut().enumerate() {
            if (hash >> b) & 1 == 1 {
                *slot += 1;
            } else {
                *slot -= 1;
            }
        }
    }
    if n_valid <= MIN_VALID_KMER_FACTOR * k {
        return None;
    }
    let mut fp = 0u64;
    for (b, &v) in acc.iter().enumerate() {
        if v >= 0 {
            fp |= 1u64 << b;
        }
    }
    Some(fp)
}
