//! Constants used throughout the veilmap library for tuning limits and
//! binary format definitions.
//!
//! Centralizing these ensures the aggregation, voting, and cache layers stay
//! consistent when values are adjusted.

// ============================================================================
// Candidate aggregation
// ============================================================================

/// Fixed symmetric padding (in bases) applied around a merged contig before
/// voting, to tolerate boundary effects of the LSH windows.
pub(crate) const CONTIG_PADDING: usize = 50;

/// Buckets larger than this are treated as "no match" for the probing table;
/// over-populated buckets would degrade the merge to a near-linear scan.
pub(crate) const DEFAULT_MAX_BUCKET_SIZE: usize = 1000;

/// Hard cap on the number of LSH tables (bounds the distinct-hit bitset).
pub(crate) const N_TABLES_MAX: usize = 1024;

/// Initial capacity for a read's candidate contig list.
pub(crate) const CONTIGS_SOFT_CAP: usize = 10;

// ============================================================================
// Fingerprinting
// ============================================================================

/// A fingerprint is rejected unless more than `MIN_VALID_KMER_FACTOR * k`
/// valid windows survive masking; too little informative sequence remains
/// otherwise.
pub(crate) const MIN_VALID_KMER_FACTOR: usize = 2;

/// Bit length of a simhash fingerprint.
pub(crate) const SIMHASH_BITLEN: usize = 64;

// ============================================================================
// Voting
// ============================================================================

/// Separation window (bases) used when deciding whether a new candidate
/// position is a genuinely distinct location from the current best.
pub(crate) const BEST_SEPARATION_WINDOW: u64 = 30;

// ============================================================================
// Contig cache binary format
// ============================================================================

/// Magic bytes for precomputed contig cache files (.vmc).
pub(crate) const CACHE_MAGIC: &[u8; 4] = b"VMC1";

/// Current contig cache format version.
pub(crate) const CACHE_VERSION: u32 = 1;

/// Buffer size for cache reads/writes (8MB).
pub(crate) const CACHE_BUF_SIZE: usize = 8 * 1024 * 1024;

/// Upper bound on contigs per read accepted when loading a cache file;
/// guards against truncated or corrupt headers.
pub(crate) const MAX_CACHED_CONTIGS_PER_READ: u32 = 10_000_000;

/// Upper bound on the read count accepted from a cache file header; a
/// corrupt count must error out before any preallocation.
pub(crate) const MAX_CACHED_READS: u64 = 10_000_000;
