//! Static LSH bucket index over a reference sequence.
//!
//! Each of the `n_tables` LSH tables maps a projection key to a bucket of
//! `BucketEntry` records, stored contiguously in CSR layout and sorted by
//! `(hash, pos)` within each bucket so a query can binary-search to the first
//! entry carrying its projection hash.
//!
//! The index is built once per reference and is safe for concurrent lookup.

use log::info;

use crate::config::MapperParams;
use crate::core::fingerprint::{minhash_into, KmerMask};
use crate::projection::LshFunctions;

/// One indexed reference window within a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketEntry {
    /// Projection key of the window's fingerprint for this table.
    pub hash: u32,
    /// Reference offset of the window start.
    pub pos: u64,
    /// Window span in bases.
    pub len: u32,
}

/// CSR-packed buckets for all tables.
#[derive(Debug)]
pub struct BucketIndex {
    n_tables: usize,
    n_buckets: usize,
    bucket_offsets: Vec<usize>,
    entries: Vec<BucketEntry>,
    max_bucket_size: usize,
}

impl BucketIndex {
    /// Build the index by fingerprinting every reference window of
    /// `params.ref_window_size` bases (stride 1) and inserting one entry per
    /// table whose fingerprint is valid.
    pub fn build(
        ref_seq: &[u8],
        mask: &KmerMask,
        params: &MapperParams,
        funcs: &LshFunctions,
    ) -> Self {
        let w = params.ref_window_size;
        let mut keyed: Vec<(u32, BucketEntry)> = Vec::new();
        let mut scratch = Vec::new();
        let mut fingerprint = Vec::new();

        if ref_seq.len() >= w {
            for pos in 0..=(ref_seq.len() - w) {
                let window = &ref_seq[pos..pos + w];
                if !minhash_into(
                    window,
                    params.k,
                    mask,
                    funcs.scramblers(),
                    &mut scratch,
                    &mut fingerprint,
                ) {
                    continue;
                }
                for t in 0..params.n_tables {
                    let key = funcs.projection_key(t, &fingerprint);
                    let bid = (t * params.n_buckets + funcs.bucket_for(key)) as u32;
                    keyed.push((
                        bid,
                        BucketEntry {
                            hash: key,
                            pos: pos as u64,
                            len: w as u32,
                        },
                    ));
                }
            }
        }

        // CSR pack: order by bucket, then (hash, pos) within each bucket
        keyed.sort_unstable_by_key(|(bid, e)| (*bid, e.hash, e.pos));
        let total_buckets = params.n_tables * params.n_buckets;
        let mut bucket_offsets = vec![0usize; total_buckets + 1];
        for (bid, _) in &keyed {
            bucket_offsets[*bid as usize + 1] += 1;
        }
        for i in 0..total_buckets {
            bucket_offsets[i + 1] += bucket_offsets[i];
        }
        let entries: Vec<BucketEntry> = keyed.into_iter().map(|(_, e)| e).collect();

        info!(
            "bucket index built: {} entries across {} tables",
            entries.len(),
            params.n_tables
        );

        BucketIndex {
            n_tables: params.n_tables,
            n_buckets: params.n_buckets,
            bucket_offsets,
            entries,
            max_bucket_size: params.max_bucket_size,
        }
    }

    /// Assemble an index from pre-sorted per-bucket entry lists.
    ///
    /// Buckets are indexed `table * n_buckets + bucket`; each list must be
    /// sorted by `(hash, pos)`.
    pub fn from_buckets(
        n_tables: usize,
        n_buckets: usize,
        buckets: Vec<Vec<BucketEntry>>,
        max_bucket_size: usize,
    ) -> Self {
        assert_eq!(buckets.len(), n_tables * n_buckets);
        let mut bucket_offsets = Vec::with_capacity(buckets.len() + 1);
        bucket_offsets.push(0usize);
        let mut entries = Vec::new();
        for bucket in buckets {
            debug_assert!(bucket.windows(2).all(|w| (w[0].hash, w[0].pos) <= (w[1].hash, w[1].pos)));
            entries.extend(bucket);
            bucket_offsets.push(entries.len());
        }
        BucketIndex {
            n_tables,
            n_buckets,
            bucket_offsets,
            entries,
            max_bucket_size,
        }
    }

    /// Look up the bucket for `key` in `table`.
    ///
    /// Returns `None` when the bucket exceeds the configured size cutoff, in
    /// which case the caller must treat the table as "no match" for this
    /// read rather than scan an over-populated bucket.
    pub fn lookup(&self, table: usize, funcs: &LshFunctions, key: u32) -> Option<&[BucketEntry]> {
        debug_assert!(table < self.n_tables);
        let bid = table * self.n_buckets + funcs.bucket_for(key);
        let start = self.bucket_offsets[bid];
        let end = self.bucket_offsets[bid + 1];
        let bucket = &self.entries[start..end];
        if bucket.len() > self.max_bucket_size {
            return None;
        }
        Some(bucket)
    }

    pub fn n_tables(&self) -> usize {
        self.n_tables
    }

    /// Total number of indexed entries, across all tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
