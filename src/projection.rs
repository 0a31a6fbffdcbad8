//! Per-table sketch projections of minhash fingerprints.
//!
//! Each LSH table selects a fixed subset of fingerprint entries and folds
//! them into a projection key. The key doubles as the `hash` stored in
//! bucket entries and, reduced modulo the bucket count, as the bucket id.
//! The whole family is generated deterministically from a seed so that the
//! index builder and every query agree.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::config::MapperParams;

const KEY_FOLD_MULT: u32 = 0x9E37_79B1;
const BUCKET_HASH_MULT: u64 = 0x517C_C1B7_2722_0A95;

/// Deterministic LSH function family: minhash scramblers plus per-table
/// projection index sets.
#[derive(Debug, Clone)]
pub struct LshFunctions {
    /// One multiplicative scrambler per minhash function (always odd).
    scramblers: Vec<u32>,
    /// `n_tables * proj_len` indices into the fingerprint vector.
    proj_indices: Vec<usize>,
    proj_len: usize,
    n_buckets: usize,
}

impl LshFunctions {
    /// Generate the function family from `params.lsh_seed`.
    pub fn generate(params: &MapperParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.lsh_seed);
        let scramblers: Vec<u32> = (0..params.h).map(|_| rng.gen::<u32>() | 1).collect();
        let mut proj_indices = Vec::with_capacity(params.n_tables * params.proj_len);
        for _ in 0..params.n_tables {
            let mut picks: Vec<usize> = sample(&mut rng, params.h, params.proj_len).into_vec();
            picks.sort_unstable();
            proj_indices.extend(picks);
        }
        LshFunctions {
            scramblers,
            proj_indices,
            proj_len: params.proj_len,
            n_buckets: params.n_buckets,
        }
    }

    pub fn scramblers(&self) -> &[u32] {
        &self.scramblers
    }

    /// Fold the selected fingerprint entries of `table` into a projection key.
    pub fn projection_key(&self, table: usize, fingerprint: &[u32]) -> u32 {
        let base = table * self.proj_len;
        let mut key: u32 = 0;
        for &idx in &self.proj_indices[base..base + self.proj_len] {
            key = key.wrapping_mul(KEY_FOLD_MULT).wrapping_add(fingerprint[idx]);
        }
        key
    }

    /// Map a projection key to a bucket id within one table.
    pub fn bucket_for(&self, key: u32) -> usize {
        ((key as u64).wrapping_mul(BUCKET_HASH_MULT) >> 32) as usize % self.n_buckets
    }

    pub fn n_buckets(&self) -> usize {
        self.n_buckets
    }
}
