//! Voting k-mer ciphers.
//!
//! Voting never compares plaintext k-mers. Each read task draws a fresh key
//! pair and both the read k-mers and the candidate reference k-mers are
//! mapped through `cipher(h) = (h ^ xor_pad) * mult_pad`; equality of ciphers
//! is equivalent to equality of the underlying hashes, so vote counting works
//! unchanged on the masked values.
//!
//! Reference k-mer hashes are precomputed once per reference together with
//! repeat annotations, so per-contig encryption is a table walk.

use rand::Rng;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

use crate::config::CipherHashKind;
use crate::core::encoding::is_unambiguous;
use crate::types::Contig;

/// Per-task cipher key pair. `mult_pad` is kept odd so the multiplication is
/// invertible mod 2^64 and distinct hashes stay distinct.
#[derive(Debug, Clone, Copy)]
pub struct VoteKeys {
    xor_pad: u64,
    mult_pad: u64,
}

impl VoteKeys {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        VoteKeys {
            xor_pad: rng.gen::<u64>(),
            mult_pad: rng.gen::<u64>() | 1,
        }
    }

    #[inline]
    pub fn cipher(&self, hash: u64) -> u64 {
        (hash ^ self.xor_pad).wrapping_mul(self.mult_pad)
    }
}

/// Hash one voting k-mer. Returns `None` when the k-mer contains an
/// ambiguous base.
#[inline]
fn kmer_hash(kmer: &[u8], kind: CipherHashKind) -> Option<u64> {
    if !kmer.iter().all(|&b| is_unambiguous(b)) {
        return None;
    }
    let h = match kind {
        CipherHashKind::Fast => xxh3_64(kmer),
        CipherHashKind::Crypto => {
            let digest = Sha256::digest(kmer);
            u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ])
        }
    };
    Some(h)
}

/// Encrypt every k2-mer of a read.
///
/// Ambiguous positions receive fresh random ciphers so they can never match
/// a reference cipher. K-mers repeated within the read are uninformative for
/// offset voting and leak read structure, so every occurrence of a repeated
/// cipher is destroyed the same way.
pub fn encrypt_read<R: Rng>(
    seq: &[u8],
    k2: usize,
    kind: CipherHashKind,
    keys: &VoteKeys,
    rng: &mut R,
) -> Vec<u64> {
    if seq.len() < k2 {
        return Vec::new();
    }
    let mut ciphers: Vec<u64> = seq
        .windows(k2)
        .map(|kmer| match kmer_hash(kmer, kind) {
            Some(h) => keys.cipher(h),
            None => rng.gen::<u64>(),
        })
        .collect();

    // Destroy repeats: sort (cipher, position), rewrite every group of
    // identical ciphers with independent randoms
    let mut by_value: Vec<(u64, usize)> =
        ciphers.iter().copied().enumerate().map(|(i, c)| (c, i)).collect();
    by_value.sort_unstable();
    let mut i = 0;
    while i < by_value.len() {
        let mut j = i + 1;
        while j < by_value.len() && by_value[j].0 == by_value[i].0 {
            j += 1;
        }
        if j - i > 1 {
            for &(_, pos) in &by_value[i..j] {
                ciphers[pos] = rng.gen::<u64>();
            }
        }
        i = j;
    }
    ciphers
}

/// Precomputed per-position voting hashes for a whole reference.
#[derive(Debug)]
pub struct RefCiphers {
    k2: usize,
    /// Hash of the k2-mer starting at each position; 0 marks ambiguous.
    hashes: Vec<u64>,
    /// Distance back to the previous occurrence of the same hash, saturated
    /// to u16; 0 means no earlier occurrence.
    repeat_dist: Vec<u16>,
}

impl RefCiphers {
    /// Hash every k2-mer of the reference and annotate repeats.
    pub fn precompute(ref_seq: &[u8], k2: usize, kind: CipherHashKind) -> Self {
        let n = ref_seq.len().saturating_sub(k2 - 1);
        let mut hashes = vec![0u64; n];
        let mut repeat_dist = vec![0u16; n];
        for (pos, kmer) in ref_seq.windows(k2).enumerate() {
            if let Some(h) = kmer_hash(kmer, kind) {
                // Hash 0 is reserved as the ambiguity marker
                hashes[pos] = if h == 0 { 1 } else { h };
            }
        }

        let mut by_value: Vec<(u64, usize)> = hashes
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, h)| h != 0)
            .map(|(i, h)| (h, i))
            .collect();
        by_value.sort_unstable();
        for pair in by_value.windows(2) {
            let (h0, p0) = pair[0];
            let (h1, p1) = pair[1];
            if h0 == h1 {
                repeat_dist[p1] = (p1 - p0).min(u16::MAX as usize) as u16;
            }
        }

        RefCiphers {
            k2,
            hashes,
            repeat_dist,
        }
    }

    pub fn k2(&self) -> usize {
        self.k2
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Encrypt one candidate contig's k-mers into `out` as
    /// `(offset_in_contig, cipher)` pairs.
    ///
    /// Positions are sampled every `sampling_intv` bases. Ambiguous positions
    /// and positions whose k-mer already occurred earlier in the same contig
    /// are skipped; the latter would vote the same offset twice and mirror
    /// the repeat destruction applied to reads.
    pub fn encrypt_contig(
        &self,
        contig: &Contig,
        keys: &VoteKeys,
        sampling_intv: usize,
        out: &mut Vec<(u32, u64)>,
    ) {
        out.clear();
        let start = contig.pos as usize;
        if start >= self.hashes.len() {
            return;
        }
        let end = (start + contig.len as usize).min(self.hashes.len());
        let mut pos = start;
        while pos < end {
            let h = self.hashes[pos];
            let d = self.repeat_dist[pos] as usize;
            if h != 0 && (d == 0 || pos - d < start) {
                out.push(((pos - start) as u32, keys.cipher(h)));
            }
            pos += sampling_intv;
        }
    }
}
