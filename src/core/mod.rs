//! Core algorithms for fingerprint-based sequence matching.
//!
//! This module contains the leaf algorithms used throughout veilmap:
//! - Nucleotide encoding and packing utilities
//! - Minhash/simhash fingerprint generation
//! - An array-backed min-heap for multi-way bucket merging

pub mod encoding;
pub mod fingerprint;
pub mod heap;

// Re-export commonly used items at the core module level
pub use encoding::{hamming_dist, pack_kmer, reverse_complement};
pub use fingerprint::{minhash_into, simhash, KmerMask};
pub use heap::MinHeap;
