//! veilmap: privacy-preserving approximate short-read mapping.
//!
//! Reads are mapped against a reference without ever comparing plaintext
//! k-mers during vote counting. The pipeline has two phases:
//!
//! 1. **Candidate aggregation**: minhash fingerprints of each read strand
//!    probe a set of LSH tables over reference windows; overlapping bucket
//!    hits are merged into padded candidate contigs.
//! 2. **Encrypted voting**: the read's and each candidate's k-mers are
//!    mapped through a per-read keyed cipher that preserves equality, and
//!    cipher matches vote for alignment offsets. The best and second-best
//!    vote counts yield a mapping-quality-style confidence.
//!
//! Input parsing (FASTQ, reference loading) and output serialization (SAM)
//! are left to the caller; the crate operates on byte-slice sequences.

pub mod aggregate;
pub mod cache;
pub mod cipher;
pub mod config;
mod constants;
pub mod core;
pub mod error;
pub mod index;
pub mod logging;
pub mod pipeline;
pub mod projection;
pub mod score;
pub mod types;
pub mod voting;

pub use crate::config::{parse_config, CipherHashKind, MapperParams, VotingStrategy};
pub use crate::core::fingerprint::KmerMask;
pub use crate::error::{MapError, Result};
pub use crate::logging::init_logger;
pub use crate::pipeline::{MapMetrics, Mapper};
pub use crate::types::{AlignmentResult, Contig, ReadRecord, Strand, VoteTally};
