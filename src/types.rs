//! Core types used throughout the veilmap library.

use crate::core::encoding::reverse_complement;

/// Strand a candidate or alignment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    ReverseComplement,
}

/// A merged candidate reference interval aggregated from overlapping bucket
/// hits across LSH tables (not a genome-assembly contig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contig {
    /// Leftmost reference position of the padded search window.
    pub pos: u64,
    /// Length of the padded search window in bases.
    pub len: u32,
    /// Strand of the read this candidate was collected for.
    pub strand: Strand,
    /// Number of distinct LSH tables that voted for the merged span.
    pub n_table_hits: u16,
}

/// Per-candidate voting outcome.
///
/// Invariant: `best_votes >= second_votes`, and when `second_votes > 0` the
/// two offsets refer to genuinely distinct locations (outside the configured
/// tolerance window of each other).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub best_offset: i64,
    pub best_votes: u32,
    pub second_offset: i64,
    pub second_votes: u32,
}

/// Final per-read mapping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentResult {
    /// Reported alignment coordinate. Forward alignments report the leftmost
    /// reference base covered; reverse-complement alignments are shifted
    /// forward by the read length, following the downstream record
    /// convention. Meaningless when `inlier_votes == 0`.
    pub ref_start: u64,
    pub strand: Strand,
    /// Mapping-quality-style confidence; 0 means ambiguous or no call.
    pub score: u32,
    pub inlier_votes: u32,
    pub second_best_votes: u32,
}

impl AlignmentResult {
    /// The no-call result used for reads whose pipeline degenerated.
    pub fn no_call() -> Self {
        AlignmentResult {
            ref_start: 0,
            strand: Strand::Forward,
            score: 0,
            inlier_votes: 0,
            second_best_votes: 0,
        }
    }

    pub fn is_no_call(&self) -> bool {
        self.inlier_votes == 0
    }
}

/// An input read: forward sequence, its reverse complement, and an optional
/// ground-truth interval for evaluation.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub seq: Vec<u8>,
    pub rc: Vec<u8>,
    /// `(leftmost, rightmost)` true reference positions, evaluation only.
    pub true_interval: Option<(u64, u64)>,
}

impl ReadRecord {
    pub fn new(seq: Vec<u8>) -> Self {
        let rc = reverse_complement(&seq);
        ReadRecord {
            seq,
            rc,
            true_interval: None,
        }
    }

    pub fn with_truth(seq: Vec<u8>, left: u64, right: u64) -> Self {
        let mut r = Self::new(seq);
        r.true_interval = Some((left, right));
        r
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}
