//! Alignment selection and confidence scoring.
//!
//! Per-contig vote tallies are folded into a running best / second-best pair
//! for the read. Two candidate positions within [`BEST_SEPARATION_WINDOW`]
//! bases count as the same location: a stronger tally there replaces the
//! best without demoting it to second. The final confidence is
//! `mapq_scale * (best - second) / best`, zeroed for ties and for vote
//! counts at or below `votes_cutoff`.

use crate::config::MapperParams;
use crate::constants::BEST_SEPARATION_WINDOW;
use crate::types::{AlignmentResult, Contig, Strand, VoteTally};

#[inline]
fn pos_in_range(a: u64, b: u64, delta: u64) -> bool {
    a <= b + delta && b <= a + delta
}

/// Running best and second-best alignment candidates for one read.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestAlignments {
    top_ref_start: u64,
    top_votes: u32,
    top_strand: Option<Strand>,
    second_ref_start: u64,
    second_votes: u32,
}

impl BestAlignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one contig's tally into the running best/second pair. Both the
    /// tally's best and its second-best location are considered.
    pub fn update(&mut self, tally: &VoteTally, contig: &Contig) {
        let candidates = [
            (tally.best_votes, tally.best_offset),
            (tally.second_votes, tally.second_offset),
        ];
        for (votes, offset) in candidates {
            if votes == 0 {
                continue;
            }
            let pos = (contig.pos as i64 + offset).max(0) as u64;
            if votes > self.top_votes {
                if !pos_in_range(pos, self.top_ref_start, BEST_SEPARATION_WINDOW) {
                    self.second_votes = self.top_votes;
                    self.second_ref_start = self.top_ref_start;
                }
                self.top_votes = votes;
                self.top_ref_start = pos;
                self.top_strand = Some(contig.strand);
            } else if votes > self.second_votes
                && !pos_in_range(pos, self.top_ref_start, BEST_SEPARATION_WINDOW)
            {
                self.second_votes = votes;
                self.second_ref_start = pos;
            }
        }
    }

    pub fn top_votes(&self) -> u32 {
        self.top_votes
    }

    /// Produce the final call for the read.
    ///
    /// `avg_score` is the population average of best vote counts; it only
    /// matters when `enable_scale` is set. Reverse-strand coordinates are
    /// shifted forward by the read length, matching the downstream record
    /// convention for reverse alignments.
    pub fn finalize(&self, read_len: usize, avg_score: u32, params: &MapperParams) -> AlignmentResult {
        let Some(strand) = self.top_strand else {
            return AlignmentResult::no_call();
        };
        let mut score = 0u32;
        let mut ref_start = self.top_ref_start;
        if self.top_votes > self.second_votes {
            if self.top_votes > params.votes_cutoff {
                score =
                    params.mapq_scale * (self.top_votes - self.second_votes) / self.top_votes;
                if params.enable_scale && avg_score > 0 {
                    score = (score as f32 * self.top_votes as f32 / avg_score as f32) as u32;
                }
            }
            if strand == Strand::ReverseComplement {
                ref_start += read_len as u64;
            }
        }
        AlignmentResult {
            ref_start,
            strand,
            score,
            inlier_votes: self.top_votes,
            second_best_votes: self.second_votes,
        }
    }
}
