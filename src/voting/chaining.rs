//! Diagonal-fragment chaining.
//!
//! Cipher matches are fused into maximal diagonal fragments, the fragments
//! are chained by dynamic programming over a DAG whose edges penalize
//! diagonal drift, and the winning chain's fragments cast votes that feed
//! the same windowed maximization the windowed backend uses. Fragments left
//! out of the chain still vote, so a genuinely distinct second-best location
//! stays visible in the tally.

use super::{for_each_match, windowed::windowed_max, VotingWorkspace};
use crate::types::VoteTally;

/// Weight multiplier per covered base in a fragment.
const NODE_WEIGHT: i64 = 5;
/// Cost per base of diagonal drift between chained fragments.
const DRIFT_COST: i64 = 10;
/// Flat cost for taking any chain edge.
const EDGE_COST: i64 = 2;

/// A maximal run of matches along one diagonal. `weight` counts covered
/// contig bases, starting at k2 for a single match.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    contig: i64,
    read: i64,
    weight: i64,
}

/// Fuse matches sorted by `(contig_offset, read_pos)` into fragments.
///
/// A match extends the open fragment when it continues the same diagonal
/// step and overlaps the fragment's covered span. On a diagonal break the
/// new fragment is clipped forward past the overlap with its predecessor so
/// covered bases are never counted twice.
fn build_fragments(matches: &[(u32, u32)], k2: i64, out: &mut Vec<Fragment>) {
    out.clear();
    let (c0, r0) = matches[0];
    let mut frag = Fragment {
        contig: c0 as i64,
        read: r0 as i64,
        weight: k2,
    };
    for w in matches.windows(2) {
        let (pc, pr) = (w[0].0 as i64, w[0].1 as i64);
        let (c, r) = (w[1].0 as i64, w[1].1 as i64);
        let last = frag.contig + frag.weight;
        if c - pc == r - pr && c < last + 1 {
            frag.weight += c + k2 - last;
        } else {
            let mut clip = 0;
            if r > pr {
                let d1 = last - c;
                let d2 = frag.read + frag.weight - r;
                if d1 > 0 {
                    clip = d1;
                }
                if d2 > 0 {
                    clip = d1.max(d2);
                }
            }
            out.push(frag);
            frag = Fragment {
                contig: c + clip,
                read: r + clip,
                weight: k2 - clip,
            };
        }
    }
    out.push(frag);
}

/// Longest weighted chain over the fragment DAG.
///
/// Fragments arrive in contig order, which is topological: an edge requires
/// both coordinates to advance past the predecessor's covered span. Returns
/// per-fragment chain scores, predecessors, and the index of the best chain
/// end.
fn chain_fragments(fragments: &[Fragment]) -> (Vec<i64>, Vec<Option<usize>>, usize) {
    let n = fragments.len();
    let mut scores = vec![0i64; n];
    let mut preds: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let fi = fragments[i];
        let node = NODE_WEIGHT * fi.weight;
        scores[i] = node;
        for j in 0..i {
            let fj = fragments[j];
            let dx = fi.contig - (fj.contig + fj.weight);
            let dy = fi.read - (fj.read + fj.weight);
            if dx < 0 || dy < 0 {
                continue;
            }
            let gap = DRIFT_COST * (dx - dy).abs() + EDGE_COST;
            let cand = scores[j] - gap + node;
            if cand >= scores[i] {
                scores[i] = cand;
                preds[i] = Some(j);
            }
        }
    }
    let mut best_end = 0;
    for i in 0..n {
        if scores[i] >= scores[best_end] {
            best_end = i;
        }
    }
    (scores, preds, best_end)
}

/// Tally votes over one contig by fragment chaining.
#[allow(clippy::too_many_arguments)]
pub fn tally(
    read_ciphers: &[u64],
    contig_ciphers: &[(u32, u64)],
    contig_len: usize,
    read_len: usize,
    k2: usize,
    delta_inlier: usize,
    delta_x: usize,
    ws: &mut VotingWorkspace,
) -> VoteTally {
    let VotingWorkspace {
        sorted,
        votes,
        prefix,
        matches,
    } = ws;

    matches.clear();
    for_each_match(read_ciphers, contig_ciphers, sorted, |p, r| {
        matches.push((r, p));
    });
    if matches.is_empty() {
        return VoteTally::default();
    }
    matches.sort_unstable();

    let mut fragments = Vec::new();
    build_fragments(matches, k2 as i64, &mut fragments);
    let (_, preds, best_end) = chain_fragments(&fragments);

    let mut in_chain = vec![false; fragments.len()];
    let mut cursor = Some(best_end);
    while let Some(i) = cursor {
        in_chain[i] = true;
        cursor = preds[i];
    }

    let n = contig_len + read_len;
    let pos0 = read_len as i64;
    votes.clear();
    votes.resize(n, 0);
    for (i, frag) in fragments.iter().enumerate() {
        let mut w = frag.weight - k2 as i64 + 1;
        if w <= 0 {
            continue;
        }
        // Chain members vote at double weight; stray fragments still vote
        // once so a distinct runner-up location shows up as second best
        if in_chain[i] {
            w *= 2;
        }
        let diag = frag.contig - frag.read;
        let idx = pos0 + diag;
        if idx < 0 || idx >= n as i64 {
            continue;
        }
        votes[idx as usize] += w;
    }

    windowed_max(votes, prefix, pos0, delta_inlier, delta_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const K2: usize = 8;
    const DELTA: usize = 10;
    const DELTA_X: usize = 4;

    fn run(read: &[u64], contig: &[(u32, u64)], contig_len: usize, read_len: usize) -> VoteTally {
        tally(
            read,
            contig,
            contig_len,
            read_len,
            K2,
            DELTA,
            DELTA_X,
            &mut VotingWorkspace::new(),
        )
    }

    fn plant(read: &[u64], start: u32, range: std::ops::Range<usize>) -> Vec<(u32, u64)> {
        range
            .map(|p| (start + p as u32, read[p]))
            .collect()
    }

    #[test]
    fn test_single_fragment_chain() {
        let read: Vec<u64> = (1..=12).map(|i| i * 31).collect();
        let contig = plant(&read, 40, 0..12);
        let tally = run(&read, &contig, 200, 19);
        // One chained fragment covering 19 bases votes its 12 matched
        // k-mers at double weight
        assert_eq!(tally.best_votes, 24);
        assert_eq!(tally.best_offset, 40);
        assert_eq!(tally.second_votes, 0);
    }

    #[test]
    fn test_colinear_fragments_chain_together() {
        let read: Vec<u64> = (1..=30).map(|i| i * 31).collect();
        let mut contig = plant(&read, 100, 0..10);
        contig.extend(plant(&read, 100, 25..30));
        let tally = run(&read, &contig, 300, 37);
        // Both fragments sit on diagonal 100 and chain across the gap
        assert_eq!(tally.best_votes, 30);
        assert_eq!(tally.best_offset, 100);
        assert_eq!(tally.second_votes, 0);
    }

    #[test]
    fn test_small_indel_tolerated() {
        let read: Vec<u64> = (1..=30).map(|i| i * 31).collect();
        let mut contig = plant(&read, 100, 0..10);
        // Second run shifted one base: a 1bp insertion in the reference
        contig.extend(plant(&read, 101, 25..30));
        let tally = run(&read, &contig, 300, 37);
        assert_eq!(tally.best_votes, 30);
        assert!((100..=101).contains(&tally.best_offset));
    }

    #[test]
    fn test_offdiagonal_decoy_reported_second() {
        let read: Vec<u64> = (1..=30).map(|i| i * 31).collect();
        let mut contig = plant(&read, 100, 0..20);
        contig.extend(plant(&read, 900, 24..30));
        let tally = run(&read, &contig, 1000, 37);
        assert_eq!(tally.best_votes, 40);
        assert!((tally.best_offset - 100).abs() <= DELTA as i64);
        // The decoy overlaps the first fragment's covered read span (0..27)
        // by 3 bases and is clipped forward, leaving 10 covered bases
        assert_eq!(tally.second_votes, 3);
        assert!((tally.second_offset - 900).abs() <= (2 * DELTA) as i64);
    }

    #[test]
    fn test_second_requires_separation() {
        let read: Vec<u64> = (1..=20).map(|i| i * 31).collect();
        let mut contig = plant(&read, 100, 0..12);
        // Remainder lands 20 bases off the best diagonal, same location
        contig.extend(plant(&read, 120, 12..20));
        let tally = run(&read, &contig, 300, 27);
        assert!(tally.best_votes > 0);
        assert_eq!(tally.second_votes, 0);
    }

    #[test]
    fn test_nonmonotone_decoy_not_chained() {
        // A decoy fragment that goes backwards in the read cannot join the
        // chain: matches later in the contig but earlier in the read
        let read: Vec<u64> = (1..=30).map(|i| i * 31).collect();
        let mut contig = plant(&read, 100, 10..30);
        contig.extend(plant(&read, 700, 0..6));
        let tally = run(&read, &contig, 1000, 37);
        // Best chain is the 20-match run at diagonal 90
        assert_eq!(tally.best_votes, 40);
        assert!((tally.best_offset - 90).abs() <= DELTA as i64);
        assert_eq!(tally.second_votes, 6);
    }

    #[test]
    fn test_fragment_fusion_counts_coverage() {
        let matches: Vec<(u32, u32)> = (0..12).map(|i| (40 + i, i)).collect();
        let mut frags = Vec::new();
        build_fragments(&matches, K2 as i64, &mut frags);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].weight, 19);
        assert_eq!(frags[0].contig, 40);
    }

    #[test]
    fn test_chain_scores_prefer_colinear() {
        let frags = vec![
            Fragment { contig: 100, read: 0, weight: 17 },
            Fragment { contig: 125, read: 25, weight: 12 },
            Fragment { contig: 500, read: 20, weight: 10 },
        ];
        let (scores, preds, best_end) = chain_fragments(&frags);
        // Colinear pair chains with a flat edge cost
        assert_eq!(scores[1], NODE_WEIGHT * 17 + NODE_WEIGHT * 12 - EDGE_COST);
        assert_eq!(preds[1], Some(0));
        assert_eq!(best_end, 1);
        // The far fragment pays heavy drift, standing alone scores better
        assert_eq!(scores[2], NODE_WEIGHT * 10);
    }
}
