//! Windowed-sum vote maximization.
//!
//! Each cipher match votes for a k2-aligned range of alignment offsets
//! around the offset it implies; exact positions are deliberately blurred to
//! the enclosing k2 blocks so that vote counting does not require the contig
//! positions in the clear. The windowed maximum over prefix sums then finds
//! the offset whose `delta_inlier` neighborhood accumulated the most votes.

use super::{for_each_match, same_location, VotingWorkspace};
use crate::types::VoteTally;

/// Scan the vote array for the best and second-best windowed sums.
///
/// The best position resolves ties by walking the plateau of equal sums that
/// starts at the first maximum and taking its midpoint. The second best is
/// the strongest window outside `delta_x * delta_inlier` of the best.
pub(super) fn windowed_max(
    votes: &[i64],
    prefix: &mut Vec<i64>,
    pos0: i64,
    delta_inlier: usize,
    delta_x: usize,
) -> VoteTally {
    let n = votes.len();
    prefix.clear();
    prefix.reserve(n);
    let mut acc = 0i64;
    for &v in votes {
        acc += v;
        prefix.push(acc);
    }

    let window_sum = |i: usize| -> i64 {
        let start = if i > delta_inlier { i - delta_inlier - 1 } else { 0 };
        let end = if i + delta_inlier >= n { n - 1 } else { i + delta_inlier };
        prefix[end] - prefix[start]
    };

    let mut max = 0i64;
    let mut max_pos = 0usize;
    for i in 0..n {
        let w = window_sum(i);
        if w > max {
            max = w;
            max_pos = i;
        }
    }
    if max == 0 {
        return VoteTally::default();
    }

    // Pick the middle of the plateau of equal sums starting at the maximum
    let mut i = max_pos;
    while i < n && window_sum(i) == max {
        i += 1;
    }
    let max_pos = (i + max_pos) / 2;

    let tolerance = (delta_x * delta_inlier) as i64;
    let mut second = 0i64;
    let mut second_pos = 0usize;
    for i in 0..n {
        if i == max_pos {
            continue;
        }
        let w = window_sum(i);
        if w > second && !same_location(max_pos as i64, i as i64, tolerance) {
            second = w;
            second_pos = i;
        }
    }

    VoteTally {
        best_offset: max_pos as i64 - pos0,
        best_votes: max as u32,
        second_offset: second_pos as i64 - pos0,
        second_votes: second as u32,
    }
}

/// Tally votes over one contig by windowed-sum maximization.
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
    let n = contig_len + read_len;
    let pos0 = read_len as i64;
    let n_read = read_ciphers.len();

    let VotingWorkspace {
        sorted,
        votes,
        prefix,
        ..
    } = ws;

    votes.clear();
    votes.resize(n, 0);
    let mut any = false;
    for_each_match(read_ciphers, contig_ciphers, sorted, |p, r| {
        any = true;
        let p = p as usize;
        let r = r as usize;
        // Blur both positions to their k2 blocks and vote the full range of
        // offsets the two blocks admit
        let read_start = (p / k2) * k2;
        let read_end = (read_start + k2).min(n_read);
        let contig_start = (r / k2) * k2;
        let contig_end = (contig_start + k2).min(contig_len);
        let s = contig_start as i64 - read_end as i64;
        let t = contig_end as i64 - read_start as i64;
        for k in s..t {
            votes[(pos0 + k) as usize] += 1;
        }
    });
    if !any {
        return VoteTally::default();
    }

    windowed_max(votes, prefix, pos0, delta_inlier, delta_x)
}
