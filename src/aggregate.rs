//! Candidate aggregation across LSH tables.
//!
//! For one read strand, each table contributes a sorted run of bucket entries
//! whose projection hash matches the read. The runs are k-way merged by
//! reference position with a min-heap, and overlapping windows are fused into
//! candidate contigs. Contigs with too few distinct table hits, or too far
//! behind the best-supported contig, are discarded before the padded search
//! intervals are emitted.

use crate::config::MapperParams;
use crate::constants::{CONTIGS_SOFT_CAP, CONTIG_PADDING};
use crate::core::fingerprint::{minhash_into, KmerMask};
use crate::core::heap::MinHeap;
use crate::index::{BucketEntry, BucketIndex};
use crate::projection::LshFunctions;
use crate::types::{Contig, Strand};

/// Reusable per-thread buffers for the aggregation phase.
#[derive(Debug)]
pub struct AggregateWorkspace {
    scratch: Vec<u32>,
    fingerprint: Vec<u32>,
    table_seen: Vec<bool>,
    touched_tables: Vec<u16>,
}

impl AggregateWorkspace {
    pub fn new(n_tables: usize) -> Self {
        AggregateWorkspace {
            scratch: Vec::new(),
            fingerprint: Vec::new(),
            table_seen: vec![false; n_tables],
            touched_tables: Vec::new(),
        }
    }
}

/// A fused run of overlapping bucket windows, before padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawContig {
    pos: u64,
    /// Span of merged window starts: `last_window_end - pos`.
    len: u64,
    n_table_hits: u16,
}

/// Heap item for the k-way merge, ordered by reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    pos: u64,
    table: u16,
    run_id: u32,
}

impl Ord for Probe {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.pos, self.table).cmp(&(other.pos, other.table))
    }
}

impl PartialOrd for Probe {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Locate the run of entries carrying `key` inside a sorted bucket.
fn hash_run<'a>(bucket: &'a [BucketEntry], key: u32) -> &'a [BucketEntry] {
    let start = bucket.partition_point(|e| e.hash < key);
    let end = bucket.partition_point(|e| e.hash <= key);
    &bucket[start..end]
}

/// Merge per-table entry runs into raw contigs.
///
/// Entries arrive sorted by position within each run; the heap yields them in
/// global position order. A window extends the open contig when its start
/// lies at or before the contig's current rightmost covered position.
fn merge_runs(
    runs: &[(u16, &[BucketEntry])],
    ws: &mut AggregateWorkspace,
) -> Vec<RawContig> {
    let mut heap: MinHeap<Probe> = MinHeap::with_capacity(runs.len());
    let mut cursors = vec![0usize; runs.len()];
    for (run_id, (table, run)) in runs.iter().enumerate() {
        if let Some(e) = run.first() {
            heap.push(Probe {
                pos: e.pos,
                table: *table,
                run_id: run_id as u32,
            });
        }
    }

    let mut contigs = Vec::new();
    let mut open: Option<RawContig> = None;
    let mut last_pos: u64 = 0;

    while let Some(probe) = heap.peek().copied() {
        let run_id = probe.run_id as usize;
        let (table, run) = runs[run_id];
        let entry = run[cursors[run_id]];
        cursors[run_id] += 1;
        if cursors[run_id] < run.len() {
            heap.replace_min(Probe {
                pos: run[cursors[run_id]].pos,
                table,
                run_id: probe.run_id,
            });
        } else {
            heap.pop_min();
        }

        let entry_last = entry.pos + entry.len as u64 - 1;
        match open.as_mut() {
            Some(contig) if entry.pos <= last_pos => {
                if entry_last > last_pos {
                    contig.len += entry_last - last_pos;
                    last_pos = entry_last;
                }
                if !ws.table_seen[table as usize] {
                    ws.table_seen[table as usize] = true;
                    ws.touched_tables.push(table);
                    contig.n_table_hits = contig.n_table_hits.saturating_add(1);
                }
            }
            _ => {
                if let Some(done) = open.take() {
                    contigs.push(done);
                }
                for &t in &ws.touched_tables {
                    ws.table_seen[t as usize] = false;
                }
                ws.touched_tables.clear();
                ws.table_seen[table as usize] = true;
                ws.touched_tables.push(table);
                open = Some(RawContig {
                    pos: entry.pos,
                    len: entry.len as u64 - 1,
                    n_table_hits: 1,
                });
                last_pos = entry_last;
            }
        }
    }
    if let Some(done) = open {
        contigs.push(done);
    }
    for &t in &ws.touched_tables {
        ws.table_seen[t as usize] = false;
    }
    ws.touched_tables.clear();
    contigs
}

/// Collect padded candidate contigs for one read strand.
///
/// Returns an empty vector when the read fingerprint is invalid (too few
/// unambiguous k-mers) or no table produced a usable bucket.
pub fn collect_candidates(
    seq: &[u8],
    strand: Strand,
    ref_len: u64,
    mask: &KmerMask,
    params: &MapperParams,
    funcs: &LshFunctions,
    index: &BucketIndex,
    ws: &mut AggregateWorkspace,
) -> Vec<Contig> {
    if !minhash_into(
        seq,
        params.k,
        mask,
        funcs.scramblers(),
        &mut ws.scratch,
        &mut ws.fingerprint,
    ) {
        return Vec::new();
    }

    let mut runs: Vec<(u16, &[BucketEntry])> = Vec::with_capacity(params.n_tables);
    for t in 0..params.n_tables {
        let key = funcs.projection_key(t, &ws.fingerprint);
        // None means the bucket blew past the size cutoff; the table is
        // treated as contributing no hits for this read
        let Some(bucket) = index.lookup(t, funcs, key) else {
            continue;
        };
        let run = hash_run(bucket, key);
        if !run.is_empty() {
            runs.push((t as u16, run));
        }
    }
    if runs.is_empty() {
        return Vec::new();
    }

    let raw = merge_runs(&runs, ws);

    let best_hits = raw.iter().map(|c| c.n_table_hits).max().unwrap_or(0);
    let min_keep = best_hits.saturating_sub(params.dist_best_hit);

    let read_len = seq.len() as u64;
    let mut out = Vec::with_capacity(CONTIGS_SOFT_CAP);
    for contig in raw {
        if contig.n_table_hits < params.min_n_hits
            || contig.n_table_hits < min_keep
            || contig.len > params.max_contig_len as u64
        {
            continue;
        }
        let pad = CONTIG_PADDING as u64;
        let pos = contig.pos.saturating_sub(pad);
        let mut len = contig.len + 2 * pad + read_len;
        if pos >= ref_len {
            continue;
        }
        if pos + len > ref_len {
            len = ref_len - pos;
        }
        out.push(Contig {
            pos,
            len: len as u32,
            strand,
            n_table_hits: contig.n_table_hits,
        });
    }
    out
}
