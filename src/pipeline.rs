//! End-to-end read mapping pipeline.
//!
//! The pipeline runs in two data-parallel passes over the read batch:
//! candidate aggregation (LSH probing + contig merging), then encrypted
//! voting. The voting pass is split around a population reduction: final
//! confidence can be normalized by the batch's average best vote count, so
//! every read is tallied before any read is finalized.
//!
//! Per-read degeneracies (no valid fingerprint, no candidates, no votes)
//! degrade that read to a no-call; they never abort the batch.

use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::aggregate::{collect_candidates, AggregateWorkspace};
use crate::cipher::{encrypt_read, RefCiphers, VoteKeys};
use crate::config::MapperParams;
use crate::core::fingerprint::KmerMask;
use crate::error::{MapError, Result};
use crate::index::BucketIndex;
use crate::projection::LshFunctions;
use crate::score::BestAlignments;
use crate::types::{AlignmentResult, Contig, ReadRecord, Strand};
use crate::voting::{tally_votes, VotingWorkspace};

/// Mixer decorrelating per-read RNG streams from the batch seed.
const READ_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Score at or above which a call counts as confident in the metrics.
const CONFIDENT_SCORE: u32 = 10;

/// Aggregated counters for one mapping batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapMetrics {
    pub n_reads: usize,
    /// Reads that produced no candidate contigs on either strand.
    pub n_no_candidates: usize,
    /// Candidate contigs across all reads, after filtering.
    pub n_candidate_contigs: usize,
    /// Reads with at least one vote (a position was called).
    pub n_called: usize,
    /// Calls with confidence at or above [`CONFIDENT_SCORE`].
    pub n_confident: usize,
}

impl MapMetrics {
    fn merge(mut self, other: MapMetrics) -> MapMetrics {
        self.n_reads += other.n_reads;
        self.n_no_candidates += other.n_no_candidates;
        self.n_candidate_contigs += other.n_candidate_contigs;
        self.n_called += other.n_called;
        self.n_confident += other.n_confident;
        self
    }
}

/// Per-thread buffers for the voting pass.
#[derive(Debug, Default)]
struct VoteStageWorkspace {
    contig_ciphers: Vec<(u32, u64)>,
    voting: VotingWorkspace,
}

/// A reference prepared for mapping: LSH index plus precomputed voting
/// hashes. Immutable and shared across worker threads.
pub struct Mapper {
    params: MapperParams,
    funcs: LshFunctions,
    index: BucketIndex,
    ref_ciphers: RefCiphers,
    ref_len: u64,
    mask: KmerMask,
}

impl Mapper {
    /// Validate `params` and prepare the reference for mapping.
    pub fn new(ref_seq: &[u8], mask: KmerMask, params: MapperParams) -> Result<Self> {
        params
            .validate()
            .map_err(|e| MapError::validation(e.to_string()))?;
        let funcs = LshFunctions::generate(&params);

        let t = Instant::now();
        let index = BucketIndex::build(ref_seq, &mask, &params, &funcs);
        info!(
            "reference index built in {:.2}s ({} entries)",
            t.elapsed().as_secs_f64(),
            index.len()
        );

        let t = Instant::now();
        let ref_ciphers = RefCiphers::precompute(ref_seq, params.k2, params.cipher_hash);
        info!(
            "reference voting hashes precomputed in {:.2}s",
            t.elapsed().as_secs_f64()
        );

        Ok(Mapper {
            params,
            funcs,
            index,
            ref_ciphers,
            ref_len: ref_seq.len() as u64,
            mask,
        })
    }

    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    fn with_pool<T: Send>(&self, f: impl FnOnce() -> T + Send) -> Result<T> {
        if self.params.n_threads == 0 {
            return Ok(f());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.n_threads)
            .build()
            .map_err(|e| MapError::validation(format!("failed to build thread pool: {}", e)))?;
        Ok(pool.install(f))
    }

    /// Candidate aggregation pass: padded candidate contigs per read, both
    /// strands merged into one list.
    pub fn collect_candidates_batch(&self, reads: &[ReadRecord]) -> Result<Vec<Vec<Contig>>> {
        let t = Instant::now();
        let candidates = self.with_pool(|| {
            reads
                .par_iter()
                .map_init(
                    || AggregateWorkspace::new(self.params.n_tables),
                    |ws, read| {
                        let mut contigs = collect_candidates(
                            &read.seq,
                            Strand::Forward,
                            self.ref_len,
                            &self.mask,
                            &self.params,
                            &self.funcs,
                            &self.index,
                            ws,
                        );
                        contigs.extend(collect_candidates(
                            &read.rc,
                            Strand::ReverseComplement,
                            self.ref_len,
                            &self.mask,
                            &self.params,
                            &self.funcs,
                            &self.index,
                            ws,
                        ));
                        contigs
                    },
                )
                .collect::<Vec<_>>()
        })?;
        info!(
            "candidate aggregation for {} reads in {:.2}s",
            reads.len(),
            t.elapsed().as_secs_f64()
        );
        Ok(candidates)
    }

    /// Map a read batch end to end. `seed` drives the per-read cipher keys;
    /// a fixed seed makes the whole batch reproducible.
    pub fn map_reads(
        &self,
        reads: &[ReadRecord],
        seed: u64,
    ) -> Result<(Vec<AlignmentResult>, MapMetrics)> {
        let candidates = self.collect_candidates_batch(reads)?;
        self.map_reads_with_candidates(reads, &candidates, seed)
    }

    /// Voting and finalization over precollected (or cache-loaded)
    /// candidates. `candidates` must be index-aligned with `reads`.
    pub fn map_reads_with_candidates(
        &self,
        reads: &[ReadRecord],
        candidates: &[Vec<Contig>],
        seed: u64,
    ) -> Result<(Vec<AlignmentResult>, MapMetrics)> {
        if reads.len() != candidates.len() {
            return Err(MapError::validation(format!(
                "candidate list count {} does not match read count {}",
                candidates.len(),
                reads.len()
            )));
        }

        let t = Instant::now();
        let best: Vec<BestAlignments> = self.with_pool(|| {
            reads
                .par_iter()
                .zip(candidates.par_iter())
                .enumerate()
                .map_init(VoteStageWorkspace::default, |ws, (i, (read, contigs))| {
                    self.vote_read(i as u64, read, contigs, seed, ws)
                })
                .collect()
        })?;
        info!(
            "voting for {} reads in {:.2}s",
            reads.len(),
            t.elapsed().as_secs_f64()
        );

        // Population average of best vote counts over reads that got votes
        let (sum, count) = best
            .iter()
            .filter(|b| b.top_votes() > 0)
            .fold((0u64, 0u64), |(s, c), b| (s + b.top_votes() as u64, c + 1));
        let avg_score = if count > 0 { (sum / count) as u32 } else { 0 };

        let results: Vec<AlignmentResult> = best
            .iter()
            .zip(reads)
            .map(|(b, read)| b.finalize(read.len(), avg_score, &self.params))
            .collect();

        let metrics = results
            .iter()
            .zip(candidates)
            .map(|(res, contigs)| MapMetrics {
                n_reads: 1,
                n_no_candidates: contigs.is_empty() as usize,
                n_candidate_contigs: contigs.len(),
                n_called: (!res.is_no_call()) as usize,
                n_confident: (res.score >= CONFIDENT_SCORE) as usize,
            })
            .fold(MapMetrics::default(), MapMetrics::merge);
        info!(
            "mapped {} reads: {} called, {} confident, {} without candidates",
            metrics.n_reads, metrics.n_called, metrics.n_confident, metrics.n_no_candidates
        );

        Ok((results, metrics))
    }

    /// Encrypted voting over one read's candidate contigs.
    fn vote_read(
        &self,
        read_idx: u64,
        read: &ReadRecord,
        contigs: &[Contig],
        seed: u64,
        ws: &mut VoteStageWorkspace,
    ) -> BestAlignments {
        let mut best = BestAlignments::new();
        if contigs.is_empty() || read.len() < self.params.k2 {
            return best;
        }

        let mut rng = StdRng::seed_from_u64(seed ^ read_idx.wrapping_mul(READ_SEED_MIX));
        let keys = VoteKeys::generate(&mut rng);

        // Contigs far behind the best-supported one are not worth ciphering
        let best_hits = contigs.iter().map(|c| c.n_table_hits).max().unwrap_or(0);
        let min_hits = best_hits.saturating_sub(self.params.dist_best_hit);
        let wanted = |strand: Strand| {
            contigs
                .iter()
                .any(|c| c.strand == strand && c.n_table_hits >= min_hits)
        };

        let ciphers_f = if wanted(Strand::Forward) {
            encrypt_read(
                &read.seq,
                self.params.k2,
                self.params.cipher_hash,
                &keys,
                &mut rng,
            )
        } else {
            Vec::new()
        };
        let ciphers_rc = if wanted(Strand::ReverseComplement) {
            encrypt_read(
                &read.rc,
                self.params.k2,
                self.params.cipher_hash,
                &keys,
                &mut rng,
            )
        } else {
            Vec::new()
        };

        for contig in contigs {
            if contig.n_table_hits < min_hits {
                continue;
            }
            let read_ciphers = match contig.strand {
                Strand::Forward => &ciphers_f,
                Strand::ReverseComplement => &ciphers_rc,
            };
            self.ref_ciphers.encrypt_contig(
                contig,
                &keys,
                self.params.sampling_intv,
                &mut ws.contig_ciphers,
            );
            let tally = tally_votes(
                &self.params,
                read_ciphers,
                &ws.contig_ciphers,
                contig.len as usize,
                read.len(),
                &mut ws.voting,
            );
            best.update(&tally, contig);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_params() -> MapperParams {
        MapperParams {
            k: 8,
            k2: 8,
            h: 8,
            n_tables: 4,
            n_buckets: 64,
            proj_len: 2,
            ref_window_size: 60,
            max_contig_len: 1000,
            ..Default::default()
        }
    }

    fn random_seq(seed: u64, len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    #[test]
    fn test_forward_read_mapped_near_origin() {
        let ref_seq = random_seq(42, 1200);
        let mapper = Mapper::new(&ref_seq, KmerMask::empty(8), small_params()).unwrap();
        let reads = vec![ReadRecord::new(ref_seq[300..360].to_vec())];
        let (results, metrics) = mapper.map_reads(&reads, 7).unwrap();
        assert_eq!(metrics.n_reads, 1);
        assert_eq!(metrics.n_called, 1);
        let res = results[0];
        assert_eq!(res.strand, Strand::Forward);
        assert!(res.score > 0, "unique placement must be confident");
        assert!(
            (res.ref_start as i64 - 300).abs() <= 40,
            "position {} too far from 300",
            res.ref_start
        );
    }

    #[test]
    fn test_rc_read_mapped_with_shift() {
        let ref_seq = random_seq(43, 1200);
        let mapper = Mapper::new(&ref_seq, KmerMask::empty(8), small_params()).unwrap();
        let rc = crate::core::encoding::reverse_complement(&ref_seq[500..560]);
        let reads = vec![ReadRecord::new(rc)];
        let (results, _) = mapper.map_reads(&reads, 9).unwrap();
        let res = results[0];
        assert_eq!(res.strand, Strand::ReverseComplement);
        assert!(res.score > 0);
        // Reverse calls report the coordinate shifted by the read length
        assert!(
            (res.ref_start as i64 - (500 + 60)).abs() <= 40,
            "position {} too far from 560",
            res.ref_start
        );
    }

    #[test]
    fn test_batch_deterministic_under_fixed_seed() {
        let ref_seq = random_seq(44, 1500);
        let mapper = Mapper::new(&ref_seq, KmerMask::empty(8), small_params()).unwrap();
        let reads: Vec<ReadRecord> = (0..8)
            .map(|i| ReadRecord::new(ref_seq[i * 100..i * 100 + 60].to_vec()))
            .collect();
        let (a, ma) = mapper.map_reads(&reads, 1234).unwrap();
        let (b, mb) = mapper.map_reads(&reads, 1234).unwrap();
        assert_eq!(a, b);
        assert_eq!(ma, mb);
    }

    #[test]
    fn test_garbage_read_is_no_call() {
        let ref_seq = random_seq(45, 1200);
        let mapper = Mapper::new(&ref_seq, KmerMask::empty(8), small_params()).unwrap();
        let reads = vec![ReadRecord::new(vec![b'N'; 60])];
        let (results, metrics) = mapper.map_reads(&reads, 5).unwrap();
        assert!(results[0].is_no_call());
        assert_eq!(metrics.n_no_candidates, 1);
        assert_eq!(metrics.n_called, 0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = MapperParams {
            k: 0,
            ..small_params()
        };
        assert!(Mapper::new(b"ACGT", KmerMask::empty(8), params).is_err());
    }
}
