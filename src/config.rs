use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_MAX_BUCKET_SIZE, N_TABLES_MAX};

/// Which voting backend resolves candidate offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    /// Windowed-sum vote maximization (default).
    Windowed,
    /// Diagonal-fragment chaining via DAG dynamic programming.
    Chaining,
}

/// Hash used to derive voting k-mer ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherHashKind {
    /// Fast non-cryptographic 64-bit hash.
    Fast,
    /// Cryptographic hash truncated to 64 bits.
    Crypto,
}

/// All tunables of the matching pipeline.
///
/// Parsed from the `[mapper]` table of a TOML file or built in code; must be
/// validated once with [`MapperParams::validate`] before the parallel phase
/// starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// K-mer length used for fingerprints and bucketing (1..=16).
    pub k: usize,
    /// K-mer length used for voting ciphers.
    pub k2: usize,
    /// Number of hash functions per minhash fingerprint.
    pub h: usize,
    /// Number of LSH tables.
    pub n_tables: usize,
    /// Number of buckets per table.
    pub n_buckets: usize,
    /// Number of fingerprint entries concatenated into a projection key.
    pub proj_len: usize,
    /// Reference window length indexed per bucket entry.
    pub ref_window_size: usize,
    /// Buckets larger than this are skipped for the probing read.
    pub max_bucket_size: usize,
    /// Minimum distinct-table hits for a contig to survive.
    pub min_n_hits: u16,
    /// A contig is dropped when its hit count falls more than this distance
    /// below the best hit count seen so far for the read.
    pub dist_best_hit: u16,
    /// Maximum merged contig length in bases.
    pub max_contig_len: usize,
    /// Vote window radius in bases.
    pub delta_inlier: usize,
    /// Second-best candidates closer than `delta_x * delta_inlier` to the
    /// best offset are considered the same location.
    pub delta_x: usize,
    /// Voting backend.
    pub strategy: VotingStrategy,
    /// Cipher hash selection.
    pub cipher_hash: CipherHashKind,
    /// Sampling interval over reference contig ciphers.
    pub sampling_intv: usize,
    /// Worker pool size; 0 uses the rayon default.
    pub n_threads: usize,
    /// Confidence score scaling constant.
    pub mapq_scale: u32,
    /// Best-vote count below which the confidence stays 0.
    pub votes_cutoff: u32,
    /// Scale confidence by `best_votes / population_average_best_votes`.
    pub enable_scale: bool,
    /// Seed for the deterministic LSH function family.
    pub lsh_seed: u64,
}

impl Default for MapperParams {
    fn default() -> Self {
        MapperParams {
            k: 12,
            k2: 16,
            h: 64,
            n_tables: 32,
            n_buckets: 1 << 18,
            proj_len: 4,
            ref_window_size: 150,
            max_bucket_size: DEFAULT_MAX_BUCKET_SIZE,
            min_n_hits: 2,
            dist_best_hit: 10,
            max_contig_len: 10_000,
            delta_inlier: 10,
            delta_x: 4,
            strategy: VotingStrategy::Windowed,
            cipher_hash: CipherHashKind::Fast,
            sampling_intv: 1,
            n_threads: 0,
            mapq_scale: 250,
            votes_cutoff: 0,
            enable_scale: false,
            lsh_seed: 0x5555_5555_5555_5555,
        }
    }
}

impl MapperParams {
    /// Check parameter consistency once, before any parallel work.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > 16 {
            return Err(anyhow!("k must be between 1 and 16 (got {})", self.k));
        }
        if self.k2 < 4 || self.k2 > 64 {
            return Err(anyhow!("k2 must be between 4 and 64 (got {})", self.k2));
        }
        if self.h == 0 {
            return Err(anyhow!("h must be at least 1"));
        }
        if self.proj_len == 0 || self.proj_len > self.h {
            return Err(anyhow!(
                "proj_len must be between 1 and h={} (got {})",
                self.h,
                self.proj_len
            ));
        }
        if self.n_tables == 0 || self.n_tables > N_TABLES_MAX {
            return Err(anyhow!(
                "n_tables must be between 1 and {} (got {})",
                N_TABLES_MAX,
                self.n_tables
            ));
        }
        if self.n_buckets == 0 {
            return Err(anyhow!("n_buckets must be at least 1"));
        }
        if self.ref_window_size <= self.k {
            return Err(anyhow!(
                "ref_window_size ({}) must exceed k ({})",
                self.ref_window_size,
                self.k
            ));
        }
        if self.k2 > self.ref_window_size {
            return Err(anyhow!(
                "k2 ({}) must not exceed ref_window_size ({}): no contig would yield voting k-mers",
                self.k2,
                self.ref_window_size
            ));
        }
        if self.max_contig_len < self.ref_window_size {
            return Err(anyhow!(
                "max_contig_len ({}) must be at least ref_window_size ({})",
                self.max_contig_len,
                self.ref_window_size
            ));
        }
        if self.delta_inlier == 0 {
            return Err(anyhow!("delta_inlier must be at least 1"));
        }
        if self.sampling_intv == 0 {
            return Err(anyhow!("sampling_intv must be at least 1"));
        }
        if self.mapq_scale == 0 {
            return Err(anyhow!("mapq_scale must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mapper: MapperParams,
}

/// Parse and validate mapper parameters from a TOML file.
pub fn parse_config(path: &Path) -> Result<MapperParams> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;

    let config: ConfigFile = toml::from_str(&contents).context("Failed to parse TOML config")?;
    config.mapper.validate()?;
    Ok(config.mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_valid() {
        MapperParams::default().validate().unwrap();
    }

    #[test]
    fn test_parse_valid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let config_content = r#"
[mapper]
k = 10
k2 = 12
h = 16
n_tables = 8
proj_len = 3
strategy = "chaining"
cipher_hash = "crypto"
"#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let params = parse_config(&config_path).unwrap();
        assert_eq!(params.k, 10);
        assert_eq!(params.n_tables, 8);
        assert_eq!(params.strategy, VotingStrategy::Chaining);
        assert_eq!(params.cipher_hash, CipherHashKind::Crypto);
        // Unspecified fields fall back to defaults
        assert_eq!(params.delta_inlier, 10);
    }

    #[test]
    fn test_k_out_of_range() {
        let params = MapperParams {
            k: 17,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_proj_len_exceeds_h() {
        let params = MapperParams {
            h: 4,
            proj_len: 5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_k2_exceeds_window() {
        let params = MapperParams {
            k2: 64,
            ref_window_size: 50,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"[mapper]\nn_tables = 0\n").unwrap();
        assert!(parse_config(&config_path).is_err());
    }
}
