//! Nucleotide encoding utilities.
//!
//! This module provides:
//! - 2-bit packing of short k-mers into a `u32` (ambiguity-aware)
//! - Reverse complement of ASCII sequences
//! - Hamming distance over 64-bit fingerprints

/// Lookup table for base -> 2-bit code conversion.
/// A -> 0, C -> 1, G -> 2, T -> 3, anything else -> u8::MAX (ambiguous).
pub(crate) const BASE_TO_CODE_LUT: [u8; 256] = {
    let mut lut = [u8::MAX; 256];
    lut[b'A' as usize] = 0;
    lut[b'a' as usize] = 0;
    lut[b'C' as usize] = 1;
    lut[b'c' as usize] = 1;
    lut[b'G' as usize] = 2;
    lut[b'g' as usize] = 2;
    lut[b'T' as usize] = 3;
    lut[b't' as usize] = 3;
    lut
};

/// Lookup table for base -> complement base (ASCII, uppercased).
/// Ambiguous bases map to 'N'.
const COMPLEMENT_LUT: [u8; 256] = {
    let mut lut = [b'N'; 256];
    lut[b'A' as usize] = b'T';
    lut[b'a' as usize] = b'T';
    lut[b'C' as usize] = b'G';
    lut[b'c' as usize] = b'G';
    lut[b'G' as usize] = b'C';
    lut[b'g' as usize] = b'C';
    lut[b'T' as usize] = b'A';
    lut[b't' as usize] = b'A';
    lut
};

/// Convert a nucleotide base to its 2-bit code, or `u8::MAX` if ambiguous.
#[inline(always)]
pub fn base_to_code(byte: u8) -> u8 {
    // The table covers all 256 byte values.
    unsafe { *BASE_TO_CODE_LUT.get_unchecked(byte as usize) }
}

/// Returns true if the byte is one of A/C/G/T (case insensitive).
#[inline(always)]
pub fn is_unambiguous(byte: u8) -> bool {
    base_to_code(byte) != u8::MAX
}

/// Pack a k-mer (k <= 16) into a `u32`, 2 bits per base.
///
/// Returns `None` if the window contains an ambiguous base.
#[inline]
pub fn pack_kmer(kmer: &[u8]) -> Option<u32> {
    debug_assert!(kmer.len() <= 16);
    let mut packed: u32 = 0;
    for &b in kmer {
        let code = base_to_code(b);
        if code == u8::MAX {
            return None;
        }
        packed = (packed << 2) | code as u32;
    }
    Some(packed)
}

/// Compute the reverse complement of an ASCII sequence.
///
/// Ambiguous bases stay ambiguous ('N'); the output is uppercased.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| COMPLEMENT_LUT[b as usize])
        .collect()
}

/// Hamming distance between two 64-bit fingerprints.
#[inline]
pub fn hamming_dist(h1: u64, h2: u64) -> u32 {
    (h1 ^ h2).count_ones()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_to_code() {
        assert_eq!(base_to_code(b'A'), 0);
        assert_eq!(base_to_code(b'c'), 1);
        assert_eq!(base_to_code(b'G'), 2);
        assert_eq!(base_to_code(b't'), 3);
        assert_eq!(base_to_code(b'N'), u8::MAX);
        assert_eq!(base_to_code(b'X'), u8::MAX);
    }

    #[test]
    fn test_pack_kmer() {
        // ACGT -> 00 01 10 11
        assert_eq!(pack_kmer(b"ACGT"), Some(0b00011011));
        assert_eq!(pack_kmer(b"AAAA"), Some(0));
        assert_eq!(pack_kmer(b"ACNT"), None);
    }

    #[test]
    fn test_pack_kmer_case_insensitive() {
        assert_eq!(pack_kmer(b"acgt"), pack_kmer(b"ACGT"));
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AACC"), b"GGTT".to_vec());
        assert_eq!(reverse_complement(b"AANT"), b"ANTT".to_vec());
    }

    #[test]
    fn test_reverse_complement_involution() {
        let seq = b"ACGTTGCAGGTACCA";
        assert_eq!(reverse_complement(&reverse_complement(seq)), seq.to_vec());
    }

    #[test]
    fn test_hamming_dist_symmetric_and_zero() {
        let xs = [0u64, 0xFFFF_FFFF_FFFF_FFFF, 0xDEAD_BEEF_0123_4567];
        for &x in &xs {
            assert_eq!(hamming_dist(x, x), 0);
            for &y in &xs {
                assert_eq!(hamming_dist(x, y), hamming_dist(y, x));
            }
        }
        assert_eq!(hamming_dist(0b1010, 0b0101), 4);
    }
}
