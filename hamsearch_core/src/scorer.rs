use crate::hash::{HashError, HashFunction};

/// Number of differing bits between two equal-length byte sequences.
///
/// Works eight bytes at a time and falls back to single bytes for the tail.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len(), "hamming distance needs equal lengths");

    let mut a_words = a.chunks_exact(8);
    let mut b_words = b.chunks_exact(8);
    let mut distance = 0u32;

    for (wa, wb) in a_words.by_ref().zip(b_words.by_ref()) {
        let wa = u64::from_ne_bytes(wa.try_into().expect("chunks_exact yields 8 bytes"));
        let wb = u64::from_ne_bytes(wb.try_into().expect("chunks_exact yields 8 bytes"));
        distance += (wa ^ wb).count_ones();
    }
    for (ba, bb) in a_words.remainder().iter().zip(b_words.remainder()) {
        distance += (ba ^ bb).count_ones();
    }
    distance
}

/// Hashes candidate texts and measures how far each digest is from a fixed
/// target.
///
/// The scorer owns a single digest buffer that every call overwrites; the
/// digest of the most recent successful call is available from [`Scorer::digest`].
pub struct Scorer<H: HashFunction> {
    hasher: H,
    target: Box<[u8]>,
    output_bits: usize,
    digest: Box<[u8]>,
}

impl<H: HashFunction> Scorer<H> {
    /// # Panics
    /// If `target` is not exactly `output_bits / 8` bytes long. Configuration
    /// validation guarantees this for configured targets.
    pub fn new(hasher: H, target: Vec<u8>, output_bits: usize) -> Self {
        assert_eq!(
            target.len() * 8,
            output_bits,
            "target digest length must match the output bit length"
        );
        let digest = vec![0u8; target.len()].into_boxed_slice();
        Self {
            hasher,
            target: target.into_boxed_slice(),
            output_bits,
            digest,
        }
    }

    /// Hashes `candidate` and returns its Hamming distance to the target.
    pub fn score(&mut self, candidate: &[u8]) -> Result<u32, HashError> {
        self.hasher.hash(
            self.output_bits,
            candidate,
            candidate.len() * 8,
            &mut self.digest,
        )?;
        Ok(hamming_distance(&self.digest, &self.target))
    }

    /// Digest produced by the last call to [`Scorer::score`].
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn output_bits(&self) -> usize {
        self.output_bits
    }

    pub fn hasher_name(&self) -> &'static str {
        self.hasher.name()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hash::{Md5Hash, Shake256Hash};
    use std::cell::Cell;

    /// Hash double returning a fixed digest for one particular message and the
    /// all-ones digest for everything else.
    pub(crate) struct FixedDigestHash {
        pub matching_message: Vec<u8>,
        pub matching_digest: Vec<u8>,
        pub calls: Cell<u64>,
    }

    impl HashFunction for FixedDigestHash {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn hash(
            &self,
            _output_bits: usize,
            message: &[u8],
            _message_bits: usize,
            digest: &mut [u8],
        ) -> Result<(), HashError> {
            self.calls.set(self.calls.get() + 1);
            if message == self.matching_message.as_slice() {
                digest.copy_from_slice(&self.matching_digest);
            } else {
                digest.fill(0xff);
            }
            Ok(())
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_identity() {
        let a: Vec<u8> = (0u8..128).map(|b| b.wrapping_mul(13)).collect();
        let b: Vec<u8> = (0u8..128).map(|b| b.wrapping_mul(71) ^ 0x5a).collect();

        assert_eq!(hamming_distance(&a, &b), hamming_distance(&b, &a));
        assert_eq!(hamming_distance(&a, &a), 0);
        assert_eq!(hamming_distance(&b, &b), 0);
    }

    #[test]
    fn distance_counts_bits_in_words_and_tail() {
        let zeros = [0u8; 11];
        let mut ones = [0xffu8; 11];
        assert_eq!(hamming_distance(&zeros, &ones), 88, "All bits differ");

        ones[3] = 0;
        ones[10] = 0b0000_0001;
        assert_eq!(hamming_distance(&zeros, &ones), 88 - 8 - 7);
    }

    #[test]
    fn word_wise_distance_agrees_with_a_byte_wise_count_at_every_length() {
        let a: Vec<u8> = (0u8..40).map(|b| b.wrapping_mul(37).rotate_left(3)).collect();
        let b: Vec<u8> = (0u8..40).map(|b| b.wrapping_mul(101) ^ 0xc3).collect();

        for len in 0..=a.len() {
            let expected: u32 = a[..len]
                .iter()
                .zip(&b[..len])
                .map(|(x, y)| (x ^ y).count_ones())
                .sum();
            assert_eq!(
                hamming_distance(&a[..len], &b[..len]),
                expected,
                "Length {len}"
            );
        }
    }

    #[test]
    fn distance_is_bounded_by_the_target_bit_length() {
        let target = [0x5bu8, 0x4d, 0xa9, 0x5f, 0x5f, 0xa0, 0x82, 0x80, 0xfc];
        for fill in [0x00u8, 0x0f, 0xa5, 0xff] {
            let digest = [fill; 9];
            let d = hamming_distance(&digest, &target);
            assert!(d <= 8 * target.len() as u32, "Distance {d} out of range");
        }
    }

    #[test]
    fn score_reports_zero_for_an_exact_match() {
        let candidate = b"00000000000000000000000000000000".to_vec();
        let hasher = FixedDigestHash {
            matching_message: candidate.clone(),
            matching_digest: vec![0u8; 128],
            calls: Cell::new(0),
        };
        let mut scorer = Scorer::new(hasher, vec![0u8; 128], 1024);

        assert_eq!(scorer.score(&candidate).unwrap(), 0);
        assert!(scorer.digest().iter().all(|b| *b == 0));

        assert_eq!(scorer.score(b"something else").unwrap(), 1024);
        assert!(scorer.digest().iter().all(|b| *b == 0xff));
    }

    #[test]
    fn score_hashes_the_candidate_with_a_real_backend() {
        let mut expected = [0u8; 16];
        Md5Hash.hash(128, b"abc", 24, &mut expected).unwrap();

        let mut scorer = Scorer::new(Md5Hash, expected.to_vec(), 128);
        assert_eq!(scorer.score(b"abc").unwrap(), 0);
        assert!(scorer.score(b"abd").unwrap() > 0);
        assert_eq!(scorer.hasher_name(), "md5");
    }

    #[test]
    fn score_propagates_recognised_hash_failures() {
        let mut scorer = Scorer::new(crate::hash::Sha3_512Hash, vec![0u8; 128], 1024);
        assert_eq!(scorer.score(b"abc"), Err(HashError::BadHashLen));
    }

    #[test]
    #[should_panic(expected = "target digest length")]
    fn new_rejects_a_target_of_the_wrong_length() {
        let _ = Scorer::new(Shake256Hash, vec![0u8; 64], 1024);
    }
}
