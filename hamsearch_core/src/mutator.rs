use crate::hash::{HashError, HashFunction};
use crate::hex_codec;
use crate::scorer::Scorer;
use std::borrow::Cow;
use std::io::{self, Read};

/// A fixed-size block of raw bytes read from the input source.
///
/// A chunk's contents live for exactly one mutation pass: the pass consumes the
/// chunk, complements every byte once, and hands it back so the buffer can be
/// refilled for the next read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    bytes: Box<[u8]>,
}

impl Chunk {
    /// Creates a zero-filled chunk of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Overwrites the whole chunk with the next `len()` bytes of `source`.
    ///
    /// Anything short of a full chunk is an error; a partially filled chunk is
    /// never exposed.
    pub fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<()> {
        source.read_exact(&mut self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }
}

/// Walks the single-byte complement neighbourhood of one chunk.
///
/// The first candidate is the hex encoding of the chunk as read. After the
/// candidate at position `i` has been handed out, the next call complements
/// byte `i` and rewrites only the two hex digits that encode it, so step `i + 1`
/// sees bytes `0..=i` complemented and the rest untouched. A chunk of `N` bytes
/// yields exactly `N` candidates; once the pass is exhausted every byte has
/// been complemented exactly once.
#[derive(Debug)]
pub struct MutationPass {
    chunk: Chunk,
    candidate: Box<[u8]>,
    next_position: usize,
    pending_flip: Option<usize>,
}

impl MutationPass {
    pub fn new(chunk: Chunk) -> Self {
        let mut candidate = vec![0u8; chunk.len() * 2].into_boxed_slice();
        hex_codec::encode_into(chunk.as_bytes(), &mut candidate);
        Self {
            chunk,
            candidate,
            next_position: 0,
            pending_flip: None,
        }
    }

    fn apply_pending_flip(&mut self) {
        if let Some(position) = self.pending_flip.take() {
            let flipped = !self.chunk.bytes[position];
            self.chunk.bytes[position] = flipped;
            self.candidate[position * 2..position * 2 + 2]
                .copy_from_slice(&hex_codec::encode_byte(flipped));
        }
    }

    /// Returns the next position and the candidate text to hash for it, or
    /// `None` once all positions have been visited.
    pub fn next_candidate(&mut self) -> Option<(usize, &[u8])> {
        self.apply_pending_flip();
        if self.next_position >= self.chunk.len() {
            return None;
        }
        let position = self.next_position;
        self.next_position += 1;
        self.pending_flip = Some(position);
        Some((position, &self.candidate[..]))
    }

    /// Number of candidates still to be produced.
    pub fn remaining(&self) -> usize {
        self.chunk.len() - self.next_position
    }

    /// Completes the pass and returns the chunk, fully complemented.
    ///
    /// Positions that were not visited yet are complemented here, so the
    /// returned chunk is the same regardless of how far the pass was driven.
    pub fn finish(mut self) -> Chunk {
        while self.next_candidate().is_some() {}
        self.chunk
    }
}

/// One scored step of a mutation pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub position: usize,
    pub distance: u32,
    pub candidate: &'a [u8],
    pub digest: &'a [u8],
}

impl ScoredCandidate<'_> {
    /// The candidate as text. Candidates are always ASCII hex.
    pub fn candidate_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.candidate)
    }
}

/// A [`MutationPass`] bound to a [`Scorer`]: every step hashes the current
/// candidate before the pass advances.
pub struct ScoredPass<'s, H: HashFunction> {
    pass: MutationPass,
    scorer: &'s mut Scorer<H>,
}

impl<'s, H: HashFunction> ScoredPass<'s, H> {
    /// Scores the next candidate. Returns `None` when the pass is exhausted.
    ///
    /// The returned borrow ends before the next call, which is what lets the
    /// candidate and digest buffers be reused in place.
    pub fn next_scored(&mut self) -> Option<Result<ScoredCandidate<'_>, HashError>> {
        let (position, candidate) = self.pass.next_candidate()?;
        let distance = match self.scorer.score(candidate) {
            Ok(distance) => distance,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(ScoredCandidate {
            position,
            distance,
            candidate,
            digest: self.scorer.digest(),
        }))
    }

    /// See [`MutationPass::finish`].
    pub fn finish(self) -> Chunk {
        self.pass.finish()
    }
}

/// Starts a scored mutation pass over `chunk`.
pub fn mutate_and_score<H: HashFunction>(
    chunk: Chunk,
    scorer: &mut Scorer<H>,
) -> ScoredPass<'_, H> {
    ScoredPass {
        pass: MutationPass::new(chunk),
        scorer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Md5Hash;
    use crate::scorer::tests::FixedDigestHash;
    use std::cell::Cell;

    fn collect_candidates(chunk: Chunk) -> (Vec<String>, Chunk) {
        let mut pass = MutationPass::new(chunk);
        let mut seen = Vec::new();
        while let Some((position, candidate)) = pass.next_candidate() {
            assert_eq!(position, seen.len(), "Positions must be visited in order");
            seen.push(String::from_utf8(candidate.to_vec()).unwrap());
        }
        (seen, pass.finish())
    }

    #[test]
    fn zero_chunk_walks_the_documented_candidate_sequence() {
        let (seen, finished) = collect_candidates(Chunk::zeroed(4));

        assert_eq!(
            seen,
            vec!["00000000", "ff000000", "ffff0000", "ffffff00"],
            "Each step should see one more leading byte complemented"
        );
        assert_eq!(finished.as_bytes(), &[0xff; 4]);
    }

    #[test]
    fn every_byte_is_complemented_exactly_once() {
        let original: Vec<u8> = vec![0x00, 0x5b, 0xa0, 0xff, 0x13, 0x80, 0x7e, 0x01];
        let (seen, finished) = collect_candidates(Chunk::from(original.clone()));

        assert_eq!(seen.len(), original.len(), "One candidate per byte");
        assert_eq!(
            seen[0],
            hex_codec::encode(&original),
            "Step 0 scores the chunk as read"
        );
        let expected: Vec<u8> = original.iter().map(|b| !b).collect();
        assert_eq!(finished.as_bytes(), expected.as_slice());
    }

    #[test]
    fn each_step_rewrites_only_the_previous_byte() {
        let original: Vec<u8> = (1u8..=16).collect();
        let (seen, _) = collect_candidates(Chunk::from(original.clone()));

        for (step, window) in seen.windows(2).enumerate() {
            let (before, after) = (window[0].as_bytes(), window[1].as_bytes());
            for (i, (b, a)) in before.iter().zip(after).enumerate() {
                if i / 2 == step {
                    continue;
                }
                assert_eq!(b, a, "Only hex digits of byte {step} may change, offset {i} did");
            }
            let flipped = hex_codec::encode_byte(!original[step]);
            assert_eq!(&after[step * 2..step * 2 + 2], &flipped[..]);
        }
    }

    #[test]
    fn finish_completes_a_partially_driven_pass() {
        let mut pass = MutationPass::new(Chunk::from(vec![0x0f, 0xf0, 0xaa]));
        assert!(pass.next_candidate().is_some());
        assert_eq!(pass.remaining(), 2);
        assert_eq!(pass.finish().as_bytes(), &[0xf0, 0x0f, 0x55]);
    }

    #[test]
    fn empty_chunk_produces_no_candidates() {
        let (seen, finished) = collect_candidates(Chunk::zeroed(0));
        assert!(seen.is_empty());
        assert!(finished.is_empty());
    }

    #[test]
    fn fill_from_rejects_a_short_read() {
        let mut chunk = Chunk::zeroed(4);
        let mut source: &[u8] = &[1, 2, 3];
        let err = chunk.fill_from(&mut source).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut source: &[u8] = &[9, 8, 7, 6, 5];
        chunk.fill_from(&mut source).unwrap();
        assert_eq!(chunk.as_bytes(), &[9, 8, 7, 6]);
        assert_eq!(source, &[5], "Only one chunk should be consumed");
    }

    #[test]
    fn scored_pass_hashes_every_step_in_order() {
        let hasher = FixedDigestHash {
            matching_message: b"ff00".to_vec(),
            matching_digest: vec![0u8; 16],
            calls: Cell::new(0),
        };
        let mut scorer = Scorer::new(hasher, vec![0u8; 16], 128);

        let mut pass = mutate_and_score(Chunk::zeroed(2), &mut scorer);
        let mut steps = Vec::new();
        while let Some(step) = pass.next_scored() {
            let step = step.unwrap();
            steps.push((step.position, step.distance, step.candidate_text().into_owned()));
        }
        assert_eq!(pass.finish().as_bytes(), &[0xff, 0xff]);

        assert_eq!(
            steps,
            vec![(0, 128, "0000".to_string()), (1, 0, "ff00".to_string())]
        );
        assert_eq!(scorer.digest(), &[0u8; 16], "Digest of the last step is kept");
    }

    #[test]
    fn scored_pass_surfaces_hash_failures() {
        let mut scorer = Scorer::new(Md5Hash, vec![0u8; 16], 128);
        let mut pass = mutate_and_score(Chunk::zeroed(1), &mut scorer);
        assert!(matches!(pass.next_scored(), Some(Ok(_))));
        assert!(pass.next_scored().is_none());

        // sha3-512 cannot produce a 128-bit digest
        let mut scorer = Scorer::new(crate::hash::Sha3_512Hash, vec![0u8; 16], 128);
        let mut pass = mutate_and_score(Chunk::zeroed(1), &mut scorer);
        assert!(matches!(pass.next_scored(), Some(Err(HashError::BadHashLen))));
    }
}
