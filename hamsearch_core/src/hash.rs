use serde::Deserialize;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_512, Shake256};
use thiserror::Error;

/// Recognised failures of a hash backend.
///
/// Both are conceptually non-transient: the same request fails the same way
/// every time, so callers treat them as terminal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashError {
    /// Generic failure, e.g. a message length the backend cannot process.
    #[error("FAIL")]
    Fail,
    /// The requested output length is not supported by the backend.
    #[error("BAD_HASHLEN")]
    BadHashLen,
}

/// A hash capability computing an `output_bits`-bit digest over the first
/// `message_bits` bits of `message`.
///
/// This is the only seam between the search core and the hash algorithm. The
/// search never looks inside an implementation; it relies only on this
/// contract:
///
/// * `digest.len()` is exactly `output_bits / 8`. Passing any other buffer is a
///   programming error and implementations panic.
/// * On success the whole of `digest` has been overwritten.
/// * On failure one of the two [`HashError`] kinds is returned and `digest`
///   contents are unspecified.
pub trait HashFunction: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn hash(
        &self,
        output_bits: usize,
        message: &[u8],
        message_bits: usize,
        digest: &mut [u8],
    ) -> Result<(), HashError>;
}

/// Checks the message length arguments shared by every bundled backend and
/// returns the bytes to hash. Only whole-byte messages are supported.
fn message_bytes(message: &[u8], message_bits: usize) -> Result<&[u8], HashError> {
    if message_bits % 8 != 0 || message_bits / 8 > message.len() {
        return Err(HashError::Fail);
    }
    Ok(&message[..message_bits / 8])
}

fn check_digest_buffer(output_bits: usize, digest: &[u8]) {
    assert_eq!(
        digest.len() * 8,
        output_bits,
        "digest buffer of {} bytes does not hold a {}-bit digest",
        digest.len(),
        output_bits
    );
}

/// SHAKE256 squeezed to any positive whole number of bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Shake256Hash;

impl HashFunction for Shake256Hash {
    fn name(&self) -> &'static str {
        "shake256"
    }

    fn hash(
        &self,
        output_bits: usize,
        message: &[u8],
        message_bits: usize,
        digest: &mut [u8],
    ) -> Result<(), HashError> {
        if output_bits == 0 || output_bits % 8 != 0 {
            return Err(HashError::BadHashLen);
        }
        check_digest_buffer(output_bits, digest);
        let bytes = message_bytes(message, message_bits)?;

        let mut hasher = Shake256::default();
        Update::update(&mut hasher, bytes);
        let mut reader = hasher.finalize_xof();
        reader.read(digest);
        Ok(())
    }
}

/// SHA3-512; only a 512-bit output is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha3_512Hash;

impl HashFunction for Sha3_512Hash {
    fn name(&self) -> &'static str {
        "sha3-512"
    }

    fn hash(
        &self,
        output_bits: usize,
        message: &[u8],
        message_bits: usize,
        digest: &mut [u8],
    ) -> Result<(), HashError> {
        if output_bits != 512 {
            return Err(HashError::BadHashLen);
        }
        check_digest_buffer(output_bits, digest);
        let bytes = message_bytes(message, message_bits)?;

        let out = <Sha3_512 as Digest>::digest(bytes);
        digest.copy_from_slice(out.as_slice());
        Ok(())
    }
}

/// MD5; only a 128-bit output is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Hash;

impl HashFunction for Md5Hash {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn hash(
        &self,
        output_bits: usize,
        message: &[u8],
        message_bits: usize,
        digest: &mut [u8],
    ) -> Result<(), HashError> {
        if output_bits != 128 {
            return Err(HashError::BadHashLen);
        }
        check_digest_buffer(output_bits, digest);
        let bytes = message_bytes(message, message_bits)?;

        digest.copy_from_slice(&md5::compute(bytes).0);
        Ok(())
    }
}

/// Selects one of the bundled [`HashFunction`] backends.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    #[default]
    Shake256,
    #[serde(rename = "sha3-512")]
    Sha3_512,
    Md5,
}

impl HashAlgorithm {
    pub fn build(self) -> Box<dyn HashFunction> {
        match self {
            HashAlgorithm::Shake256 => Box::new(Shake256Hash),
            HashAlgorithm::Sha3_512 => Box::new(Sha3_512Hash),
            HashAlgorithm::Md5 => Box::new(Md5Hash),
        }
    }
}

impl<H: HashFunction + ?Sized> HashFunction for Box<H> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn hash(
        &self,
        output_bits: usize,
        message: &[u8],
        message_bits: usize,
        digest: &mut [u8],
    ) -> Result<(), HashError> {
        (**self).hash(output_bits, message, message_bits, digest)
    }
}
