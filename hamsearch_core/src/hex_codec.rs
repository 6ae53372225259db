const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Returns the two lowercase ASCII hex digits of `byte`, high nibble first.
#[inline]
pub fn encode_byte(byte: u8) -> [u8; 2] {
    [
        HEX_DIGITS[(byte >> 4) as usize],
        HEX_DIGITS[(byte & 0x0f) as usize],
    ]
}

/// Writes the lowercase hex encoding of `bytes` into `out`.
///
/// # Panics
/// If `out` is not exactly twice as long as `bytes`.
pub fn encode_into(bytes: &[u8], out: &mut [u8]) {
    assert_eq!(
        out.len(),
        bytes.len() * 2,
        "hex output buffer must be twice the input length"
    );
    for (byte, pair) in bytes.iter().zip(out.chunks_exact_mut(2)) {
        pair.copy_from_slice(&encode_byte(*byte));
    }
}

/// Encodes `bytes` as a lowercase hex string of length `2 * bytes.len()`.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let [hi, lo] = encode_byte(*byte);
        out.push(hi as char);
        out.push(lo as char);
    }
    out
}

/// Decodes hex text (either case) back into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(text.trim())
}
