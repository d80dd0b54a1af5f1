//! Human-readable account identifiers.
//!
//! Substrate chains with 32-byte account ids render them as SS58 strings;
//! chains with Ethereum-style 20-byte ids (or without a registered prefix)
//! use plain `0x`-prefixed hex.

use blake2::{Blake2b512, Digest};

const SS58_CONTEXT: &[u8] = b"SS58PRE";

/// Encode raw account bytes with the given SS58 network prefix.
///
/// Prefixes above 16383 are outside the SS58 format and fall back to hex.
pub fn ss58_encode(prefix: u16, account: &[u8]) -> String {
    let mut data = match prefix {
        0..=63 => vec![prefix as u8],
        64..=16_383 => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first, second]
        }
        _ => return hex_encode(account),
    };
    data.extend_from_slice(account);

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CONTEXT);
    hasher.update(&data);
    let checksum = hasher.finalize();

    let checksum_len = match account.len() {
        1 | 2 | 4 | 8 => 1,
        _ => 2,
    };
    data.extend_from_slice(&checksum[..checksum_len]);

    bs58::encode(data).into_string()
}

pub fn hex_encode(account: &[u8]) -> String {
    format!("0x{}", hex::encode(account))
}
