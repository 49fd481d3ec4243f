//! DRY utilities shared across the template and transaction builders.

use bitcoin_hashes::{sha256, Hash};

/// Hashes an arbitrary byte string into a 32-byte digest. Every address in
/// this crate - multisig, logic-signature, individual account - is
/// ultimately a digest produced by this function, so that distinct inputs
/// are guaranteed (up to collision resistance) to produce distinct
/// addresses (P3 Address commitment).
pub fn hash32(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).into_inner()
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = (chunk[0] as char).to_digit(16)?;
        let lo = (chunk[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}
