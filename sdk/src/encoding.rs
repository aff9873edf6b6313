//! `0x`-prefixed hex helpers used by meta-addresses and key exports

use crate::error::{Error, Result};

pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex, accepting an optional `0x` prefix
pub fn from_hex_prefixed(s: &str) -> Result<Vec<u8>> {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(stripped).map_err(|e| Error::InvalidHex(e.to_string()))
}
