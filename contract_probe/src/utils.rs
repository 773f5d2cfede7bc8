use ethers::{types::Address, utils::to_checksum};

use crate::errors::ProbeError;

/// Parse a `0x`-prefixed (or bare) hex string into a 32 byte storage word.
/// Shorter inputs are left padded with zeros, as the EVM does for addresses.
pub fn parse_word(hex_str: &str) -> Result<[u8; 32], ProbeError> {
    let digits = hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str);

    if digits.is_empty() || digits.len() > 64 {
        return Err(ProbeError::InvalidWord(hex_str.to_owned()));
    }

    // odd length is allowed, hex::decode is not
    let padded = format!("{digits:0>64}");
    let bytes = hex::decode(padded).map_err(|_| ProbeError::InvalidWord(hex_str.to_owned()))?;

    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

/// The address a word decodes to: its 20 trailing bytes.
pub fn word_to_address(word: &[u8; 32]) -> Address {
    Address::from_slice(&word[12..])
}

pub fn address_to_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// EIP-55 rendering, the way JS tooling prints addresses.
pub fn display_address(address: &Address) -> String {
    to_checksum(address, None)
}
