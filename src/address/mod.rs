//! Address codec - raw wallet address encodings to canonical display form.
//!
//! Wallets hand out addresses as hex (CIP-30 CBOR bytes, the common case) or
//! base64 (some providers). The canonical form is the bech32 text encoding
//! users recognise (`addr1...`, `addr_test1...`, `stake1...`), or base58 for
//! legacy Byron addresses.
//!
//! | Header type | Kind | Canonical form |
//! |-------------|------|----------------|
//! | 0-3 | base (payment + stake) | `addr` / `addr_test` |
//! | 4-5 | pointer | `addr` / `addr_test` |
//! | 6-7 | enterprise | `addr` / `addr_test` |
//! | 8 | Byron | base58 |
//! | 14-15 | reward | `stake` / `stake_test` |

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bech32::{ToBase32, Variant};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AmdtelError, AmdtelResult};

/// Network id carried in the low header nibble for mainnet.
pub const MAINNET_NETWORK_ID: u8 = 1;

const HASH_LEN: usize = 28;
const BASE_LEN: usize = 1 + HASH_LEN * 2;
const ENTERPRISE_LEN: usize = 1 + HASH_LEN;
const REWARD_LEN: usize = 1 + HASH_LEN;
// Header + payment hash + at least one byte for each of the three pointer varints.
const POINTER_MIN_LEN: usize = 1 + HASH_LEN + 3;

static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("static regex"));
static MAINNET_ADDR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^addr1[a-z0-9]{98}$").expect("static regex"));

/// Address kind, from the high header nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Base,
    Pointer,
    Enterprise,
    Byron,
    Reward,
}

impl AddressKind {
    fn from_header(header: u8) -> Option<Self> {
        match header >> 4 {
            0..=3 => Some(AddressKind::Base),
            4 | 5 => Some(AddressKind::Pointer),
            6 | 7 => Some(AddressKind::Enterprise),
            8 => Some(AddressKind::Byron),
            14 | 15 => Some(AddressKind::Reward),
            _ => None,
        }
    }

    fn length_ok(&self, len: usize) -> bool {
        match self {
            AddressKind::Base => len == BASE_LEN,
            AddressKind::Pointer => len >= POINTER_MIN_LEN,
            AddressKind::Enterprise => len == ENTERPRISE_LEN,
            AddressKind::Reward => len == REWARD_LEN,
            AddressKind::Byron => len > 1,
        }
    }

    fn hrp(&self, network_id: u8) -> &'static str {
        let mainnet = network_id == MAINNET_NETWORK_ID;
        match (self, mainnet) {
            (AddressKind::Reward, true) => "stake",
            (AddressKind::Reward, false) => "stake_test",
            (_, true) => "addr",
            (_, false) => "addr_test",
        }
    }
}

/// Canonical display form of `raw`, or `raw` itself when it cannot be decoded.
///
/// Never fails: decoding problems degrade to showing the transport encoding.
pub fn to_canonical_form(raw: &str) -> String {
    match try_canonical_form(raw) {
        Ok(canonical) => canonical,
        Err(e) => {
            tracing::debug!(error = %e, "address kept in raw form");
            raw.to_string()
        }
    }
}

/// Fallible variant of [`to_canonical_form`].
pub fn try_canonical_form(raw: &str) -> AmdtelResult<String> {
    let bytes = decode_raw(raw)?;
    encode_canonical(&bytes)
}

/// Hex when the input is even-length hex, base64 otherwise.
pub fn decode_raw(raw: &str) -> AmdtelResult<Vec<u8>> {
    if raw.is_empty() {
        return Err(AmdtelError::AddressDecoding("empty address".into()));
    }
    if HEX_RE.is_match(raw) && raw.len() % 2 == 0 {
        hex::decode(raw).map_err(|e| AmdtelError::AddressDecoding(format!("hex: {e}")))
    } else {
        BASE64
            .decode(raw)
            .map_err(|e| AmdtelError::AddressDecoding(format!("base64: {e}")))
    }
}

/// Re-encode decoded address bytes in canonical text form.
pub fn encode_canonical(bytes: &[u8]) -> AmdtelResult<String> {
    let header = *bytes
        .first()
        .ok_or_else(|| AmdtelError::AddressDecoding("empty payload".into()))?;
    let kind = AddressKind::from_header(header)
        .ok_or_else(|| AmdtelError::AddressDecoding(format!("unknown header type {}", header >> 4)))?;
    if !kind.length_ok(bytes.len()) {
        return Err(AmdtelError::AddressDecoding(format!(
            "{:?} address with invalid length {}",
            kind,
            bytes.len()
        )));
    }
    if kind == AddressKind::Byron {
        return Ok(bs58::encode(bytes).into_string());
    }
    bech32::encode(kind.hrp(header & 0x0f), bytes.to_base32(), Variant::Bech32)
        .map_err(|e| AmdtelError::AddressDecoding(format!("bech32: {e}")))
}

/// Mainnet base address check (`addr1` followed by 98 bech32 characters).
pub fn is_valid_address(address: &str) -> bool {
    MAINNET_ADDR_RE.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_address(network_id: u8) -> Vec<u8> {
        let mut bytes = vec![network_id & 0x0f];
        bytes.extend_from_slice(&[0x11; HASH_LEN]);
        bytes.extend_from_slice(&[0x22; HASH_LEN]);
        bytes
    }

    #[test]
    fn hex_mainnet_base_address_is_bech32() {
        let raw = hex::encode(base_address(1));
        let canonical = to_canonical_form(&raw);
        assert!(canonical.starts_with("addr1"), "{canonical}");
        // 57 bytes -> 92 base32 chars after "addr1" + 6 checksum chars
        assert_eq!(canonical.len(), "addr1".len() + 92 + 6);
        assert!(is_valid_address(&canonical));
    }

    #[test]
    fn testnet_uses_test_prefix() {
        let raw = hex::encode(base_address(0));
        assert!(to_canonical_form(&raw).starts_with("addr_test1"));
    }

    #[test]
    fn base64_input_is_decoded() {
        let bytes = base_address(1);
        let from_hex = to_canonical_form(&hex::encode(&bytes));
        let from_b64 = to_canonical_form(&BASE64.encode(&bytes));
        assert_eq!(from_hex, from_b64);
    }

    #[test]
    fn reward_address_uses_stake_prefix() {
        let mut bytes = vec![0xe1];
        bytes.extend_from_slice(&[0x33; HASH_LEN]);
        assert!(to_canonical_form(&hex::encode(&bytes)).starts_with("stake1"));
        bytes[0] = 0xe0;
        assert!(to_canonical_form(&hex::encode(&bytes)).starts_with("stake_test1"));
    }

    #[test]
    fn byron_address_is_base58() {
        let bytes = vec![0x82, 0xd8, 0x18, 0x58, 0x21, 0x83];
        let canonical = to_canonical_form(&hex::encode(&bytes));
        assert_eq!(canonical, bs58::encode(&bytes).into_string());
    }

    #[test]
    fn malformed_input_is_returned_unchanged() {
        for raw in ["", "not an address!", "abc", "zz", "0000", "addr_test1qqqq"] {
            assert_eq!(to_canonical_form(raw), raw);
        }
    }

    #[test]
    fn wrong_length_is_a_decoding_error() {
        let mut bytes = base_address(1);
        bytes.pop();
        let err = try_canonical_form(&hex::encode(&bytes)).unwrap_err();
        assert!(matches!(err, AmdtelError::AddressDecoding(_)));
    }

    #[test]
    fn unknown_header_type_is_a_decoding_error() {
        let mut bytes = base_address(1);
        bytes[0] = 0x91;
        assert!(try_canonical_form(&hex::encode(&bytes)).is_err());
    }

    #[test]
    fn validation_rejects_short_or_testnet() {
        assert!(!is_valid_address("addr1short"));
        assert!(!is_valid_address(&format!("addr_test1{}", "q".repeat(98))));
        assert!(is_valid_address(&format!("addr1{}", "q".repeat(98))));
    }
}
