//! Ledger types shared across the crate.
//!
//! `Address` and `U256` come from `alloy-primitives`. Ids and payloads are
//! local newtypes that render as `0x`-prefixed lowercase hex, both in
//! `Display` and in serde, so the persisted state file stays
//! human-inspectable and ids can be copied straight into a block explorer.

use crate::error::{Result, TimelockError};
use alloy_primitives::hex;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub use alloy_primitives::{Address, U256};

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode `0x`-prefixed (or bare) hex into bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s.trim())).map_err(|_| TimelockError::InvalidHex(s.to_string()))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode_prefixed(bytes)
}

/// Parse a 20-byte address; case-insensitive, checksum not enforced.
pub fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim()).map_err(|_| TimelockError::InvalidAddress(s.to_string()))
}

// ---------------------------------------------------------------------------
// ActionId
// ---------------------------------------------------------------------------

/// Content-addressed identifier of a governance action (32 bytes).
///
/// Ordering is byte-wise, which is what the Executor uses for its
/// deterministic submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub [u8; 32]);

impl ActionId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 10 hex characters after `0x`, for tables.
    pub fn short(&self) -> String {
        let full = self.to_string();
        full[..12].to_string()
    }
}

impl FromStr for ActionId {
    type Err = TimelockError;
    fn from_str(s: &str) -> Result<Self> {
        let raw = strip_0x(s.trim());
        if raw.len() != 64 {
            return Err(TimelockError::InvalidHex(s.to_string()));
        }
        let out = hex::decode_to_array(raw).map_err(|_| TimelockError::InvalidHex(s.to_string()))?;
        Ok(ActionId(out))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}

impl Serialize for ActionId {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Opaque encoded invocation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload(v)
    }
}

impl FromStr for Payload {
    type Err = TimelockError;
    fn from_str(s: &str) -> Result<Self> {
        decode_hex(s).map(Payload)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(&self.0))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Wei values and labels
// ---------------------------------------------------------------------------

/// Parse a wei amount: decimal, or `0x`-prefixed hex, up to 2^256 - 1.
pub fn parse_value(s: &str) -> Result<U256> {
    s.trim()
        .parse::<U256>()
        .map_err(|_| TimelockError::InvalidValue(s.to_string()))
}

/// Serde adapter storing a `U256` wei amount as a decimal string, so JSON
/// readers without big-integer support see the exact value.
pub mod wei_string {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let s = String::deserialize(d)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("valid regex"))
}

pub fn validate_label(label: &str) -> Result<()> {
    if label_re().is_match(label) {
        Ok(())
    } else {
        Err(TimelockError::InvalidLabel(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parse_is_case_insensitive() {
        let a = parse_address("0xAbCdEf0000000000000000000000000000000001").unwrap();
        let lower = parse_address("0xabcdef0000000000000000000000000000000001").unwrap();
        let bare = parse_address("abcdef0000000000000000000000000000000001").unwrap();
        assert_eq!(a, lower);
        assert_eq!(a, bare);
    }

    #[test]
    fn address_rejects_wrong_width() {
        for bad in ["0x1234", "0xzz00000000000000000000000000000000000000"] {
            let err = parse_address(bad).unwrap_err();
            assert!(matches!(err, TimelockError::InvalidAddress(_)), "{err}");
        }
    }

    #[test]
    fn action_id_serializes_as_json_map_key() {
        let id = ActionId([7u8; 32]);
        let mut map = std::collections::BTreeMap::new();
        map.insert(id, 1u8);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains(&id.to_string()));
        let back: std::collections::BTreeMap<ActionId, u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&id), Some(&1));
    }

    #[test]
    fn short_id_keeps_prefix() {
        let id = ActionId([0xab; 32]);
        assert_eq!(id.short(), "0xababababab");
    }

    #[test]
    fn payload_accepts_empty_hex() {
        let p: Payload = "0x".parse().unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn labels() {
        assert!(validate_label("whitelistTokenX").is_ok());
        assert!(validate_label("set-price-feed:usdc.v2").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("has space").is_err());
    }

    #[test]
    fn value_parse() {
        assert_eq!(parse_value("1000000000000000000").unwrap(), U256::from(10u128.pow(18)));
        assert_eq!(parse_value("0x10").unwrap(), U256::from(16));
        assert!(parse_value("-1").is_err());
    }

    #[test]
    fn value_covers_full_word() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_value(max).unwrap(), U256::MAX);
        assert!(parse_value(&format!("{max}0")).is_err());
    }

    #[test]
    fn wei_string_keeps_values_above_u128() {
        #[derive(Serialize, Deserialize)]
        struct W(#[serde(with = "wei_string")] U256);
        let json = serde_json::to_string(&W(U256::MAX)).unwrap();
        assert!(json.starts_with("\"1157920892"), "{json}");
        let back: W = serde_json::from_str(&json).unwrap();
        assert_eq!(back.0, U256::MAX);
    }
}
