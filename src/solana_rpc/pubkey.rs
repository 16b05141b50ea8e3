use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// 32-byte account address, rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, BorshSerialize, BorshDeserialize)]
pub struct Pubkey(pub [u8; 32]);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParsePubkeyError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),
    #[error("expected 32 bytes, got {0}")]
    WrongSize(usize),
}

impl Pubkey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn token_2022_program() -> Self {
        TOKEN_2022_PROGRAM_ID
            .parse()
            .unwrap_or_default()
    }
}

impl FromStr for Pubkey {
    type Err = ParsePubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParsePubkeyError::InvalidBase58(format!("{:?}", e)))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParsePubkeyError::WrongSize(bytes.len()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_round_trips_known_program_id() {
        let key: Pubkey = TOKEN_2022_PROGRAM_ID.parse().unwrap();
        assert_eq!(key.to_string(), TOKEN_2022_PROGRAM_ID);
        assert_eq!(Pubkey::token_2022_program(), key);
    }

    #[test]
    fn system_program_is_all_zeroes() {
        let key: Pubkey = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(key, Pubkey::default());
    }

    #[test]
    fn rejects_short_and_invalid_keys() {
        assert!(matches!("abc".parse::<Pubkey>(), Err(ParsePubkeyError::WrongSize(_))));
        assert!(matches!("0OIl".parse::<Pubkey>(), Err(ParsePubkeyError::InvalidBase58(_))));
    }
}
