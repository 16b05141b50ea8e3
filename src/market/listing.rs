use borsh::BorshDeserialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::solana_rpc::Pubkey;

const DISCRIMINATOR_LEN: usize = 8;
const LABEL_PREFIX_LEN: usize = 4;

/// A marketplace listing as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub address: Pubkey,
    pub seller: Pubkey,
    /// Price in the smallest on-chain unit.
    pub price: u64,
    pub mint: Pubkey,
    pub is_active: bool,
    pub collection: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub collection_category: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("account {address} is {len} bytes, too short for a listing")]
    TooShort { address: Pubkey, len: usize },
    #[error("account {0} does not carry the listing discriminator")]
    DiscriminatorMismatch(Pubkey),
    #[error("account {address} has a malformed {field}: {reason}")]
    Malformed {
        address: Pubkey,
        field: &'static str,
        reason: String,
    },
}

/// Turns raw account bytes into a [`Listing`]. The layout is owned by the
/// on-chain program, so the pipeline only ever sees this interface.
pub trait ListingDecoder: Send + Sync {
    fn decode(&self, address: Pubkey, data: &[u8]) -> Result<Listing, DecodeError>;
}

#[derive(BorshDeserialize)]
struct ListingHeader {
    seller: Pubkey,
    mint: Pubkey,
    price: u64,
    is_active: bool,
}

/// Decoder for the Anchor `Listing` account: an 8-byte account discriminator
/// followed by the Borsh encoded fields. The classification labels are
/// trailing Borsh strings; a label whose length runs past the end of the
/// record reads as empty, along with every label after it.
#[derive(Debug, Clone)]
pub struct AnchorListingDecoder {
    discriminator: [u8; DISCRIMINATOR_LEN],
}

impl Default for AnchorListingDecoder {
    fn default() -> Self {
        Self::for_account("Listing")
    }
}

impl AnchorListingDecoder {
    pub fn for_account(name: &str) -> Self {
        Self {
            discriminator: account_discriminator(name),
        }
    }

    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        self.discriminator
    }
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(format!("account:{}", name).as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

fn read_label(address: Pubkey, field: &'static str, buf: &mut &[u8]) -> Result<String, DecodeError> {
    if buf.len() < LABEL_PREFIX_LEN {
        *buf = &[];
        return Ok(String::new());
    }
    // bytes past the schema (bump, padding) do not form a complete label
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > buf.len() - LABEL_PREFIX_LEN {
        *buf = &[];
        return Ok(String::new());
    }
    <String as BorshDeserialize>::deserialize(buf).map_err(|e| DecodeError::Malformed {
        address,
        field,
        reason: e.to_string(),
    })
}

impl ListingDecoder for AnchorListingDecoder {
    fn decode(&self, address: Pubkey, data: &[u8]) -> Result<Listing, DecodeError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(DecodeError::TooShort { address, len: data.len() });
        }
        if data[..DISCRIMINATOR_LEN] != self.discriminator {
            return Err(DecodeError::DiscriminatorMismatch(address));
        }

        let mut buf = &data[DISCRIMINATOR_LEN..];
        let header = <ListingHeader as BorshDeserialize>::deserialize(&mut buf).map_err(|e| DecodeError::Malformed {
            address,
            field: "header",
            reason: e.to_string(),
        })?;

        let collection = read_label(address, "collection", &mut buf)?;
        let category = read_label(address, "category", &mut buf)?;
        let kind = read_label(address, "type", &mut buf)?;
        let collection_category = read_label(address, "collection_category", &mut buf)?;

        Ok(Listing {
            address,
            seller: header.seller,
            price: header.price,
            mint: header.mint,
            is_active: header.is_active,
            collection,
            category,
            kind,
            collection_category,
        })
    }
}
