use async_trait::async_trait;
use borsh::BorshDeserialize;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::solana_rpc::{AccountInfo, Pubkey, RpcError, SolanaRpcClient};

// Token-2022 mint layout
const MINT_SIZE: usize = 82;
const ACCOUNT_SIZE: usize = 165;
const MULTISIG_SIZE: usize = 355;
const MINT_IS_INITIALIZED_OFFSET: usize = 45;
const ACCOUNT_TYPE_MINT: u8 = 1;
const TLV_HEADER_SIZE: usize = 4;
const EXTENSION_TOKEN_METADATA: u16 = 19;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub update_authority: Option<Pubkey>,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub additional_metadata: Vec<(String, String)>,
}

impl TokenMetadata {
    /// Value of the first additional metadata pair, empty when there is none.
    pub fn group(&self) -> &str {
        self.additional_metadata
            .first()
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }
}

#[derive(BorshDeserialize)]
struct TokenMetadataExtension {
    update_authority: Pubkey,
    mint: Pubkey,
    name: String,
    symbol: String,
    uri: String,
    additional_metadata: Vec<(String, String)>,
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("mint {mint} is owned by {owner}, not the Token-2022 program")]
    InvalidOwner { mint: Pubkey, owner: Pubkey },
    #[error("account {mint} is not a mint: {reason}")]
    InvalidMint { mint: Pubkey, reason: &'static str },
    #[error("token metadata of {mint} is malformed: {reason}")]
    Malformed { mint: Pubkey, reason: String },
}

/// Token metadata reads by mint address.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn token_metadata(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>, MetadataError>;
}

/// Reads the Token-2022 metadata extension stored on the mint account itself.
#[derive(Clone)]
pub struct RpcMetadataSource {
    rpc: Arc<SolanaRpcClient>,
    token_program: Pubkey,
}

impl RpcMetadataSource {
    pub fn new(rpc: Arc<SolanaRpcClient>) -> Self {
        Self {
            rpc,
            token_program: Pubkey::token_2022_program(),
        }
    }
}

#[async_trait]
impl MetadataSource for RpcMetadataSource {
    async fn token_metadata(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>, MetadataError> {
        let account = match self.rpc.get_account_info(mint).await? {
            Some(account) => account,
            None => {
                debug!("Mint account {} not found", mint);
                return Ok(None);
            }
        };

        parse_token_metadata(*mint, &self.token_program, &account)
    }
}

/// Extracts the token-metadata extension from a Token-2022 mint account.
pub fn parse_token_metadata(
    mint: Pubkey,
    token_program: &Pubkey,
    account: &AccountInfo,
) -> Result<Option<TokenMetadata>, MetadataError> {
    if &account.owner != token_program {
        return Err(MetadataError::InvalidOwner {
            mint,
            owner: account.owner,
        });
    }

    let data = account.data.as_slice();
    if data.len() < MINT_SIZE {
        return Err(MetadataError::InvalidMint { mint, reason: "account too small" });
    }
    if data[MINT_IS_INITIALIZED_OFFSET] == 0 {
        return Err(MetadataError::InvalidMint { mint, reason: "mint is not initialized" });
    }
    if data.len() == MINT_SIZE {
        return Ok(None);
    }
    if data.len() <= ACCOUNT_SIZE || data.len() == MULTISIG_SIZE {
        return Err(MetadataError::InvalidMint { mint, reason: "unexpected account size" });
    }
    if data[ACCOUNT_SIZE] != ACCOUNT_TYPE_MINT {
        return Err(MetadataError::InvalidMint { mint, reason: "account type is not mint" });
    }

    let extension = match find_extension(&data[ACCOUNT_SIZE + 1..], EXTENSION_TOKEN_METADATA) {
        Some(extension) => extension,
        None => return Ok(None),
    };

    let mut buf = extension;
    let raw = <TokenMetadataExtension as BorshDeserialize>::deserialize(&mut buf)
        .map_err(|e| MetadataError::Malformed {
            mint,
            reason: e.to_string(),
        })?;

    Ok(Some(TokenMetadata {
        update_authority: (raw.update_authority != Pubkey::default()).then_some(raw.update_authority),
        mint: raw.mint,
        name: raw.name,
        symbol: raw.symbol,
        uri: raw.uri,
        additional_metadata: raw.additional_metadata,
    }))
}

fn find_extension(tlv: &[u8], wanted: u16) -> Option<&[u8]> {
    let mut offset = 0;
    while offset + TLV_HEADER_SIZE <= tlv.len() {
        let kind = u16::from_le_bytes([tlv[offset], tlv[offset + 1]]);
        let len = u16::from_le_bytes([tlv[offset + 2], tlv[offset + 3]]) as usize;
        let start = offset + TLV_HEADER_SIZE;
        let end = start + len;
        if end > tlv.len() {
            return None;
        }
        if kind == wanted {
            return Some(&tlv[start..end]);
        }
        offset = end;
    }
    None
}
