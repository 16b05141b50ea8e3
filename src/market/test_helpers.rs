use anyhow::anyhow;
use async_trait::async_trait;
use borsh::BorshSerialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::fetcher::AccountSource;
use super::hydrator::DetailHydrator;
use super::image::{DocumentFetcher, ImageResolver};
use super::listing::{AnchorListingDecoder, Listing};
use super::metadata::{MetadataError, MetadataSource, TokenMetadata};
use crate::solana_rpc::{AccountInfo, ProgramAccount, Pubkey, RpcError};

pub fn key(n: u8) -> Pubkey {
    Pubkey::new([n; 32])
}

pub fn listing(n: u8, price: u64, is_active: bool) -> Listing {
    Listing {
        address: key(n.wrapping_add(100)),
        seller: key(200),
        price,
        mint: key(n),
        is_active,
        collection: String::new(),
        category: String::new(),
        kind: String::new(),
        collection_category: String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ListingSpec {
    seller: Pubkey,
    mint: Pubkey,
    price: u64,
    is_active: bool,
    collection: String,
    category: String,
    kind: String,
    collection_category: String,
}

impl ListingSpec {
    pub fn new(seller: Pubkey, mint: Pubkey, price: u64, is_active: bool) -> Self {
        Self {
            seller,
            mint,
            price,
            is_active,
            collection: String::new(),
            category: String::new(),
            kind: String::new(),
            collection_category: String::new(),
        }
    }

    pub fn collection(mut self, value: &str) -> Self {
        self.collection = value.to_string();
        self
    }

    pub fn category(mut self, value: &str) -> Self {
        self.category = value.to_string();
        self
    }

    pub fn kind(mut self, value: &str) -> Self {
        self.kind = value.to_string();
        self
    }

    pub fn collection_category(mut self, value: &str) -> Self {
        self.collection_category = value.to_string();
        self
    }

    fn has_labels(&self) -> bool {
        !(self.collection.is_empty()
            && self.category.is_empty()
            && self.kind.is_empty()
            && self.collection_category.is_empty())
    }
}

/// Account bytes in the layout `AnchorListingDecoder` reads, zero padded to
/// `pad_to` when given.
pub fn encode_listing(decoder: &AnchorListingDecoder, spec: &ListingSpec, pad_to: Option<usize>) -> Vec<u8> {
    let mut data = decoder.discriminator().to_vec();
    (spec.seller, spec.mint, spec.price, spec.is_active)
        .serialize(&mut data)
        .unwrap();
    if spec.has_labels() {
        (
            spec.collection.clone(),
            spec.category.clone(),
            spec.kind.clone(),
            spec.collection_category.clone(),
        )
            .serialize(&mut data)
            .unwrap();
    }
    if let Some(size) = pad_to {
        data.resize(size.max(data.len()), 0);
    }
    data
}

#[derive(Default)]
pub struct FakeAccounts {
    accounts: Vec<ProgramAccount>,
    error: Option<String>,
    calls: Arc<Mutex<Vec<(Pubkey, u64)>>>,
}

impl FakeAccounts {
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_listing(self, address: Pubkey, spec: ListingSpec) -> Self {
        let data = encode_listing(&AnchorListingDecoder::default(), &spec, Some(88));
        self.with_raw(address, data)
    }

    pub fn with_raw(mut self, address: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.push(ProgramAccount {
            pubkey: address,
            account: AccountInfo {
                owner: key(250),
                lamports: 1_500_000,
                data,
            },
        });
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(Pubkey, u64)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl AccountSource for FakeAccounts {
    async fn program_accounts(&self, program_id: &Pubkey, data_size: u64) -> Result<Vec<ProgramAccount>, RpcError> {
        self.calls.lock().unwrap().push((*program_id, data_size));
        match &self.error {
            Some(message) => Err(RpcError::Rpc {
                code: -32000,
                message: message.clone(),
            }),
            None => Ok(self.accounts.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataSpec {
    name: String,
    symbol: String,
    uri: String,
    pairs: Vec<(String, String)>,
}

impl MetadataSpec {
    pub fn new(name: &str, symbol: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
            pairs: Vec::new(),
        }
    }

    pub fn with_pair(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    fn to_metadata(&self, mint: Pubkey) -> TokenMetadata {
        TokenMetadata {
            update_authority: Some(key(9)),
            mint,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            additional_metadata: self.pairs.clone(),
        }
    }
}

/// A Token-2022 mint account, with the metadata extension when `spec` is given.
pub fn mint_account_with_metadata(mint: Pubkey, spec: Option<&MetadataSpec>) -> AccountInfo {
    let mut data = vec![0u8; 82];
    data[44] = 0; // decimals
    data[45] = 1; // is_initialized

    if let Some(spec) = spec {
        data.resize(165, 0);
        data.push(1); // account type: mint

        // metadata pointer extension ahead of the metadata itself
        data.extend_from_slice(&18u16.to_le_bytes());
        data.extend_from_slice(&64u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 64]);

        let mut value = Vec::new();
        (
            key(9),
            mint,
            spec.name.clone(),
            spec.symbol.clone(),
            spec.uri.clone(),
            spec.pairs.clone(),
        )
            .serialize(&mut value)
            .unwrap();
        data.extend_from_slice(&19u16.to_le_bytes());
        data.extend_from_slice(&(value.len() as u16).to_le_bytes());
        data.extend_from_slice(&value);
    }

    AccountInfo {
        owner: Pubkey::token_2022_program(),
        lamports: 2_000_000,
        data,
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    records: HashMap<Pubkey, MetadataSpec>,
    failing: HashSet<Pubkey>,
    delayed: bool,
}

impl FakeMetadata {
    pub fn with(mut self, mint: Pubkey, spec: MetadataSpec) -> Self {
        self.records.insert(mint, spec);
        self
    }

    pub fn failing(mut self, mint: Pubkey) -> Self {
        self.failing.insert(mint);
        self
    }

    /// Higher mints answer sooner.
    pub fn with_delay_descending(mut self) -> Self {
        self.delayed = true;
        self
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn token_metadata(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>, MetadataError> {
        if self.delayed {
            let wait = (255 - mint.as_bytes()[0]) % 32;
            tokio::time::sleep(Duration::from_millis(wait as u64 * 2)).await;
        }
        if self.failing.contains(mint) {
            return Err(MetadataError::Malformed {
                mint: *mint,
                reason: "unexpected end of input".to_string(),
            });
        }
        Ok(self.records.get(mint).map(|spec| spec.to_metadata(*mint)))
    }
}

#[derive(Default)]
pub struct FakeDocuments {
    documents: HashMap<String, Option<Value>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeDocuments {
    pub fn with_document(mut self, uri: &str, document: Value) -> Self {
        self.documents.insert(uri.to_string(), Some(document));
        self
    }

    pub fn with_not_found(mut self, uri: &str) -> Self {
        self.documents.insert(uri.to_string(), None);
        self
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl DocumentFetcher for FakeDocuments {
    async fn fetch_json(&self, uri: &str) -> anyhow::Result<Option<Value>> {
        self.requests.lock().unwrap().push(uri.to_string());
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {}", uri))
    }
}

pub fn hydrator(metadata: FakeMetadata, documents: FakeDocuments) -> DetailHydrator {
    let images = ImageResolver::new(
        Arc::new(documents),
        vec!["jpeg".to_string(), "png".to_string(), "jpg".to_string()],
    );
    DetailHydrator::new(Arc::new(metadata), images)
}
