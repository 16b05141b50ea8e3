use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SolanaRpcSettings;

pub mod pubkey;
pub use pubkey::{ParsePubkeyError, Pubkey, TOKEN_2022_PROGRAM_ID};

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("request to RPC node failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC node returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed RPC payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    client: Client,
    url: String,
    commitment: String,
}

/// Decoded account as returned by `getAccountInfo` / `getProgramAccounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAccount {
    pub pubkey: Pubkey,
    pub account: AccountInfo,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct UiAccount {
    lamports: u64,
    owner: String,
    // [payload, encoding]
    data: (String, String),
}

#[derive(Debug, Deserialize)]
struct KeyedUiAccount {
    pubkey: String,
    account: UiAccount,
}

impl UiAccount {
    fn decode(self) -> Result<AccountInfo, RpcError> {
        let (payload, encoding) = self.data;
        if encoding != "base64" {
            return Err(RpcError::Malformed(format!("unexpected account encoding {}", encoding)));
        }
        let data = B64
            .decode(payload.as_bytes())
            .map_err(|e| RpcError::Malformed(format!("account data is not base64: {}", e)))?;
        let owner = self
            .owner
            .parse::<Pubkey>()
            .map_err(|e| RpcError::Malformed(format!("account owner: {}", e)))?;

        Ok(AccountInfo {
            owner,
            lamports: self.lamports,
            data,
        })
    }
}

impl SolanaRpcClient {
    pub fn new(url: String, commitment: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .unwrap_or_else(|_| Client::new());

        info!("Initialized Solana RPC client for: {}", url);
        Self { client, url, commitment }
    }

    pub fn from_settings(settings: &SolanaRpcSettings) -> Self {
        Self::new(
            settings.url.clone(),
            settings.commitment.clone(),
            settings.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        debug!("RPC {} -> {}", method, self.url);

        let response = self.client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RpcError::Status(response.status()));
        }

        let body = response.json::<RpcResponse<T>>().await?;

        if let Some(error) = body.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| RpcError::Malformed(format!("{} response has no result", method)))
    }

    pub async fn get_health(&self) -> Result<bool, RpcError> {
        match self.call::<String>("getHealth", json!([])).await {
            Ok(status) => Ok(status == "ok"),
            Err(RpcError::Rpc { code, message }) => {
                warn!("Node unhealthy ({}): {}", code, message);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// All accounts owned by `program_id` whose data is exactly `data_size` bytes.
    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<ProgramAccount>, RpcError> {
        let accounts: Vec<KeyedUiAccount> = self
            .call(
                "getProgramAccounts",
                json!([
                    program_id.to_string(),
                    {
                        "encoding": "base64",
                        "commitment": self.commitment,
                        "filters": [{ "dataSize": data_size }]
                    }
                ]),
            )
            .await?;

        debug!("getProgramAccounts returned {} accounts for {}", accounts.len(), program_id);

        accounts
            .into_iter()
            .map(|keyed| {
                let pubkey = keyed
                    .pubkey
                    .parse::<Pubkey>()
                    .map_err(|e| RpcError::Malformed(format!("account pubkey: {}", e)))?;
                Ok(ProgramAccount {
                    pubkey,
                    account: keyed.account.decode()?,
                })
            })
            .collect()
    }

    pub async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>, RpcError> {
        let response: WithContext<Option<UiAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;

        response.value.map(UiAccount::decode).transpose()
    }
}
