//! A JSON/REST `LedgerAdapter` implementation, talking to a node's
//! submission endpoint and an indexer for historical/account queries
//! (§6). Grounded on the teacher's `electrs-blockchain-provider`, which
//! wraps `reqwest` around an Esplora-style REST API the same way.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use smc_chain::{ChainError, CompiledProgram, LedgerAdapter, Status, TxId};
use smc_core::{Address, SuggestedParams, Transaction};

/// Talks to a node endpoint (submission + suggested params) and a
/// separate indexer endpoint (balance/account lookups), matching the
/// split the reference ledger's SDK exposes (`AlgodClient` /
/// `IndexerClient` in the original source).
pub struct HttpLedgerAdapter {
    node_url: String,
    indexer_url: String,
    client: reqwest::Client,
}

impl HttpLedgerAdapter {
    pub fn new(node_url: impl Into<String>, indexer_url: impl Into<String>) -> Self {
        HttpLedgerAdapter {
            node_url: node_url.into(),
            indexer_url: indexer_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn transport_err(e: reqwest::Error) -> ChainError {
        ChainError::Transport(e.to_string())
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Deserialize)]
struct AccountResponse {
    amount: u64,
}

#[derive(Deserialize)]
struct SuggestedParamsResponse {
    #[serde(rename = "first-valid")]
    first_valid: u64,
    #[serde(rename = "last-valid")]
    last_valid: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
}

#[derive(Deserialize)]
struct SubmitResponse {
    txid: String,
}

#[derive(Deserialize)]
struct CompileResponse {
    hash: String,
    result: String,
}

#[async_trait]
impl LedgerAdapter for HttpLedgerAdapter {
    async fn status(&self) -> Result<Status, ChainError> {
        let resp: StatusResponse = self
            .client
            .get(format!("{}/v2/status", self.node_url))
            .send()
            .await
            .map_err(Self::transport_err)?
            .json()
            .await
            .map_err(Self::transport_err)?;
        Ok(Status {
            last_round: resp.last_round,
        })
    }

    async fn account_balance(&self, addr: &Address) -> Result<u64, ChainError> {
        let resp = self
            .client
            .get(format!("{}/v2/accounts/{}", self.indexer_url, addr))
            .send()
            .await
            .map_err(Self::transport_err)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound);
        }
        let account: AccountResponse = resp.json().await.map_err(Self::transport_err)?;
        Ok(account.amount)
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, ChainError> {
        let resp: SuggestedParamsResponse = self
            .client
            .get(format!("{}/v2/transactions/params", self.node_url))
            .send()
            .await
            .map_err(Self::transport_err)?
            .json()
            .await
            .map_err(Self::transport_err)?;
        Ok(SuggestedParams {
            first_valid: resp.first_valid,
            last_valid: resp.last_valid,
            min_fee: resp.min_fee,
        })
    }

    async fn submit(&self, tx: &Transaction) -> Result<TxId, ChainError> {
        let resp = self
            .client
            .post(format!("{}/v2/transactions", self.node_url))
            .json(&serde_json::json!({
                "from": tx.from.to_string(),
                "to": tx.to.to_string(),
                "amount": tx.amount,
                "close-remainder-to": tx.close_remainder_to.to_string(),
                "fee": tx.fee,
                "first-valid": tx.first_valid,
                "last-valid": tx.last_valid,
            }))
            .send()
            .await
            .map_err(Self::transport_err)?;

        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            // The node rejects a settlement/refund submitted against an
            // already-drained multisig as overspend (§9 open question).
            return Err(ChainError::Overspend);
        }

        let submitted: SubmitResponse = resp.json().await.map_err(Self::transport_err)?;
        let mut id = [0u8; 32];
        let bytes = submitted.txid.as_bytes();
        let n = bytes.len().min(32);
        id[..n].copy_from_slice(&bytes[..n]);
        Ok(TxId(id))
    }

    async fn await_confirmation(&self, txid: &TxId) -> Result<(), ChainError> {
        let txid_hex = smc_core::utils::to_hex(&txid.0);
        loop {
            let resp = self
                .client
                .get(format!(
                    "{}/v2/transactions/pending/{}",
                    self.node_url, txid_hex
                ))
                .send()
                .await
                .map_err(Self::transport_err)?;
            if resp.status().is_success() {
                return Ok(());
            }
            debug!("transaction {} still pending, retrying", txid_hex);
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }
    }

    async fn compile_program(&self, source: &[u8]) -> Result<CompiledProgram, ChainError> {
        let resp: CompileResponse = self
            .client
            .post(format!("{}/v2/teal/compile", self.node_url))
            .body(source.to_vec())
            .send()
            .await
            .map_err(Self::transport_err)?
            .json()
            .await
            .map_err(Self::transport_err)?;

        let bytecode = base64::decode(&resp.result)
            .map_err(|e| ChainError::Transport(format!("invalid base64 in compile response: {}", e)))?;
        let address = resp
            .hash
            .parse()
            .map_err(|_| ChainError::Transport("node returned an invalid address".to_string()))?;
        Ok(CompiledProgram { bytecode, address })
    }
}
