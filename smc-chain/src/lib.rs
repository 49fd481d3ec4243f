//! Ledger Adapter (§4.6): a thin abstraction over the chain node. Kept
//! deliberately small - the node itself, its consensus, and its fee
//! market are non-goals (§1) - but the error kinds below must be
//! preserved by every implementation so the sender's refund watchdog can
//! tell "account settled" from "node unreachable" (§6, §7).

use async_trait::async_trait;

use smc_core::{Address, SuggestedParams, Transaction};

/// Current chain status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub last_round: u64,
}

/// A 32-byte transaction id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxId(pub [u8; 32]);

/// The outcome of compiling a program to bytecode + address. A stand-in
/// for the real logic-signature compiler (out of scope, §1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledProgram {
    pub bytecode: Vec<u8>,
    pub address: Address,
}

/// Ledger-adapter specific errors. Distinct from `smc_core::Error`
/// because the manager must react differently to a `NotFound` account
/// than to a `Transport` hiccup (§4.6, §4.4 refund_watch, §9 indexer-lag
/// open question).
#[derive(Debug)]
pub enum ChainError {
    /// The requested account does not exist, or has never received a
    /// transaction (covers the indexer-lag case too).
    NotFound,
    /// A submitted transaction was rejected by the node as overspend -
    /// treated by the sender's refund watchdog the same as `NotFound`
    /// (the recipient must already have settled), per §9.
    Overspend,
    /// Connectivity or node-side failure: callers must retry with
    /// back-off, never advance protocol state.
    Transport(String),
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::NotFound => write!(f, "account not found"),
            ChainError::Overspend => write!(f, "transaction rejected as overspend"),
            ChainError::Transport(s) => write!(f, "transport error: {}", s),
        }
    }
}

impl std::error::Error for ChainError {}

/// Abstract operations over the ledger node (§4.6). Implementations:
/// `smc-chain-http` (a JSON/REST client) and `smc-mocks` (an in-memory
/// mock used by tests and the demo binary).
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    async fn status(&self) -> Result<Status, ChainError>;

    /// Balance without pending rewards. `Err(ChainError::NotFound)` must
    /// be returned for both a never-funded account and one the indexer
    /// hasn't caught up on yet.
    async fn account_balance(&self, addr: &Address) -> Result<u64, ChainError>;

    async fn suggested_params(&self) -> Result<SuggestedParams, ChainError>;

    async fn submit(&self, tx: &Transaction) -> Result<TxId, ChainError>;

    async fn await_confirmation(&self, txid: &TxId) -> Result<(), ChainError>;

    async fn compile_program(&self, source: &[u8]) -> Result<CompiledProgram, ChainError>;
}
