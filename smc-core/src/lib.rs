//! Core protocol maths for a Simple Micropayment Channel (SMC): the
//! parameter tuple that identifies a channel, the multisig and
//! logic-signature templates derived from it, and the transaction
//! builder that turns a template plus a chain tip into a submittable
//! transaction. No I/O: callers outside this crate own the ledger
//! client, the transport and the state machines built on top.

pub mod crypto;
pub mod error;
pub mod params;
pub mod templates;
pub mod txn;
pub mod utils;

pub use error::Error;
pub use params::{Address, ChannelParameters};
pub use templates::{
    compile_program, smc_lsig_refund, smc_lsig_settlement, smc_msig, MultisigTemplate,
    RefundArtifact, RefundPredicate, SettlementArtifact, SettlementPredicate,
};
pub use txn::{smc_txn_refund, smc_txn_settlement, SuggestedParams, Transaction, MAX_FEE};
