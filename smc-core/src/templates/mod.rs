//! Flatten template import structure.

pub mod lsig;
pub mod msig;

pub use lsig::{
    smc_lsig_refund, smc_lsig_settlement, RefundArtifact, RefundPredicate, SettlementArtifact,
    SettlementPredicate,
};
pub use msig::{compile_program, smc_msig, MultisigTemplate};
