//! Error kinds shared by every crate that implements a side of the SMC
//! protocol (§7 of the design: BadSetup/BadSignature/BadFunding/BadSequence/
//! CannotBeRefunded, plus the transient/IO case that must never advance
//! channel state).

use std::fmt;

/// A failure raised anywhere in the SMC protocol core.
#[derive(Debug)]
pub enum Error {
    /// Address invalid, windows reversed, lifetime too short, or duplicate
    /// channel (address already present in `KnownChannels`).
    BadSetup(String),
    /// A peer subsignature failed verification against a logic-signature
    /// template.
    BadSignature(String),
    /// The multisig balance is lower than the claimed cumulative amount
    /// (optionally including the expected settlement fee).
    BadFunding(String),
    /// A payment's cumulative amount did not strictly increase.
    BadSequence(String),
    /// The sender's refund watchdog observed an empty or absent multisig
    /// before the refund window opened: the recipient already settled.
    CannotBeRefunded(String),
    /// No block height remains in which a settlement or refund transaction
    /// could be valid.
    NoValidityWindow(String),
    /// The suggested or computed fee exceeds the conservative ceiling.
    FeeTooHigh(u64),
    /// Secp256k1 signing or verification failure.
    Secp(secp256k1_zkp::Error),
    /// Transport or ledger connectivity failure. Transient: callers must
    /// retry with back-off and must not advance protocol state.
    Transient(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadSetup(s) => write!(f, "bad setup: {}", s),
            Error::BadSignature(s) => write!(f, "bad signature: {}", s),
            Error::BadFunding(s) => write!(f, "bad funding: {}", s),
            Error::BadSequence(s) => write!(f, "bad sequence: {}", s),
            Error::CannotBeRefunded(s) => write!(f, "cannot be refunded: {}", s),
            Error::NoValidityWindow(s) => write!(f, "no validity window: {}", s),
            Error::FeeTooHigh(fee) => write!(f, "fee {} exceeds ceiling", fee),
            Error::Secp(e) => write!(f, "secp256k1 error: {}", e),
            Error::Transient(s) => write!(f, "transient error: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Secp(e) => Some(e),
            _ => None,
        }
    }
}

impl From<secp256k1_zkp::Error> for Error {
    fn from(e: secp256k1_zkp::Error) -> Self {
        Error::Secp(e)
    }
}
