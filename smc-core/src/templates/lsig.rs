//! Compilation of the settlement and refund logic-signature templates
//! (§4.1) and verification of the subsignatures collected on them.
//!
//! Both predicates are delegated to the multisig account: a party's
//! subsignature is a signature over the predicate's canonical byte
//! encoding, contributed as that party's share of the 2-of-3 multisig
//! threshold. The third signer (the inert contract account from
//! `msig.rs`) never signs - it exists only to carry the parameter
//! commitment into the multisig address.

use secp256k1_zkp::schnorr::Signature;
use secp256k1_zkp::XOnlyPublicKey;

use crate::crypto::verify;
use crate::error::Error;
use crate::params::Address;
use crate::templates::msig::THRESHOLD;

/// Asserts: payment type, `amount == cumulative_amount`, fee at minimum,
/// receiver is the recipient, close-remainder-to the sender, no rekey,
/// and `last_valid < min_refund_block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementPredicate {
    pub sender_addr: Address,
    pub recipient_addr: Address,
    pub cumulative_amount: u64,
    pub min_refund_block: u64,
}

impl SettlementPredicate {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 + 32 + 8 + 8 + 1);
        buf.push(b'S');
        buf.extend_from_slice(self.sender_addr.as_bytes());
        buf.extend_from_slice(self.recipient_addr.as_bytes());
        buf.extend_from_slice(&self.cumulative_amount.to_be_bytes());
        buf.extend_from_slice(&self.min_refund_block.to_be_bytes());
        buf
    }
}

/// Asserts: payment type, `amount == 0`, fee at minimum,
/// close-remainder-to the sender, no rekey, `first_valid >=
/// min_refund_block`, `last_valid <= max_refund_block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundPredicate {
    pub sender_addr: Address,
    pub min_refund_block: u64,
    pub max_refund_block: u64,
}

impl RefundPredicate {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 + 8 + 8 + 1);
        buf.push(b'R');
        buf.extend_from_slice(self.sender_addr.as_bytes());
        buf.extend_from_slice(&self.min_refund_block.to_be_bytes());
        buf.extend_from_slice(&self.max_refund_block.to_be_bytes());
        buf
    }
}

/// A settlement artifact gathers the predicate plus whichever
/// subsignatures have been collected so far.
#[derive(Clone, Debug)]
pub struct SettlementArtifact {
    pub predicate: SettlementPredicate,
    pub msig_address: Address,
    pub sender_subsig: Option<Signature>,
    pub recipient_subsig: Option<Signature>,
}

/// A refund artifact gathers the predicate plus whichever subsignatures
/// have been collected so far.
#[derive(Clone, Debug)]
pub struct RefundArtifact {
    pub predicate: RefundPredicate,
    pub msig_address: Address,
    pub sender_subsig: Option<Signature>,
    pub recipient_subsig: Option<Signature>,
}

pub fn smc_lsig_settlement(
    sender_addr: Address,
    recipient_addr: Address,
    cumulative_amount: u64,
    min_refund_block: u64,
    msig_address: Address,
) -> SettlementArtifact {
    SettlementArtifact {
        predicate: SettlementPredicate {
            sender_addr,
            recipient_addr,
            cumulative_amount,
            min_refund_block,
        },
        msig_address,
        sender_subsig: None,
        recipient_subsig: None,
    }
}

pub fn smc_lsig_refund(
    sender_addr: Address,
    min_refund_block: u64,
    max_refund_block: u64,
    msig_address: Address,
) -> RefundArtifact {
    RefundArtifact {
        predicate: RefundPredicate {
            sender_addr,
            min_refund_block,
            max_refund_block,
        },
        msig_address,
        sender_subsig: None,
        recipient_subsig: None,
    }
}

impl SettlementArtifact {
    /// Verifies the sender's subsignature only. This is the meaningful
    /// check on the recipient's side: the recipient can always mint its
    /// own subsignature, so only the sender's counts as proof of
    /// authorisation (§4.5).
    pub fn verify_sender_subsig(&self, sender_pubkey: &XOnlyPublicKey) -> Result<(), Error> {
        let sig = self
            .sender_subsig
            .as_ref()
            .ok_or_else(|| Error::BadSignature("missing sender subsignature".to_string()))?;
        verify(sender_pubkey, &self.predicate.canonical_bytes(), sig)
    }
}

impl RefundArtifact {
    /// Verifies that both subsignatures are present and valid,
    /// satisfying the 2-of-3 multisig threshold (the contract account
    /// never contributes a signature).
    pub fn verify_fully_signed(
        &self,
        sender_pubkey: &XOnlyPublicKey,
        recipient_pubkey: &XOnlyPublicKey,
    ) -> Result<(), Error> {
        let msg = self.predicate.canonical_bytes();
        let sender_sig = self
            .sender_subsig
            .as_ref()
            .ok_or_else(|| Error::BadSignature("missing sender subsignature".to_string()))?;
        let recipient_sig = self
            .recipient_subsig
            .as_ref()
            .ok_or_else(|| Error::BadSignature("missing recipient subsignature".to_string()))?;
        verify(sender_pubkey, &msg, sender_sig)?;
        verify(recipient_pubkey, &msg, recipient_sig)?;
        debug_assert_eq!(THRESHOLD, 2, "refund lsig requires exactly 2 subsignatures");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn addr(n: u8) -> Address {
        Address::from_digest([n; 32])
    }

    #[test]
    fn settlement_predicate_changes_with_amount() {
        let a = SettlementPredicate {
            sender_addr: addr(1),
            recipient_addr: addr(2),
            cumulative_amount: 1_000_000,
            min_refund_block: 2150,
        };
        let mut b = a;
        b.cumulative_amount = 2_000_000;
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn refund_requires_both_subsignatures() {
        let sender = KeyPair::from_secret_bytes([1u8; 32]).unwrap();
        let recipient = KeyPair::from_secret_bytes([2u8; 32]).unwrap();
        let mut artifact = smc_lsig_refund(sender.address(), 2150, 2200, addr(9));
        assert!(artifact
            .verify_fully_signed(&sender.public_key(), &recipient.public_key())
            .is_err());

        let msg = artifact.predicate.canonical_bytes();
        artifact.sender_subsig = Some(sender.sign(&msg));
        assert!(artifact
            .verify_fully_signed(&sender.public_key(), &recipient.public_key())
            .is_err());

        artifact.recipient_subsig = Some(recipient.sign(&msg));
        assert!(artifact
            .verify_fully_signed(&sender.public_key(), &recipient.public_key())
            .is_ok());
    }

    #[test]
    fn settlement_rejects_wrong_signer() {
        let sender = KeyPair::from_secret_bytes([1u8; 32]).unwrap();
        let impostor = KeyPair::from_secret_bytes([3u8; 32]).unwrap();
        let mut artifact =
            smc_lsig_settlement(sender.address(), addr(2), 1_000_000, 2150, addr(9));
        let msg = artifact.predicate.canonical_bytes();
        artifact.sender_subsig = Some(impostor.sign(&msg));
        assert!(artifact.verify_sender_subsig(&sender.public_key()).is_err());
    }
}
