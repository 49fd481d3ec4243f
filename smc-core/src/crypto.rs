//! Signing and verification over the canonical byte encodings of the
//! template predicates. Each party holds exactly one keypair; the shared
//! multisig is jointly owned and never has its own private key.
//!
//! Individual accounts are x-only Schnorr keys, so that - unlike a
//! hash-based address - a peer's own address already *is* its public
//! key: no separate key-exchange step is needed to verify a peer's
//! subsignature (§4.4, §4.5).

use secp256k1_zkp::schnorr::Signature;
use secp256k1_zkp::{KeyPair as SecpKeyPair, Message, Secp256k1, XOnlyPublicKey};

use crate::error::Error;
use crate::params::Address;
use crate::utils::hash32;

/// A party's signing key. Mnemonic decoding and storage are out of scope
/// here (§6, key management is an external collaborator); this wrapper
/// only covers what the protocol core needs: deriving the address and
/// producing subsignatures.
pub struct KeyPair {
    inner: SecpKeyPair,
    public: XOnlyPublicKey,
}

impl KeyPair {
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let inner = SecpKeyPair::from_seckey_slice(&secp, &bytes)?;
        let (public, _parity) = XOnlyPublicKey::from_keypair(&inner);
        Ok(KeyPair { inner, public })
    }

    pub fn public_key(&self) -> XOnlyPublicKey {
        self.public
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public)
    }

    /// Produces a subsignature over an arbitrary canonical message. Used
    /// for both the refund lsig subsignature (setup) and the settlement
    /// lsig subsignature (each payment).
    pub fn sign(&self, canonical_message: &[u8]) -> Signature {
        let secp = Secp256k1::new();
        let digest = hash32(canonical_message);
        let msg = Message::from_slice(&digest).expect("32-byte digest is a valid message");
        secp.sign_schnorr(&msg, &self.inner)
    }
}

/// Verifies that `signature` is a valid subsignature by `signer` over
/// `canonical_message`.
pub fn verify(
    signer: &XOnlyPublicKey,
    canonical_message: &[u8],
    signature: &Signature,
) -> Result<(), Error> {
    let secp = Secp256k1::new();
    let digest = hash32(canonical_message);
    let msg = Message::from_slice(&digest).expect("32-byte digest is a valid message");
    secp.verify_schnorr(signature, &msg, signer)
        .map_err(|_| Error::BadSignature("subsignature failed verification".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_roundtrips() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]).unwrap();
        let sig = kp.sign(b"hello");
        assert!(verify(&kp.public_key(), b"hello", &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]).unwrap();
        let sig = kp.sign(b"hello");
        assert!(verify(&kp.public_key(), b"goodbye", &sig).is_err());
    }

    #[test]
    fn address_recovers_same_public_key_used_to_sign() {
        let kp = KeyPair::from_secret_bytes([3u8; 32]).unwrap();
        let recovered = kp.address().to_public_key().unwrap();
        assert_eq!(recovered, kp.public_key());
    }
}
