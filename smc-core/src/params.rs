//! The data model shared by both parties: account addresses and the
//! immutable `ChannelParameters` tuple that uniquely identifies a channel.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::utils::{from_hex, to_hex};

/// An account address on the underlying ledger: the public key itself
/// for individual accounts, or the hash of a canonical encoding for
/// derived accounts (multisig, logic-signature).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The address of a direct, key-based account is the public key's own
    /// x-only encoding, not a hash of it: unlike a derived account
    /// (multisig, logic-signature), a peer's address already carries the
    /// public key needed to verify its subsignatures.
    pub fn from_public_key(pk: &secp256k1_zkp::XOnlyPublicKey) -> Self {
        Address(pk.serialize())
    }

    /// Recovers the public key behind a direct account's address. Only
    /// meaningful for addresses produced by `from_public_key`; calling
    /// this on a derived (multisig/logic-signature) address returns
    /// whatever 32 bytes happen to parse as a curve point, which carries
    /// no useful key.
    pub fn to_public_key(&self) -> Result<secp256k1_zkp::XOnlyPublicKey, Error> {
        secp256k1_zkp::XOnlyPublicKey::from_slice(&self.0).map_err(Error::from)
    }

    /// The address of a derived account (multisig, logic-signature): the
    /// hash of its canonical encoding (P3 Address commitment).
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Address(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", to_hex(&self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex(&self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = from_hex(s).ok_or_else(|| Error::BadSetup(format!("invalid address: {}", s)))?;
        if bytes.len() != 32 {
            return Err(Error::BadSetup(format!("address {} is not 32 bytes", s)));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

#[cfg_attr(feature = "use-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The tuple that uniquely identifies a channel. Immutable once a party
/// has accepted it; a different value in any field yields a different
/// multisig address (P3).
pub struct ChannelParameters {
    #[cfg_attr(feature = "use-serde", serde(with = "addr_serde"))]
    pub sender_addr: Address,
    #[cfg_attr(feature = "use-serde", serde(with = "addr_serde"))]
    pub recipient_addr: Address,
    pub nonce: u64,
    pub min_refund_block: u64,
    pub max_refund_block: u64,
}

impl ChannelParameters {
    pub fn new(
        sender_addr: Address,
        recipient_addr: Address,
        nonce: u64,
        min_refund_block: u64,
        max_refund_block: u64,
    ) -> Result<Self, Error> {
        let params = ChannelParameters {
            sender_addr,
            recipient_addr,
            nonce,
            min_refund_block,
            max_refund_block,
        };
        params.validate()?;
        Ok(params)
    }

    /// Invariant: `min_refund_block <= max_refund_block`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_refund_block > self.max_refund_block {
            return Err(Error::BadSetup(format!(
                "min_refund_block {} > max_refund_block {}",
                self.min_refund_block, self.max_refund_block
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "use-serde")]
mod addr_serde {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        addr.to_string().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
