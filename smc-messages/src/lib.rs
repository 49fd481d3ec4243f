//! Wire Codec (§4.3): the four message kinds exchanged between sender
//! and recipient over the framed transport. Encoding is deterministic
//! and rejects unknown fields/discriminants, built on `lightning`'s
//! `Readable`/`Writeable` TLV-style primitives exactly as the teacher
//! protocol encodes its own channel messages.

mod ser_impls;

use lightning::ln::msgs::DecodeError;
use lightning::util::ser::{Readable, Writeable, Writer};
use secp256k1_zkp::schnorr::Signature;
use std::io::Read;

use smc_core::Address;

use ser_impls::{read_address, read_signature, write_address, write_signature};

/// Sent by the sender before each logical operation so the recipient
/// knows how to dispatch the frames that follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodSelector {
    SetupChannel,
    Pay,
}

impl Writeable for MethodSelector {
    fn write<W: Writer>(&self, writer: &mut W) -> Result<(), lightning::io::Error> {
        let tag: u8 = match self {
            MethodSelector::SetupChannel => 0,
            MethodSelector::Pay => 1,
        };
        tag.write(writer)
    }
}

impl Readable for MethodSelector {
    fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let tag: u8 = Readable::read(reader)?;
        match tag {
            0 => Ok(MethodSelector::SetupChannel),
            1 => Ok(MethodSelector::Pay),
            _ => Err(DecodeError::InvalidValue),
        }
    }
}

/// The sender's channel proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupProposal {
    pub sender_addr: Address,
    pub nonce: u64,
    pub min_refund_block: u64,
    pub max_refund_block: u64,
}

impl Writeable for SetupProposal {
    fn write<W: Writer>(&self, writer: &mut W) -> Result<(), lightning::io::Error> {
        write_address(&self.sender_addr, writer)?;
        self.nonce.write(writer)?;
        self.min_refund_block.write(writer)?;
        self.max_refund_block.write(writer)
    }
}

impl Readable for SetupProposal {
    fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        Ok(SetupProposal {
            sender_addr: read_address(reader)?,
            nonce: Readable::read(reader)?,
            min_refund_block: Readable::read(reader)?,
            max_refund_block: Readable::read(reader)?,
        })
    }
}

/// The recipient's co-signature over the refund logic-signature
/// template.
#[derive(Clone, Copy, Debug)]
pub struct SetupResponse {
    pub recipient_addr: Address,
    pub refund_lsig_subsignature: Signature,
}

impl Writeable for SetupResponse {
    fn write<W: Writer>(&self, writer: &mut W) -> Result<(), lightning::io::Error> {
        write_address(&self.recipient_addr, writer)?;
        write_signature(&self.refund_lsig_subsignature, writer)
    }
}

impl Readable for SetupResponse {
    fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        Ok(SetupResponse {
            recipient_addr: read_address(reader)?,
            refund_lsig_subsignature: read_signature(reader)?,
        })
    }
}

/// One off-chain payment: the sender's subsignature over the settlement
/// logic-signature for a new, higher cumulative amount.
#[derive(Clone, Copy, Debug)]
pub struct Payment {
    pub cumulative_amount: u64,
    pub settlement_lsig_subsignature: Signature,
}

impl Writeable for Payment {
    fn write<W: Writer>(&self, writer: &mut W) -> Result<(), lightning::io::Error> {
        self.cumulative_amount.write(writer)?;
        write_signature(&self.settlement_lsig_subsignature, writer)
    }
}

impl Readable for Payment {
    fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        Ok(Payment {
            cumulative_amount: Readable::read(reader)?,
            settlement_lsig_subsignature: read_signature(reader)?,
        })
    }
}

/// An opaque, length-prefixed frame as seen on the wire. `smc-manager`'s
/// transport implementations produce and consume these; this crate only
/// owns the encode/decode of the payload.
pub fn encode<T: Writeable>(msg: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    msg.write(&mut buf).expect("writing to a Vec never fails");
    buf
}

pub fn decode<T: Readable>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut cursor = bytes;
    let value = T::read(&mut cursor)?;
    if !cursor.is_empty() {
        // Deterministic codec: trailing, unconsumed bytes are unknown
        // fields and must be rejected rather than silently ignored.
        return Err(DecodeError::InvalidValue);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1_zkp::{KeyPair, Message, Secp256k1};

    fn addr(n: u8) -> Address {
        Address::from_digest([n; 32])
    }

    fn dummy_sig() -> Signature {
        let secp = Secp256k1::new();
        let kp = KeyPair::from_seckey_slice(&secp, &[9u8; 32]).unwrap();
        let msg = Message::from_slice(&[1u8; 32]).unwrap();
        secp.sign_schnorr(&msg, &kp)
    }

    #[test]
    fn method_selector_roundtrips() {
        for m in [MethodSelector::SetupChannel, MethodSelector::Pay] {
            let bytes = encode(&m);
            let back: MethodSelector = decode(&bytes).unwrap();
            assert_eq!(m, back);
        }
    }

    #[test]
    fn unknown_method_selector_is_rejected() {
        let bytes = vec![42u8];
        let res: Result<MethodSelector, _> = decode(&bytes);
        assert!(res.is_err());
    }

    #[test]
    fn setup_proposal_roundtrips() {
        let proposal = SetupProposal {
            sender_addr: addr(1),
            nonce: 1024,
            min_refund_block: 2150,
            max_refund_block: 2200,
        };
        let bytes = encode(&proposal);
        let back: SetupProposal = decode(&bytes).unwrap();
        assert_eq!(proposal, back);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let proposal = SetupProposal {
            sender_addr: addr(1),
            nonce: 1,
            min_refund_block: 2,
            max_refund_block: 3,
        };
        let mut bytes = encode(&proposal);
        bytes.push(0xFF);
        let res: Result<SetupProposal, _> = decode(&bytes);
        assert!(res.is_err());
    }

    #[test]
    fn payment_roundtrips() {
        let payment = Payment {
            cumulative_amount: 2_000_000,
            settlement_lsig_subsignature: dummy_sig(),
        };
        let bytes = encode(&payment);
        let back: Payment = decode(&bytes).unwrap();
        assert_eq!(payment.cumulative_amount, back.cumulative_amount);
        assert_eq!(
            payment.settlement_lsig_subsignature.as_ref(),
            back.settlement_lsig_subsignature.as_ref()
        );
    }
}
