//! Hand-rolled (de)serialization helpers for the domain types that
//! `lightning::util::ser` does not know how to encode directly, mirroring
//! the `read_ecdsa_adaptor_signature`/`write_ecdsa_adaptor_signature`
//! helper pair the teacher protocol uses for its own exotic signature
//! type.

use lightning::ln::msgs::DecodeError;
use lightning::util::ser::Writer;
use secp256k1_zkp::schnorr::Signature;
use std::io::Read;

use smc_core::Address;

pub fn write_address<W: Writer>(addr: &Address, writer: &mut W) -> Result<(), lightning::io::Error> {
    writer.write_all(addr.as_bytes())
}

pub fn read_address<R: Read>(reader: &mut R) -> Result<Address, DecodeError> {
    let mut buf = [0u8; 32];
    reader
        .read_exact(&mut buf)
        .map_err(|_| DecodeError::ShortRead)?;
    Ok(Address::from_digest(buf))
}

pub fn write_signature<W: Writer>(
    sig: &Signature,
    writer: &mut W,
) -> Result<(), lightning::io::Error> {
    writer.write_all(sig.as_ref())
}

pub fn read_signature<R: Read>(reader: &mut R) -> Result<Signature, DecodeError> {
    let mut buf = [0u8; 64];
    reader
        .read_exact(&mut buf)
        .map_err(|_| DecodeError::ShortRead)?;
    Signature::from_slice(&buf).map_err(|_| DecodeError::InvalidValue)
}
