//! Derivation of the shared multisig account (§4.1).
//!
//! (A)lice is the sender, (B)ob the recipient. (C)ontract is the
//! fictitious logic-signature account that always fails to authorise a
//! transaction but generates a distinct address based on the channel's
//! parameters. C's sole role is to hash the channel's parameter tuple
//! into the multisig address, making multisig addresses a
//! collision-resistant commitment to `(nonce, min_refund_block,
//! max_refund_block)` for O(1) duplicate-channel detection (P3).

use crate::params::Address;
use crate::utils::hash32;

/// 2-of-3: sender, recipient, and the inert contract account.
pub const THRESHOLD: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultisigTemplate {
    pub threshold: u8,
    pub sender_addr: Address,
    pub recipient_addr: Address,
    pub contract_addr: Address,
    pub address: Address,
}

/// Builds the never-satisfiable program whose only purpose is to carry
/// `(nonce, min_refund_block, max_refund_block)` into its address. It
/// terminates with more than one element left on the evaluation stack,
/// which every ledger that supports logic signatures rejects
/// unconditionally: the account can never authorise a spend.
fn unsatisfiable_program(nonce: u64, min_refund_block: u64, max_refund_block: u64) -> Vec<u8> {
    format!(
        "int {}\nint {}\nint {}\nint 0",
        nonce, min_refund_block, max_refund_block
    )
    .into_bytes()
}

/// Compiles a program to its account address. A stand-in for the real
/// ledger's logic-signature compiler (out of scope, §1); see
/// `smc_chain::LedgerAdapter::compile_program` for the live equivalent
/// used once an actual node is available.
pub fn compile_program(program: &[u8]) -> Address {
    Address::from_digest(hash32(program))
}

/// Derives the shared multisig account for a channel.
pub fn smc_msig(
    sender_addr: Address,
    recipient_addr: Address,
    nonce: u64,
    min_refund_block: u64,
    max_refund_block: u64,
) -> MultisigTemplate {
    let program = unsatisfiable_program(nonce, min_refund_block, max_refund_block);
    let contract_addr = compile_program(&program);

    let mut canonical = Vec::with_capacity(1 + 32 * 3);
    canonical.push(THRESHOLD);
    canonical.extend_from_slice(sender_addr.as_bytes());
    canonical.extend_from_slice(recipient_addr.as_bytes());
    canonical.extend_from_slice(contract_addr.as_bytes());
    let address = Address::from_digest(hash32(&canonical));

    MultisigTemplate {
        threshold: THRESHOLD,
        sender_addr,
        recipient_addr,
        contract_addr,
        address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_digest([n; 32])
    }

    #[test]
    fn distinct_nonce_yields_distinct_address() {
        let a = smc_msig(addr(1), addr(2), 1, 100, 200);
        let b = smc_msig(addr(1), addr(2), 2, 100, 200);
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn distinct_refund_window_yields_distinct_address() {
        let a = smc_msig(addr(1), addr(2), 1, 100, 200);
        let b = smc_msig(addr(1), addr(2), 1, 100, 201);
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn same_parameters_yield_same_address() {
        let a = smc_msig(addr(1), addr(2), 1024, 2150, 2200);
        let b = smc_msig(addr(1), addr(2), 1024, 2150, 2200);
        assert_eq!(a.address, b.address);
    }
}
