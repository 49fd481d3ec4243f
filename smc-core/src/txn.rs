//! Transaction Builder (§4.2): settlement and refund payment
//! transactions with block-validity windows clamped to the channel's
//! deadlines.

use crate::error::Error;
use crate::params::Address;

/// A conservative ceiling on any transaction's fee, to catch a
/// misconfigured node before funds are risked.
pub const MAX_FEE: u64 = 1_000_000;

/// The subset of a ledger's suggested transaction parameters this
/// builder needs: the node's recommended validity window and minimum
/// fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuggestedParams {
    pub first_valid: u64,
    pub last_valid: u64,
    pub min_fee: u64,
}

/// A payment transaction from the shared multisig, not yet signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub close_remainder_to: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub rekey_to: Option<Address>,
}

fn fee_guard(fee: u64) -> Result<(), Error> {
    if fee > MAX_FEE {
        return Err(Error::FeeTooHigh(fee));
    }
    Ok(())
}

/// Builds the settlement transaction: payment from `msig` to
/// `recipient_addr` of `cumulative_amount`, closing the remainder back
/// to `sender_addr`. The validity window is clamped so that
/// `last_valid < min_refund_block`; fails if no such window remains.
pub fn smc_txn_settlement(
    msig: Address,
    sender_addr: Address,
    recipient_addr: Address,
    cumulative_amount: u64,
    min_refund_block: u64,
    sp: SuggestedParams,
) -> Result<Transaction, Error> {
    fee_guard(sp.min_fee)?;
    if sp.first_valid >= min_refund_block {
        return Err(Error::NoValidityWindow(format!(
            "first_valid {} is already at or past min_refund_block {}",
            sp.first_valid, min_refund_block
        )));
    }
    let last_valid = sp.last_valid.min(min_refund_block - 1);

    Ok(Transaction {
        from: msig,
        to: recipient_addr,
        amount: cumulative_amount,
        close_remainder_to: sender_addr,
        fee: sp.min_fee,
        first_valid: sp.first_valid,
        last_valid,
        rekey_to: None,
    })
}

/// Builds the refund transaction: a zero-value payment from `msig` back
/// to `sender_addr`. The validity window is clamped to the intersection
/// with `[min_refund_block, max_refund_block]`; fails if the
/// intersection is empty.
pub fn smc_txn_refund(
    msig: Address,
    sender_addr: Address,
    min_refund_block: u64,
    max_refund_block: u64,
    sp: SuggestedParams,
) -> Result<Transaction, Error> {
    fee_guard(sp.min_fee)?;
    let first_valid = sp.first_valid.max(min_refund_block);
    let last_valid = sp.last_valid.min(max_refund_block);
    if first_valid > last_valid {
        return Err(Error::NoValidityWindow(format!(
            "no round in [{}, {}] also lies within the suggested window [{}, {}]",
            min_refund_block, max_refund_block, sp.first_valid, sp.last_valid
        )));
    }

    Ok(Transaction {
        from: msig,
        to: sender_addr,
        amount: 0,
        close_remainder_to: sender_addr,
        fee: sp.min_fee,
        first_valid,
        last_valid,
        rekey_to: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_digest([n; 32])
    }

    #[test]
    fn settlement_clamps_last_valid_below_refund_block() {
        let sp = SuggestedParams {
            first_valid: 100,
            last_valid: 3000,
            min_fee: 1000,
        };
        let tx = smc_txn_settlement(addr(9), addr(1), addr(2), 2_000_000, 2150, sp).unwrap();
        assert_eq!(tx.last_valid, 2149);
    }

    #[test]
    fn settlement_fails_with_no_room() {
        let sp = SuggestedParams {
            first_valid: 2150,
            last_valid: 3000,
            min_fee: 1000,
        };
        assert!(smc_txn_settlement(addr(9), addr(1), addr(2), 2_000_000, 2150, sp).is_err());
    }

    #[test]
    fn refund_clamps_to_intersection() {
        let sp = SuggestedParams {
            first_valid: 100,
            last_valid: 3000,
            min_fee: 1000,
        };
        let tx = smc_txn_refund(addr(9), addr(1), 2150, 2200, sp).unwrap();
        assert_eq!(tx.first_valid, 2150);
        assert_eq!(tx.last_valid, 2200);
        assert_eq!(tx.amount, 0);
    }

    #[test]
    fn refund_fails_on_empty_intersection() {
        let sp = SuggestedParams {
            first_valid: 100,
            last_valid: 2149,
            min_fee: 1000,
        };
        assert!(smc_txn_refund(addr(9), addr(1), 2150, 2200, sp).is_err());
    }

    #[test]
    fn fee_guard_rejects_excessive_fee() {
        let sp = SuggestedParams {
            first_valid: 100,
            last_valid: 3000,
            min_fee: MAX_FEE + 1,
        };
        assert!(matches!(
            smc_txn_settlement(addr(9), addr(1), addr(2), 1000, 2150, sp),
            Err(Error::FeeTooHigh(_))
        ));
    }

    #[test]
    fn disjoint_windows_never_overlap() {
        // P2: for any min_refund_block, the settlement window's exclusive
        // upper bound and the refund window's inclusive lower bound never
        // leave a round valid for both.
        let sp = SuggestedParams {
            first_valid: 100,
            last_valid: 5000,
            min_fee: 1000,
        };
        let settle = smc_txn_settlement(addr(9), addr(1), addr(2), 1, 2150, sp).unwrap();
        let refund = smc_txn_refund(addr(9), addr(1), 2150, 2200, sp).unwrap();
        assert!(settle.last_valid < refund.first_valid);
    }
}
