//! In-memory stand-ins for the ledger node and the transport, used by
//! integration tests and the demo binary in place of a real chain/socket.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;

use smc_chain::{ChainError, CompiledProgram, LedgerAdapter, Status, TxId};
use smc_core::{Address, SuggestedParams, Transaction};
use smc_manager::Transport;

/// An in-memory ledger: a round counter and a map of account balances.
/// `submit` applies payments (and close-remainder-to sweeps) immediately
/// and `await_confirmation` is a no-op, since there is no real
/// consensus delay to model.
pub struct MockLedger {
    state: Mutex<MockLedgerState>,
}

struct MockLedgerState {
    round: u64,
    balances: HashMap<Address, u64>,
}

impl MockLedger {
    pub fn new(round: u64) -> Self {
        MockLedger {
            state: Mutex::new(MockLedgerState {
                round,
                balances: HashMap::new(),
            }),
        }
    }

    /// Test/demo helper: credits an account outside of any transaction
    /// (e.g. to seed the sender's opening balance).
    pub fn seed_balance(&self, addr: Address, amount: u64) {
        let mut state = self.state.lock().expect("mock ledger mutex poisoned");
        *state.balances.entry(addr).or_insert(0) += amount;
    }

    /// Test/demo helper: advances the round counter, as a real block
    /// loop would.
    pub fn advance_round(&self, by: u64) {
        let mut state = self.state.lock().expect("mock ledger mutex poisoned");
        state.round += by;
    }
}

#[async_trait]
impl LedgerAdapter for MockLedger {
    async fn status(&self) -> Result<Status, ChainError> {
        let state = self.state.lock().expect("mock ledger mutex poisoned");
        Ok(Status {
            last_round: state.round,
        })
    }

    async fn account_balance(&self, addr: &Address) -> Result<u64, ChainError> {
        let state = self.state.lock().expect("mock ledger mutex poisoned");
        match state.balances.get(addr) {
            Some(0) | None => Err(ChainError::NotFound),
            Some(&balance) => Ok(balance),
        }
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, ChainError> {
        let state = self.state.lock().expect("mock ledger mutex poisoned");
        Ok(SuggestedParams {
            first_valid: state.round,
            last_valid: state.round + 1000,
            min_fee: 1000,
        })
    }

    async fn submit(&self, tx: &Transaction) -> Result<TxId, ChainError> {
        let mut state = self.state.lock().expect("mock ledger mutex poisoned");
        if state.round < tx.first_valid || state.round > tx.last_valid {
            return Err(ChainError::Transport(format!(
                "round {} is outside validity window [{}, {}]",
                state.round, tx.first_valid, tx.last_valid
            )));
        }
        let available = *state.balances.get(&tx.from).unwrap_or(&0);
        let spent = tx.amount + tx.fee;
        if spent > available {
            return Err(ChainError::Overspend);
        }

        state.balances.insert(tx.from, 0);
        *state.balances.entry(tx.to).or_insert(0) += tx.amount;
        let remainder = available - spent;
        if remainder > 0 {
            *state.balances.entry(tx.close_remainder_to).or_insert(0) += remainder;
        }

        debug!(
            "mock ledger: submitted {} -> {} amount={} fee={}",
            tx.from, tx.to, tx.amount, tx.fee
        );
        Ok(TxId(*tx.from.as_bytes()))
    }

    async fn await_confirmation(&self, _txid: &TxId) -> Result<(), ChainError> {
        Ok(())
    }

    async fn compile_program(&self, source: &[u8]) -> Result<CompiledProgram, ChainError> {
        Ok(CompiledProgram {
            bytecode: source.to_vec(),
            address: smc_core::compile_program(source),
        })
    }
}

/// One end of an in-memory duplex byte-frame channel. `channel_pair`
/// produces a connected sender/recipient pair.
pub struct MockTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MockTransport {
    pub fn channel_pair() -> (MockTransport, MockTransport) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        (
            MockTransport {
                outbound: tx_a,
                inbound: rx_b,
            },
            MockTransport {
                outbound: tx_b,
                inbound: rx_a,
            },
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_frame(&mut self, bytes: Vec<u8>) -> Result<(), smc_core::Error> {
        self.outbound
            .send(bytes)
            .map_err(|_| smc_core::Error::Transient("peer transport dropped".to_string()))
    }

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, smc_core::Error> {
        Ok(self.inbound.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_delivers_frames_in_order() {
        let (mut a, mut b) = MockTransport::channel_pair();
        a.send_frame(vec![1, 2, 3]).await.unwrap();
        a.send_frame(vec![4, 5]).await.unwrap();
        assert_eq!(b.recv_frame().await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(b.recv_frame().await.unwrap(), Some(vec![4, 5]));
    }

    #[tokio::test]
    async fn mock_transport_reports_close_as_none() {
        let (a, mut b) = MockTransport::channel_pair();
        drop(a);
        assert_eq!(b.recv_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn mock_ledger_submit_drains_close_remainder() {
        let ledger = MockLedger::new(100);
        let from = Address::from_digest([1u8; 32]);
        let to = Address::from_digest([2u8; 32]);
        let remainder = Address::from_digest([3u8; 32]);
        ledger.seed_balance(from, 10_000);

        let tx = Transaction {
            from,
            to,
            amount: 4_000,
            close_remainder_to: remainder,
            fee: 1000,
            first_valid: 100,
            last_valid: 200,
            rekey_to: None,
        };
        ledger.submit(&tx).await.unwrap();

        assert_eq!(ledger.account_balance(&to).await.unwrap(), 4_000);
        assert_eq!(ledger.account_balance(&remainder).await.unwrap(), 5_000);
        assert!(matches!(
            ledger.account_balance(&from).await,
            Err(ChainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn mock_ledger_submit_rejects_overspend() {
        let ledger = MockLedger::new(100);
        let from = Address::from_digest([1u8; 32]);
        let to = Address::from_digest([2u8; 32]);
        ledger.seed_balance(from, 1_000);

        let tx = Transaction {
            from,
            to,
            amount: 5_000,
            close_remainder_to: from,
            fee: 1000,
            first_valid: 100,
            last_valid: 200,
            rekey_to: None,
        };
        assert!(matches!(
            ledger.submit(&tx).await,
            Err(ChainError::Overspend)
        ));
    }
}
