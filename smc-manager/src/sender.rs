//! The sender's (Alice's) state machine (§4.4): propose, fund, pay, and
//! eventually either watch the recipient settle or reclaim the refund.

use std::sync::Arc;

use log::{debug, info, warn};

use smc_chain::{ChainError, LedgerAdapter};
use smc_core::{
    crypto::{verify, KeyPair},
    smc_lsig_refund, smc_lsig_settlement, smc_msig, ChannelParameters, Error, RefundArtifact,
};
use smc_messages::{MethodSelector, Payment as WirePayment, SetupProposal, SetupResponse};

use crate::known_channels::KnownChannels;
use crate::poll::{poll_until, REFUND_POLL_INTERVAL};
use crate::transport::Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderState {
    Proposed,
    Accepted,
    Funded,
    Paying,
    Refunding,
    Terminal,
}

/// Everything the sender has committed to for one channel.
pub struct SenderChannel {
    pub params: ChannelParameters,
    pub state: SenderState,
    pub multisig_address: smc_core::Address,
    pub refund_artifact: RefundArtifact,
    /// Monotone non-decreasing (§3).
    pub cumulative_sent: u64,
}

pub struct Sender<L: LedgerAdapter> {
    keypair: KeyPair,
    ledger: Arc<L>,
    known_channels: Arc<dyn KnownChannels>,
}

impl<L: LedgerAdapter> Sender<L> {
    pub fn new(keypair: KeyPair, ledger: Arc<L>, known_channels: Arc<dyn KnownChannels>) -> Self {
        Sender {
            keypair,
            ledger,
            known_channels,
        }
    }

    /// Proposes a channel, validates the recipient's co-signed refund
    /// template, and checks it for replay (§4.4).
    pub async fn setup(
        &self,
        transport: &mut impl Transport,
        params: ChannelParameters,
    ) -> Result<SenderChannel, Error> {
        params.validate()?;
        if params.sender_addr != self.keypair.address() {
            return Err(Error::BadSetup(
                "channel parameters do not name this sender's own address".to_string(),
            ));
        }

        transport
            .send_frame(smc_messages::encode(&MethodSelector::SetupChannel))
            .await?;
        transport
            .send_frame(smc_messages::encode(&SetupProposal {
                sender_addr: params.sender_addr,
                nonce: params.nonce,
                min_refund_block: params.min_refund_block,
                max_refund_block: params.max_refund_block,
            }))
            .await?;

        let frame = transport
            .recv_frame()
            .await?
            .ok_or_else(|| Error::BadSetup("transport closed mid-setup".to_string()))?;
        let response: SetupResponse = smc_messages::decode(&frame)
            .map_err(|e| Error::BadSetup(format!("malformed setup response: {:?}", e)))?;

        if response.recipient_addr != params.recipient_addr {
            return Err(Error::BadSetup(
                "recipient address in response does not match proposal".to_string(),
            ));
        }

        let multisig = smc_msig(
            params.sender_addr,
            params.recipient_addr,
            params.nonce,
            params.min_refund_block,
            params.max_refund_block,
        );

        let mut refund_artifact = smc_lsig_refund(
            params.sender_addr,
            params.min_refund_block,
            params.max_refund_block,
            multisig.address,
        );
        refund_artifact.recipient_subsig = Some(response.refund_lsig_subsignature);
        let msg = refund_artifact.predicate.canonical_bytes();

        // Independently verify the recipient's subsignature before
        // trusting this channel at all, per §4.4. A direct account's
        // address is its own public key, so no separate exchange step
        // is needed to recover it.
        let recipient_pubkey = params.recipient_addr.to_public_key()?;
        verify(
            &recipient_pubkey,
            &msg,
            refund_artifact.recipient_subsig.as_ref().unwrap(),
        )?;

        refund_artifact.sender_subsig = Some(self.keypair.sign(&msg));

        if !self.known_channels.check_and_insert(&multisig.address) {
            return Err(Error::BadSetup(format!(
                "multisig address {} already known (replay)",
                multisig.address
            )));
        }

        info!("sender: channel accepted, multisig {}", multisig.address);

        Ok(SenderChannel {
            params,
            state: SenderState::Accepted,
            multisig_address: multisig.address,
            refund_artifact,
            cumulative_sent: 0,
        })
    }

    /// Funds the multisig and blocks until the indexer, not just the
    /// submission node, reports the account (§4.4, §9 indexer-lag note).
    pub async fn fund(&self, channel: &mut SenderChannel, amount: u64) -> Result<(), Error> {
        if channel.state != SenderState::Accepted {
            return Err(Error::BadSetup(
                "fund() called out of order: channel is not Accepted".to_string(),
            ));
        }

        let sp = self
            .ledger
            .suggested_params()
            .await
            .map_err(chain_err_to_smc)?;
        let tx = smc_core::Transaction {
            from: self.keypair.address(),
            to: channel.multisig_address,
            amount,
            close_remainder_to: self.keypair.address(),
            fee: sp.min_fee,
            first_valid: sp.first_valid,
            last_valid: sp.last_valid,
            rekey_to: None,
        };
        let txid = self.ledger.submit(&tx).await.map_err(chain_err_to_smc)?;
        self.ledger
            .await_confirmation(&txid)
            .await
            .map_err(chain_err_to_smc)?;

        poll_until(REFUND_POLL_INTERVAL, || async {
            match self.ledger.account_balance(&channel.multisig_address).await {
                Ok(balance) if balance >= amount => Some(()),
                Ok(_) | Err(ChainError::NotFound) => None,
                Err(other) => {
                    warn!("sender: fund() poll hit a transport error: {}", other);
                    None
                }
            }
        })
        .await;

        channel.state = SenderState::Funded;
        Ok(())
    }

    /// Sends a new, strictly higher cumulative amount (§3, §4.4). Fire
    /// and forget at the protocol layer: delivery order is guaranteed by
    /// the transport, there is no ack.
    pub async fn pay(
        &self,
        transport: &mut impl Transport,
        channel: &mut SenderChannel,
        cumulative_amount: u64,
    ) -> Result<(), Error> {
        if !matches!(channel.state, SenderState::Funded | SenderState::Paying) {
            return Err(Error::BadSetup(
                "pay() called out of order: channel is not Funded".to_string(),
            ));
        }
        if cumulative_amount <= channel.cumulative_sent {
            return Err(Error::BadSequence(format!(
                "cumulative_amount {} does not exceed previous {}",
                cumulative_amount, channel.cumulative_sent
            )));
        }

        let settlement = smc_lsig_settlement(
            channel.params.sender_addr,
            channel.params.recipient_addr,
            cumulative_amount,
            channel.params.min_refund_block,
            channel.multisig_address,
        );
        let msg = settlement.predicate.canonical_bytes();
        let sender_subsig = self.keypair.sign(&msg);

        transport
            .send_frame(smc_messages::encode(&MethodSelector::Pay))
            .await?;
        transport
            .send_frame(smc_messages::encode(&WirePayment {
                cumulative_amount,
                settlement_lsig_subsignature: sender_subsig,
            }))
            .await?;

        channel.cumulative_sent = cumulative_amount;
        channel.state = SenderState::Paying;
        debug!("sender: paid cumulative_amount={}", cumulative_amount);
        Ok(())
    }

    /// Polls the multisig balance and the chain height until either the
    /// recipient has settled (balance drained) or the refund window
    /// opens, in which case the refund is submitted (§4.4).
    pub async fn refund_watch(&self, channel: &mut SenderChannel) -> Result<(), Error> {
        channel.state = SenderState::Refunding;

        loop {
            match self.ledger.account_balance(&channel.multisig_address).await {
                Ok(0) | Err(ChainError::NotFound) => {
                    channel.state = SenderState::Terminal;
                    return Err(Error::CannotBeRefunded(
                        "multisig is empty or absent: recipient already settled".to_string(),
                    ));
                }
                Err(ChainError::Overspend) => {
                    // §9 open question: the node's overspend rejection is
                    // reinterpreted the same as an already-settled channel
                    // to hide indexer-lag latency.
                    channel.state = SenderState::Terminal;
                    return Err(Error::CannotBeRefunded(
                        "refund rejected as overspend: recipient already settled".to_string(),
                    ));
                }
                Err(ChainError::Transport(e)) => {
                    warn!("sender: refund_watch transport error: {}", e);
                }
                Ok(_) => {}
            }

            let status = self.ledger.status().await.map_err(chain_err_to_smc)?;
            if status.last_round >= channel.params.min_refund_block {
                break;
            }
            tokio::time::sleep(REFUND_POLL_INTERVAL).await;
        }

        let sp = self
            .ledger
            .suggested_params()
            .await
            .map_err(chain_err_to_smc)?;
        let tx = smc_core::smc_txn_refund(
            channel.multisig_address,
            channel.params.sender_addr,
            channel.params.min_refund_block,
            channel.params.max_refund_block,
            sp,
        )?;

        match self.ledger.submit(&tx).await {
            Ok(txid) => {
                self.ledger
                    .await_confirmation(&txid)
                    .await
                    .map_err(chain_err_to_smc)?;
                channel.state = SenderState::Terminal;
                info!("sender: refund confirmed for {}", channel.multisig_address);
                Ok(())
            }
            Err(ChainError::Overspend) | Err(ChainError::NotFound) => {
                channel.state = SenderState::Terminal;
                Err(Error::CannotBeRefunded(
                    "refund submission rejected: recipient already settled".to_string(),
                ))
            }
            Err(ChainError::Transport(e)) => Err(Error::Transient(e)),
        }
    }
}

fn chain_err_to_smc(e: ChainError) -> Error {
    match e {
        ChainError::NotFound => Error::CannotBeRefunded("account not found".to_string()),
        ChainError::Overspend => {
            Error::CannotBeRefunded("transaction rejected as overspend".to_string())
        }
        ChainError::Transport(s) => Error::Transient(s),
    }
}
