//! Counterpart of `original_source/demos/honest_recipient.py`: accepts
//! one channel proposal, co-signs the refund artifact, then drives
//! payments to completion via `Recipient::run`.

use std::sync::Arc;

use log::info;

use smc_chain_http::HttpLedgerAdapter;
use smc_core::crypto::KeyPair;
use smc_core::utils::from_hex;
use smc_demo::{DemoConfig, TcpTransport};
use smc_manager::{Recipient, Transport};
use smc_messages::{MethodSelector, SetupProposal};
use smc_storage::SledKnownChannels;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = DemoConfig::load()?;

    let secret_bytes = from_hex(&config.secret_key_hex)
        .and_then(|v| <[u8; 32]>::try_from(v).ok())
        .ok_or("SMC_SECRET_KEY must be 32 hex-encoded bytes")?;
    let keypair = KeyPair::from_secret_bytes(secret_bytes)?;

    let ledger = Arc::new(HttpLedgerAdapter::new(config.node_url, config.indexer_url));
    let known_channels_path =
        std::env::var("SMC_KNOWN_CHANNELS_DB").unwrap_or_else(|_| "./smc-known-channels".to_string());
    let known_channels = Arc::new(SledKnownChannels::open(known_channels_path)?);
    let recipient = Recipient::new(keypair, ledger, known_channels);

    let listener = tokio::net::TcpListener::bind(&config.peer_address).await?;
    info!("recipient: listening on {}", config.peer_address);
    let (stream, peer) = listener.accept().await?;
    info!("recipient: accepted connection from {}", peer);
    let mut transport = TcpTransport::new(stream);

    let method_frame = transport
        .recv_frame()
        .await?
        .ok_or("peer closed before sending a method selector")?;
    let method: MethodSelector = smc_messages::decode(&method_frame)
        .map_err(|e| format!("malformed method selector: {:?}", e))?;
    if method != MethodSelector::SetupChannel {
        return Err("expected SETUP_CHANNEL as the first message".into());
    }
    let proposal_frame = transport
        .recv_frame()
        .await?
        .ok_or("peer closed before sending a setup proposal")?;
    let proposal: SetupProposal = smc_messages::decode(&proposal_frame)
        .map_err(|e| format!("malformed setup proposal: {:?}", e))?;

    let mut channel = recipient.handle_setup(&mut transport, proposal).await?;
    recipient.run(&mut transport, &mut channel).await?;
    info!("recipient: channel ended in state {:?}", channel.state);

    Ok(())
}
