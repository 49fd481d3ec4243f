//! Counterpart of `original_source/demos/undercollateralized_sender.py`:
//! a sender that claims more than it funded, to exercise the
//! recipient's `BAD_FUNDING` rejection end to end.

use std::sync::Arc;

use log::info;

use smc_chain_http::HttpLedgerAdapter;
use smc_core::crypto::KeyPair;
use smc_core::utils::from_hex;
use smc_core::ChannelParameters;
use smc_demo::{DemoConfig, TcpTransport};
use smc_manager::{InMemoryKnownChannels, Sender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = DemoConfig::load()?;

    let secret_bytes = from_hex(&config.secret_key_hex)
        .and_then(|v| <[u8; 32]>::try_from(v).ok())
        .ok_or("SMC_SECRET_KEY must be 32 hex-encoded bytes")?;
    let sender_addr = KeyPair::from_secret_bytes(secret_bytes)?.address();
    let keypair = KeyPair::from_secret_bytes(secret_bytes)?;

    let recipient_addr: smc_core::Address = std::env::var("SMC_RECIPIENT_ADDRESS")
        .map_err(|_| "SMC_RECIPIENT_ADDRESS is not set")?
        .parse()?;

    let ledger = Arc::new(HttpLedgerAdapter::new(config.node_url, config.indexer_url));
    let sender = Sender::new(keypair, ledger, Arc::new(InMemoryKnownChannels::new()));

    let stream = tokio::net::TcpStream::connect(&config.peer_address).await?;
    let mut transport = TcpTransport::new(stream);

    let params = ChannelParameters::new(sender_addr, recipient_addr, 1025, 2150, 2200)?;
    let mut channel = sender.setup(&mut transport, params).await?;
    sender.fund(&mut channel, 10_000_000).await?;
    sender.pay(&mut transport, &mut channel, 5_000_000).await?;
    // Claims more than the multisig holds; the recipient must reject
    // this with BAD_FUNDING while keeping the earlier 5_000_000 valid.
    sender.pay(&mut transport, &mut channel, 11_000_000).await?;

    info!("sender: sent an overclaim, exiting without watching for refund");
    Ok(())
}
