//! Counterpart of `original_source/demos/honest_sender.py`: proposes a
//! channel, funds it, pays twice, then watches for either settlement or
//! the refund window.

use std::sync::Arc;

use log::info;

use smc_chain_http::HttpLedgerAdapter;
use smc_core::crypto::KeyPair;
use smc_core::utils::from_hex;
use smc_core::{ChannelParameters, Error};
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

    // Mirrors the reference parameters in honest_sender.py.
    let params = ChannelParameters::new(sender_addr, recipient_addr, 1024, 2150, 2200)?;

    let mut channel = sender.setup(&mut transport, params).await?;
    sender.fund(&mut channel, 10_000_000).await?;
    sender.pay(&mut transport, &mut channel, 1_000_000).await?;
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    sender.pay(&mut transport, &mut channel, 2_000_000).await?;

    // An honest sender keeps watching the chain in case the recipient
    // never settles; `CannotBeRefunded` just means settlement beat us
    // to it, which is the expected happy path.
    match sender.refund_watch(&mut channel).await {
        Ok(()) => info!("sender: refund succeeded"),
        Err(Error::CannotBeRefunded(_)) => info!("sender: recipient settled the channel"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
