//! Counterpart of `original_source/demos/performance_measure.py`:
//! streams payments for a fixed wall-clock window and reports how many
//! were sent, to compare off-chain throughput against on-chain-only
//! settlement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use smc_chain_http::HttpLedgerAdapter;
use smc_core::crypto::KeyPair;
use smc_core::utils::from_hex;
use smc_core::ChannelParameters;
use smc_demo::{DemoConfig, TcpTransport};
use smc_manager::{InMemoryKnownChannels, Sender};

const TIME_WINDOW: Duration = Duration::from_secs(5);

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

    let params = ChannelParameters::new(sender_addr, recipient_addr, 7000, 7000, 7050)?;
    let mut channel = sender.setup(&mut transport, params).await?;
    sender.fund(&mut channel, 10_000_000).await?;

    let start = Instant::now();
    let mut amount: u64 = 0;
    loop {
        amount += 1;
        sender.pay(&mut transport, &mut channel, amount).await?;
        if start.elapsed() >= TIME_WINDOW {
            break;
        }
    }
    let elapsed = start.elapsed();

    println!("elapsed = {:?}", elapsed);
    println!("payments sent = {}", amount);
    Ok(())
}
