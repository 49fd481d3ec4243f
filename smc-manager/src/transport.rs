//! The framed bidirectional byte stream between the two parties (§6).
//! Framing and transport-level back-pressure are delegated to the
//! implementation; the protocol only needs one frame in, one frame out,
//! and a way to observe that the peer closed the connection.

use async_trait::async_trait;

use smc_core::Error;

#[async_trait]
pub trait Transport: Send {
    async fn send_frame(&mut self, bytes: Vec<u8>) -> Result<(), Error>;

    /// `Ok(None)` signals the peer closed the connection (§5 cancellation:
    /// this cancels all pending waits on the connection).
    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, Error>;
}
