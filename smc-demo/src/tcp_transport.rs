//! A real socket `Transport` (§6) for the demo binaries: each frame is a
//! big-endian `u32` length prefix followed by that many bytes, over a
//! plain TCP stream - the simplest possible framing satisfying the
//! protocol's "one frame in, one frame out" contract.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use async_trait::async_trait;
use smc_core::Error;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }
}

#[async_trait]
impl smc_manager::Transport for TcpTransport {
    async fn send_frame(&mut self, bytes: Vec<u8>) -> Result<(), Error> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| Error::Transient("frame too large to send".to_string()))?;
        self.stream
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| Error::Transient(e.to_string()))?;
        self.stream
            .write_all(&bytes)
            .await
            .map_err(|e| Error::Transient(e.to_string()))
    }

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let mut len_buf = [0u8; 4];
        match self.stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(Error::Transient(e.to_string())),
        }
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        self.stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| Error::Transient(e.to_string()))?;
        Ok(Some(buf))
    }
}
