//! Shared configuration and transport glue for the demo binaries. The
//! binaries themselves (`bin/honest_sender.rs` and friends) are the
//! direct counterpart of `original_source/demos/*.py`.

pub mod config;
pub mod tcp_transport;

pub use config::DemoConfig;
pub use tcp_transport::TcpTransport;
