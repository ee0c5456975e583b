//! Transport layer for ZFM sensors
//!
//! Moves raw bytes between the host and the sensor; framing lives one layer
//! up in `zfmrust-core`. The sensor is usually wired to a local UART
//! ([`SerialTransport`]), or reachable through an RS232-to-TCP device server
//! ([`TcpTransport`]).

pub mod error;
pub mod serial;
pub mod tcp;

pub use error::{Error, Result};
pub use serial::SerialTransport;
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for the byte link to the sensor
///
/// The link is half-duplex: the caller alternates between `send` and
/// `receive` and never does both at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link
    async fn connect(&mut self) -> Result<()>;

    /// Release the link
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the link is open
    fn is_connected(&self) -> bool;

    /// Write raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever bytes are available, waiting at most `timeout`
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Human-readable endpoint description
    fn endpoint(&self) -> String;
}
