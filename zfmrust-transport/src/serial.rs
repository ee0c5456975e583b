//! Serial transport
//!
//! The sensor hangs off a half-duplex UART (8 data bits, no parity, one
//! stop bit). The `serialport` crate provides a blocking port handle, so
//! every call runs on the tokio blocking pool.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use serialport::SerialPort;
use tokio::task;
use tracing::{debug, trace, warn};

use crate::{Transport, error::*};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Serial transport for ZFM sensors
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    port: Option<SharedPort>,
    open_timeout: Duration,
    read_chunk: usize,
}

impl SerialTransport {
    /// Create a new serial transport
    ///
    /// `path` names the device, e.g. `/dev/ttyUSB0` or `/dev/ttyAMA0`.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            port: None,
            open_timeout: Duration::from_secs(2),
            read_chunk: 512,
        }
    }

    /// Set the timeout the port is opened with
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let path = self.path.clone();
        let baud_rate = self.baud_rate;
        let timeout = self.open_timeout;

        debug!("Opening {} at {} baud...", path, baud_rate);

        let port = task::spawn_blocking(move || {
            serialport::new(&path, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .timeout(timeout)
                .open()
        })
        .await
        .map_err(join_error)?
        .map_err(|e| Error::InvalidPort(format!("{}: {}", self.path, e)))?;

        debug!("Opened {}", self.path);

        self.port = Some(Arc::new(Mutex::new(port)));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("Closing {}", self.path);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_ref().ok_or(Error::NotConnected)?.clone();

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        let data = data.to_vec();
        task::spawn_blocking(move || {
            let mut port = port.lock();
            port.write_all(&data)?;
            port.flush()
        })
        .await
        .map_err(join_error)?
        .map_err(Error::Io)?;

        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        let port = self.port.as_ref().ok_or(Error::NotConnected)?.clone();
        let chunk = self.read_chunk;

        let read = task::spawn_blocking(move || -> io::Result<Vec<u8>> {
            let mut port = port.lock();
            port.set_timeout(timeout).map_err(io::Error::other)?;

            let mut buf = vec![0u8; chunk];
            let n = port.read(&mut buf)?;
            buf.truncate(n);
            Ok(buf)
        })
        .await
        .map_err(join_error)?;

        match read {
            Ok(buf) if buf.is_empty() => Err(Error::ConnectionClosed),
            Ok(buf) => {
                trace!("Received {} bytes: {:02X?}", buf.len(), &buf[..buf.len().min(16)]);
                Ok(BytesMut::from(&buf[..]))
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(Error::ReadTimeout),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}@{}", self.path, self.baud_rate)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still open");
        }
    }
}

fn join_error(e: task::JoinError) -> Error {
    Error::Io(io::Error::other(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serial_transport_create() {
        let transport = SerialTransport::new("/dev/ttyUSB0", 57_600);
        assert!(!transport.is_connected());
        assert_eq!(transport.endpoint(), "/dev/ttyUSB0@57600");
    }

    #[tokio::test]
    async fn test_serial_transport_requires_connect() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0", 57_600);

        let result = transport.send(&[0xEF, 0x01]).await;
        assert!(matches!(result, Err(Error::NotConnected)));

        let result = transport.receive(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_serial_transport_invalid_path() {
        let mut transport = SerialTransport::new("/definitely/not/a/port", 57_600);

        let result = transport.connect().await;
        assert!(matches!(result, Err(Error::InvalidPort(_))));
    }
}
