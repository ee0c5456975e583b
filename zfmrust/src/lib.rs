//! # zfmrust
//!
//! Rust driver for ZhianTec ZFM/R30x optical fingerprint sensors.
//!
//! ## Features
//!
//! - Exact wire-level framing with checksum validation
//! - Async API over serial ports or RS232-to-TCP bridges
//! - Chunked streaming transfer of images and characteristics
//! - Soft outcomes (no finger, no match) as ordinary return values
//!
//! ## Quick Start
//!
//! ```no_run
//! use zfmrust::{CharBuffer, Sensor};
//!
//! #[tokio::main]
//! async fn main() -> zfmrust::Result<()> {
//!     let mut sensor = Sensor::new("/dev/ttyUSB0", 57_600)?;
//!     sensor.connect().await?;
//!
//!     if sensor.verify_password().await? {
//!         let count = sensor.get_template_count().await?;
//!         println!("{count} templates enrolled");
//!     }
//!
//!     sensor.close().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sensor;

mod exchange;
mod stream;

// Re-exports
pub use error::{DeviceError, Error, Result};
pub use sensor::{Sensor, SensorConfig};

// Re-export protocol and transport types
pub use zfmrust_core::{Frame, FrameDecoder, PacketKind, Session, SessionState};
pub use zfmrust_transport::{SerialTransport, TcpTransport, Transport};
pub use zfmrust_types::{CharBuffer, FingerImage, PacketSize, SystemParameters};
