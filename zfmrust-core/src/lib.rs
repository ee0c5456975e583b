//! # zfmrust-core
//!
//! Core protocol implementation for ZFM/R30x fingerprint sensors.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure with incremental encoding/decoding
//! - Checksum calculation
//! - Instruction and status code definitions
//! - Session lifecycle
//!
//! No I/O happens here; the transport lives in `zfmrust-transport`.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod frame;
pub mod instruction;
pub mod session;
pub mod status;

pub use error::{Error, Result};
pub use frame::{Frame, FrameDecoder, PacketKind};
pub use session::{Session, SessionState};
