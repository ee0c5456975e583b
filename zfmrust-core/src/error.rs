//! Error types for zfmrust-core

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame does not begin with the start code
    #[error("Frame header mismatch: expected 0xEF01, received 0x{received:04X}")]
    HeaderMismatch {
        received: u16,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Unknown packet kind byte
    #[error("Unknown packet kind: 0x{0:02X}")]
    UnknownPacketKind(u8),

    /// Declared length field too small to hold the checksum trailer
    #[error("Declared frame length {0} cannot hold a checksum")]
    InvalidLength(u16),

    /// Invalid session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Session closed after a protocol or transport failure
    #[error("Session closed - rebuild the connection")]
    SessionClosed,
}
