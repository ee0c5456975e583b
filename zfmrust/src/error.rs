//! High-level error types
//!
//! Failure falls into two classes. Protocol, framing and transport failures
//! desynchronize the byte stream and close the session; the caller owns any
//! retry policy and must rebuild the connection. Device status codes are
//! reported in-band: documented error codes become a [`DeviceError`], codes
//! outside an operation's documented set become [`Error::UnknownStatus`],
//! and documented soft conditions (no finger yet, no match found) are
//! ordinary return values, not errors.

use zfmrust_core::PacketKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zfmrust_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zfmrust_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] zfmrust_types::Error),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Status code outside the operation's documented set
    #[error("Unknown device status code: 0x{0:02X}")]
    UnknownStatus(u8),

    /// Argument rejected before any I/O happened
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The sensor answered with the wrong frame kind. The byte stream can no
    /// longer be trusted; the session is closed.
    #[error("Unexpected {actual} frame where {expected} was required")]
    UnexpectedFrame {
        expected: &'static str,
        actual: PacketKind,
    },

    /// Ack payload shorter than the operation's documented response
    #[error("Ack payload too short: expected {expected} bytes, got {actual}")]
    TruncatedResponse {
        expected: usize,
        actual: usize,
    },
}

impl Error {
    /// Check if this failure desynchronized the byte stream
    ///
    /// A fatal error closes the session; the connection must be rebuilt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Core(_) | Self::Transport(_) | Self::UnexpectedFrame { .. }
        )
    }
}

/// Errors reported by the sensor itself, as a status byte in an ack frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("Communication error")]
    CommunicationError,

    #[error("Sensor address mismatch")]
    AddressMismatch,

    #[error("Wrong password")]
    WrongPassword,

    #[error("No finger on the sensor")]
    NoFinger,

    #[error("Failed to read image")]
    ReadImageFailed,

    #[error("Image too messy")]
    MessyImage,

    #[error("Too few feature points in image")]
    FewFeaturePoints,

    #[error("Invalid image")]
    InvalidImage,

    #[error("Characteristics of the two buffers do not combine")]
    CharacteristicsMismatch,

    #[error("Invalid template position")]
    InvalidPosition,

    #[error("Flash write error")]
    FlashError,

    #[error("No matching template found")]
    NoTemplateFound,

    #[error("Failed to load template")]
    LoadTemplateFailed,

    #[error("Failed to delete template")]
    DeleteTemplateFailed,

    #[error("Failed to clear template database")]
    ClearDatabaseFailed,

    #[error("Characteristics do not match")]
    NotMatching,

    #[error("Failed to download image")]
    DownloadImageFailed,

    #[error("Failed to download characteristics")]
    DownloadCharacteristicsFailed,

    #[error("Packet response failure")]
    PacketResponseFailed,

    #[error("Invalid register number")]
    InvalidRegister,
}
