//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection timeout")]
    ConnectionTimeout,

    /// The bounded read expired with zero or partial bytes. The byte stream
    /// cannot be trusted afterwards; the session must be closed.
    #[error("Read timeout")]
    ReadTimeout,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Invalid serial port: {0}")]
    InvalidPort(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
