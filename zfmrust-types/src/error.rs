pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid packet size code: {0}")]
    InvalidPacketSizeCode(u16),

    #[error("Unsupported packet size: {0} bytes")]
    UnsupportedPacketSize(usize),

    #[error("Truncated parameter block: expected {expected} bytes, got {actual}")]
    TruncatedParameters { expected: usize, actual: usize },

    #[error("Truncated image stream: expected {expected} bytes, got {actual}")]
    TruncatedImage { expected: usize, actual: usize },
}
