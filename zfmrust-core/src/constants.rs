//! Protocol constants

/// Fixed start code beginning every frame
pub const START_CODE: u16 = 0xEF01;

/// Factory default sensor address
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default sensor password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Factory default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Frame header size: start code (2) + address (4) + kind (1) + length (2)
pub const HEADER_LEN: usize = 9;

/// Checksum trailer size
pub const CHECKSUM_LEN: usize = 2;

/// Recommended per-frame read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 2;
