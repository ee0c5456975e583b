//! Device status codes
//!
//! The status is the first payload byte of every ack frame. Which codes an
//! operation may legally return is operation-specific; anything outside that
//! set must be surfaced as an unknown status, never coerced.

pub const OK: u8 = 0x00;
pub const COMMUNICATION_ERROR: u8 = 0x01;
pub const NO_FINGER: u8 = 0x02;
pub const READ_IMAGE_FAILED: u8 = 0x03;
pub const MESSY_IMAGE: u8 = 0x06;
pub const FEW_FEATURE_POINTS: u8 = 0x07;
pub const NOT_MATCHING: u8 = 0x08;
pub const NO_TEMPLATE_FOUND: u8 = 0x09;
pub const CHARACTERISTICS_MISMATCH: u8 = 0x0A;
pub const INVALID_POSITION: u8 = 0x0B;
pub const LOAD_TEMPLATE_FAILED: u8 = 0x0C;
pub const DOWNLOAD_CHARACTERISTICS_FAILED: u8 = 0x0D;
pub const PACKET_RESPONSE_FAILED: u8 = 0x0E;
pub const DOWNLOAD_IMAGE_FAILED: u8 = 0x0F;
pub const DELETE_TEMPLATE_FAILED: u8 = 0x10;
pub const CLEAR_DATABASE_FAILED: u8 = 0x11;
pub const WRONG_PASSWORD: u8 = 0x13;
pub const INVALID_IMAGE: u8 = 0x15;
pub const FLASH_ERROR: u8 = 0x18;
pub const INVALID_REGISTER: u8 = 0x1A;
pub const ADDRESS_MISMATCH: u8 = 0x20;
