//! Instruction codes
//!
//! The instruction is the first payload byte of a command frame; arguments
//! follow it in big-endian order.

pub const READ_IMAGE: u8 = 0x01;
pub const CONVERT_IMAGE: u8 = 0x02;
pub const COMPARE_CHARACTERISTICS: u8 = 0x03;
pub const SEARCH_TEMPLATE: u8 = 0x04;
pub const CREATE_TEMPLATE: u8 = 0x05;
pub const STORE_TEMPLATE: u8 = 0x06;
pub const LOAD_TEMPLATE: u8 = 0x07;

/// Transfer characteristics from the sensor to the host
pub const DOWNLOAD_CHARACTERISTICS: u8 = 0x08;

/// Transfer characteristics from the host to the sensor
pub const UPLOAD_CHARACTERISTICS: u8 = 0x09;

/// Transfer the image buffer to the host
pub const DOWNLOAD_IMAGE: u8 = 0x0A;

pub const DELETE_TEMPLATE: u8 = 0x0C;
pub const CLEAR_DATABASE: u8 = 0x0D;
pub const SET_SYSTEM_PARAMETER: u8 = 0x0E;
pub const GET_SYSTEM_PARAMETERS: u8 = 0x0F;
pub const SET_PASSWORD: u8 = 0x12;
pub const VERIFY_PASSWORD: u8 = 0x13;
pub const GENERATE_RANDOM_NUMBER: u8 = 0x14;
pub const SET_ADDRESS: u8 = 0x15;
pub const TEMPLATE_COUNT: u8 = 0x1D;
pub const TEMPLATE_INDEX: u8 = 0x1F;

/// Register numbers accepted by [`SET_SYSTEM_PARAMETER`]
pub mod parameter {
    /// Baud rate divisor (rate = divisor * 9600)
    pub const BAUD_RATE: u8 = 4;

    /// Matching security level, 1 (lowest) to 5 (highest)
    pub const SECURITY_LEVEL: u8 = 5;

    /// Transfer packet size code, 0 to 3
    pub const PACKET_SIZE: u8 = 6;
}
