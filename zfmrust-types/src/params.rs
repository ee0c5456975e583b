//! Sensor system parameters

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Baud rates are expressed on the wire as multiples of this base value
pub const BAUD_RATE_BASE: u32 = 9600;

/// Transfer packet size negotiated with the sensor
///
/// The wire carries a two-bit code; the sensor splits and accepts bulk
/// transfers in chunks of the corresponding byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketSize {
    Bytes32 = 0,
    Bytes64 = 1,
    Bytes128 = 2,
    Bytes256 = 3,
}

impl PacketSize {
    /// Parse the wire code (0 to 3)
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(Self::Bytes32),
            1 => Ok(Self::Bytes64),
            2 => Ok(Self::Bytes128),
            3 => Ok(Self::Bytes256),
            _ => Err(Error::InvalidPacketSizeCode(code)),
        }
    }

    /// Look up the code for a packet size in bytes
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        match bytes {
            32 => Ok(Self::Bytes32),
            64 => Ok(Self::Bytes64),
            128 => Ok(Self::Bytes128),
            256 => Ok(Self::Bytes256),
            _ => Err(Error::UnsupportedPacketSize(bytes)),
        }
    }

    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Packet size in bytes
    pub fn bytes(self) -> usize {
        32 << (self as usize)
    }
}

/// System parameter block returned by the read-parameters instruction
///
/// Fixed big-endian layout, 16 bytes following the ack status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemParameters {
    /// Status register
    pub status_register: u16,

    /// System identifier code
    pub system_id: u16,

    /// Template storage capacity
    pub storage_capacity: u16,

    /// Matching security level (1 to 5)
    pub security_level: u16,

    /// Device address
    pub address: u32,

    /// Negotiated transfer packet size
    pub packet_size: PacketSize,

    /// Baud rate divisor (rate = divisor * 9600)
    pub baud_divisor: u16,
}

impl SystemParameters {
    /// Encoded size of the parameter block
    pub const ENCODED_LEN: usize = 16;

    /// Parse the parameter block (the bytes following the ack status byte)
    ///
    /// Longer payloads are tolerated; some firmware revisions append extra
    /// fields after the documented block.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(Error::TruncatedParameters {
                expected: Self::ENCODED_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            status_register: BigEndian::read_u16(&data[0..2]),
            system_id: BigEndian::read_u16(&data[2..4]),
            storage_capacity: BigEndian::read_u16(&data[4..6]),
            security_level: BigEndian::read_u16(&data[6..8]),
            address: BigEndian::read_u32(&data[8..12]),
            packet_size: PacketSize::from_code(BigEndian::read_u16(&data[12..14]))?,
            baud_divisor: BigEndian::read_u16(&data[14..16]),
        })
    }

    /// Baud rate in bits per second
    pub fn baud_rate(&self) -> u32 {
        u32::from(self.baud_divisor) * BAUD_RATE_BASE
    }

    /// Transfer packet size in bytes
    pub fn max_packet_len(&self) -> usize {
        self.packet_size.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_size_table() {
        assert_eq!(PacketSize::Bytes32.bytes(), 32);
        assert_eq!(PacketSize::Bytes64.bytes(), 64);
        assert_eq!(PacketSize::Bytes128.bytes(), 128);
        assert_eq!(PacketSize::Bytes256.bytes(), 256);

        for code in 0..=3 {
            let size = PacketSize::from_code(code).unwrap();
            assert_eq!(u16::from(size.code()), code);
            assert_eq!(PacketSize::from_bytes(size.bytes()).unwrap(), size);
        }

        assert!(PacketSize::from_code(4).is_err());
        assert!(PacketSize::from_bytes(100).is_err());
    }

    #[test]
    fn test_parse_parameter_block() {
        let data = [
            0x00, 0x00, // status register
            0x00, 0x09, // system id
            0x00, 0x96, // storage capacity: 150
            0x00, 0x03, // security level
            0xFF, 0xFF, 0xFF, 0xFF, // address
            0x00, 0x02, // packet size code: 128 bytes
            0x00, 0x06, // baud divisor: 57600
        ];

        let params = SystemParameters::parse(&data).unwrap();

        assert_eq!(params.status_register, 0);
        assert_eq!(params.system_id, 9);
        assert_eq!(params.storage_capacity, 150);
        assert_eq!(params.security_level, 3);
        assert_eq!(params.address, 0xFFFFFFFF);
        assert_eq!(params.packet_size, PacketSize::Bytes128);
        assert_eq!(params.baud_divisor, 6);
        assert_eq!(params.baud_rate(), 57600);
        assert_eq!(params.max_packet_len(), 128);
    }

    #[test]
    fn test_parse_tolerates_trailing_bytes() {
        let mut data = vec![0u8; 16];
        data[13] = 0x01; // packet size code 64
        data[15] = 0x0C; // divisor 12
        data.extend_from_slice(&[0xAA, 0xBB]); // vendor extension

        let params = SystemParameters::parse(&data).unwrap();
        assert_eq!(params.packet_size, PacketSize::Bytes64);
        assert_eq!(params.baud_rate(), 115_200);
    }

    #[test]
    fn test_parse_truncated() {
        let result = SystemParameters::parse(&[0u8; 10]);

        assert!(matches!(
            result,
            Err(Error::TruncatedParameters {
                expected: 16,
                actual: 10
            })
        ));
    }
}
