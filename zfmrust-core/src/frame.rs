//! ZFM protocol frame structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::trace;

use crate::{
    checksum,
    constants::{CHECKSUM_LEN, HEADER_LEN, START_CODE},
    error::{Error, Result},
};

/// Frame kind byte
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// Command from the host to the sensor
    Command = 0x01,

    /// Bulk data, more frames follow
    Data = 0x02,

    /// Acknowledgement from the sensor, first payload byte is the status
    Ack = 0x07,

    /// Bulk data, last frame of the transfer
    EndData = 0x08,
}

impl PacketKind {
    /// Get the kind name
    pub fn name(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Data => "data",
            Self::Ack => "ack",
            Self::EndData => "end-data",
        }
    }

    /// Check if this kind belongs to a bulk transfer
    pub fn is_stream_data(self) -> bool {
        matches!(self, Self::Data | Self::EndData)
    }
}

impl From<PacketKind> for u8 {
    fn from(kind: PacketKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndData),
            _ => Err(Error::UnknownPacketKind(value)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// ZFM protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────────┬───────────┬────────┬────────────┬───────────┬────────────┐
/// │ Start code │  Address  │  Kind  │   Length   │  Payload  │  Checksum  │
/// │  2 bytes   │  4 bytes  │ 1 byte │  2 bytes   │  N bytes  │  2 bytes   │
/// │  (0xEF01)  │  (BE u32) │        │  (BE u16)  │           │  (BE u16)  │
/// └────────────┴───────────┴────────┴────────────┴───────────┴────────────┘
/// ```
///
/// All multi-byte values are big-endian. The length field is the payload
/// length plus the two checksum bytes; the checksum covers kind, length and
/// payload.
///
/// # Examples
///
/// ```
/// use zfmrust_core::{Frame, FrameDecoder, PacketKind};
///
/// let frame = Frame::with_payload(PacketKind::Command, 0xFFFFFFFF, vec![0x0F]);
/// let encoded = frame.encode();
///
/// let mut decoder = FrameDecoder::new();
/// decoder.feed(&encoded);
/// let decoded = decoder.next_frame().unwrap().unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind
    pub kind: PacketKind,

    /// Device address the frame is sent to or from
    pub address: u32,

    /// Frame payload (instruction + arguments, status + results, or raw
    /// bulk bytes)
    pub payload: Bytes,
}

impl Frame {
    /// Maximum payload size the 16-bit length field can describe
    pub const MAX_PAYLOAD: usize = u16::MAX as usize - CHECKSUM_LEN;

    /// Create a new frame with empty payload
    pub fn new(kind: PacketKind, address: u32) -> Self {
        Self {
            kind,
            address,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    pub fn with_payload(kind: PacketKind, address: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            address,
            payload: payload.into(),
        }
    }

    /// Calculate the checksum for this frame
    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.kind.into(), self.length(), &self.payload)
    }

    /// Value of the wire length field (payload + checksum trailer)
    pub fn length(&self) -> u16 {
        (self.payload.len() + CHECKSUM_LEN) as u16
    }

    /// Encode the frame to bytes
    ///
    /// Encoding cannot fail; payload length is bounded by the transfer
    /// manager before a frame is ever built.
    pub fn encode(&self) -> BytesMut {
        debug_assert!(self.payload.len() <= Self::MAX_PAYLOAD);

        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len() + CHECKSUM_LEN);

        buf.put_u16(START_CODE);
        buf.put_u32(self.address);
        buf.put_u8(self.kind.into());
        buf.put_u16(self.length());
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());

        buf
    }

    /// Get total encoded size
    pub fn size(&self) -> usize {
        HEADER_LEN + self.payload.len() + CHECKSUM_LEN
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind)
            .field("address", &format!("0x{:08X}", self.address))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}](address=0x{:08X}, len={})",
            self.kind,
            self.address,
            self.payload.len()
        )
    }
}

/// Incremental frame decoder
///
/// The sensor talks over a byte stream, so a single read may return a
/// fragment of a frame, a whole frame, or several frames back to back. The
/// decoder buffers whatever arrives via [`feed`](Self::feed) and hands out
/// complete frames from [`next_frame`](Self::next_frame); bytes left over
/// after a frame stay buffered for the next one.
///
/// Feeding the stream one byte at a time produces byte-identical results to
/// feeding it all at once.
///
/// A decode error means the byte stream is desynchronized. There is no
/// resynchronization: the caller must drop the connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes to the internal buffer
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to decode the next complete frame
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// - [`Error::HeaderMismatch`] as soon as the first two buffered bytes
    ///   differ from the start code
    /// - [`Error::InvalidLength`] if the declared length cannot hold the
    ///   checksum trailer
    /// - [`Error::ChecksumMismatch`] if the recomputed checksum differs from
    ///   the trailing bytes
    /// - [`Error::UnknownPacketKind`] for an unrecognized kind byte
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        // The start code can be rejected before the rest of the header is in
        if self.buf.len() >= 2 {
            let start = u16::from_be_bytes([self.buf[0], self.buf[1]]);
            if start != START_CODE {
                return Err(Error::HeaderMismatch { received: start });
            }
        }

        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let declared = u16::from_be_bytes([self.buf[7], self.buf[8]]);
        if usize::from(declared) < CHECKSUM_LEN {
            return Err(Error::InvalidLength(declared));
        }

        let total = HEADER_LEN + usize::from(declared);
        if self.buf.len() < total {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(total);
        frame.advance(2); // start code, already validated
        let address = frame.get_u32();
        let kind_raw = frame.get_u8();
        let length = frame.get_u16();
        let payload = frame.split_to(usize::from(length) - CHECKSUM_LEN).freeze();
        let received = frame.get_u16();

        let calculated = checksum::calculate(kind_raw, length, &payload);
        if calculated != received {
            return Err(Error::ChecksumMismatch {
                expected: calculated,
                received,
            });
        }

        let kind = PacketKind::try_from(kind_raw)?;

        trace!(
            kind = %kind,
            address = format!("0x{:08X}", address),
            payload = %hex::encode(&payload),
            "Decoded frame"
        );

        Ok(Some(Frame {
            kind,
            address,
            payload,
        }))
    }
}
