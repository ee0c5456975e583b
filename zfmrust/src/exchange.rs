//! Synchronous command/acknowledgement exchange
//!
//! The line is half-duplex: one command frame goes out, exactly one ack
//! frame comes back. Nothing else may touch the wire in between.

use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

use zfmrust_core::{Frame, FrameDecoder, PacketKind};
use zfmrust_transport::Transport;

use crate::error::{Error, Result};

/// One exchange context borrowed from the sensor
///
/// Holds the transport and the persistent frame decoder; bytes that arrive
/// past the end of a frame stay in the decoder for the next one.
pub(crate) struct Exchange<'a> {
    pub transport: &'a mut dyn Transport,
    pub decoder: &'a mut FrameDecoder,
    pub address: u32,
    pub timeout: Duration,
}

impl Exchange<'_> {
    /// Write a single frame
    pub(crate) async fn write_frame(&mut self, kind: PacketKind, payload: Bytes) -> Result<()> {
        let frame = Frame::with_payload(kind, self.address, payload);
        trace!("Sending: {:?}", frame);

        let data = frame.encode();
        self.transport.send(&data).await?;

        Ok(())
    }

    /// Read a single frame, pulling bytes from the transport until the
    /// decoder completes one
    pub(crate) async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                trace!("Received: {:?}", frame);
                return Ok(frame);
            }

            let bytes = self.transport.receive(self.timeout).await?;
            self.decoder.feed(&bytes);
        }
    }

    /// Read one frame and require it to be an acknowledgement
    ///
    /// Returns the device status byte and the rest of the ack payload.
    pub(crate) async fn read_ack(&mut self) -> Result<(u8, Bytes)> {
        let frame = self.read_frame().await?;

        if frame.kind != PacketKind::Ack {
            return Err(Error::UnexpectedFrame {
                expected: "ack",
                actual: frame.kind,
            });
        }

        let Some(&status) = frame.payload.first() else {
            return Err(Error::TruncatedResponse {
                expected: 1,
                actual: 0,
            });
        };

        Ok((status, frame.payload.slice(1..)))
    }

    /// Send one command frame and read the matching acknowledgement
    pub(crate) async fn execute(&mut self, payload: Bytes) -> Result<(u8, Bytes)> {
        self.write_frame(PacketKind::Command, payload).await?;
        self.read_ack().await
    }
}
