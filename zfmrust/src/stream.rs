//! Chunked streaming transfer of bulk data
//!
//! Raw images and characteristics exceed a single frame, so they move as a
//! run of data frames closed by one end-data frame. Arrival order is payload
//! order; no frame may be skipped or reordered.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use zfmrust_core::PacketKind;

use crate::error::{Error, Result};
use crate::exchange::Exchange;

/// Split a payload into full-size chunks plus the final end chunk
///
/// Every chunk is exactly `max_packet_size` bytes; the remainder travels in
/// the end-data frame. An exact multiple leaves the end chunk empty, and the
/// empty end-data frame is still sent: the receiver has no other way to know
/// the transfer is over.
pub(crate) fn split_chunks(data: &[u8], max_packet_size: usize) -> (Vec<&[u8]>, &[u8]) {
    debug_assert!(max_packet_size > 0);

    let full = data.len() / max_packet_size;
    let mut chunks = Vec::with_capacity(full);

    for i in 0..full {
        chunks.push(&data[i * max_packet_size..(i + 1) * max_packet_size]);
    }

    (chunks, &data[full * max_packet_size..])
}

/// Send `data` as data frames terminated by an end-data frame
pub(crate) async fn send(
    exchange: &mut Exchange<'_>,
    data: &[u8],
    max_packet_size: usize,
) -> Result<()> {
    let (chunks, tail) = split_chunks(data, max_packet_size);

    debug!(
        "Streaming {} bytes out in {} frames",
        data.len(),
        chunks.len() + 1
    );

    for chunk in chunks {
        exchange
            .write_frame(PacketKind::Data, Bytes::copy_from_slice(chunk))
            .await?;
    }

    exchange
        .write_frame(PacketKind::EndData, Bytes::copy_from_slice(tail))
        .await?;

    Ok(())
}

/// Receive data frames until the end-data frame
///
/// Payloads are concatenated in arrival order.
pub(crate) async fn receive(exchange: &mut Exchange<'_>) -> Result<Bytes> {
    let mut data = BytesMut::new();

    loop {
        let frame = exchange.read_frame().await?;

        match frame.kind {
            PacketKind::Data => data.extend_from_slice(&frame.payload),
            PacketKind::EndData => {
                data.extend_from_slice(&frame.payload);
                trace!("Stream complete: {} bytes", data.len());
                return Ok(data.freeze());
            }
            other => {
                return Err(Error::UnexpectedFrame {
                    expected: "data",
                    actual: other,
                });
            }
        }
    }
}
