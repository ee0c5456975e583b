//! Scripted transport for driving the sensor without hardware

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

use zfmrust::{Frame, FrameDecoder, PacketKind, Sensor, Transport};
use zfmrust_core::constants::DEFAULT_ADDRESS;

/// Transport that replays queued response chunks and logs every write
///
/// Clones share state, so tests keep a handle for inspection after the
/// sensor takes ownership of its copy. An exhausted response queue behaves
/// like a dead line: `receive` reports a read timeout.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    written: Vec<u8>,
    responses: VecDeque<Vec<u8>>,
    connected: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an encoded frame as one receive chunk
    pub fn push_frame(&self, kind: PacketKind, payload: &[u8]) {
        let frame = Frame::with_payload(kind, DEFAULT_ADDRESS, payload.to_vec());
        self.push_bytes(&frame.encode());
    }

    /// Queue an ack frame with the given payload
    pub fn push_ack(&self, payload: &[u8]) {
        self.push_frame(PacketKind::Ack, payload);
    }

    /// Queue raw bytes as one receive chunk
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push_back(bytes.to_vec());
    }

    /// Everything the driver wrote, in order
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    /// Parse the write log back into frames
    pub fn written_frames(&self) -> Vec<Frame> {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&self.written());

        let mut frames = Vec::new();
        while let Some(frame) = decoder.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> zfmrust_transport::Result<()> {
        self.inner.lock().unwrap().connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> zfmrust_transport::Result<()> {
        self.inner.lock().unwrap().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn send(&mut self, data: &[u8]) -> zfmrust_transport::Result<()> {
        self.inner.lock().unwrap().written.extend_from_slice(data);
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> zfmrust_transport::Result<BytesMut> {
        self.inner
            .lock()
            .unwrap()
            .responses
            .pop_front()
            .map(|bytes| BytesMut::from(&bytes[..]))
            .ok_or(zfmrust_transport::Error::ReadTimeout)
    }

    fn endpoint(&self) -> String {
        "mock".into()
    }
}

/// Build a connected sensor whose password has been accepted
pub async fn verified_sensor(mock: &MockTransport) -> Sensor {
    mock.push_ack(&[0x00]);

    let mut sensor = Sensor::from_transport(Box::new(mock.clone()));
    sensor.connect().await.unwrap();
    assert!(sensor.verify_password().await.unwrap());

    sensor
}

/// A 16-byte parameter block with the given capacity and packet size code
pub fn parameter_block(capacity: u16, packet_code: u16) -> Vec<u8> {
    let mut block = vec![
        0x00, 0x00, // status register
        0x00, 0x09, // system id
    ];
    block.extend_from_slice(&capacity.to_be_bytes());
    block.extend_from_slice(&[0x00, 0x03]); // security level
    block.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]); // address
    block.extend_from_slice(&packet_code.to_be_bytes());
    block.extend_from_slice(&[0x00, 0x06]); // baud divisor
    block
}

/// Queue a parameter read ack
pub fn push_parameters(mock: &MockTransport, capacity: u16, packet_code: u16) {
    let mut payload = vec![0x00];
    payload.extend(parameter_block(capacity, packet_code));
    mock.push_ack(&payload);
}
