//! High-level sensor interface

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, info, trace, warn};

use zfmrust_core::{FrameDecoder, Session, SessionState, constants, instruction, status};
use zfmrust_transport::{SerialTransport, TcpTransport, Transport};
use zfmrust_types::{
    BAUD_RATE_BASE, CharBuffer, INDEX_PAGES, PacketSize, SystemParameters, decode_index_page,
};

use crate::error::{DeviceError, Error, Result};
use crate::exchange::Exchange;
use crate::stream;

/// Sensor addressing and credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// Device address sent in every frame header
    pub address: u32,

    /// Password sent by `verify_password`
    pub password: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: constants::DEFAULT_ADDRESS,
            password: constants::DEFAULT_PASSWORD,
        }
    }
}

/// ZFM fingerprint sensor
///
/// One handle owns the transport and the session exclusively; the protocol
/// is strictly one command at a time, which `&mut self` enforces. Callers
/// that need to share a sensor must wrap the handle in a mutex or park it
/// behind an actor.
///
/// # Examples
///
/// ```no_run
/// use zfmrust::{CharBuffer, Sensor};
///
/// #[tokio::main]
/// async fn main() -> zfmrust::Result<()> {
///     let mut sensor = Sensor::new("/dev/ttyUSB0", 57_600)?;
///     sensor.connect().await?;
///
///     if !sensor.verify_password().await? {
///         eprintln!("Sensor password rejected");
///         return Ok(());
///     }
///
///     while !sensor.read_image().await? {}
///     sensor.convert_image(CharBuffer::One).await?;
///     let (position, score) = sensor.search_template(CharBuffer::One, 0, None).await?;
///     println!("Match at {position} with score {score}");
///
///     sensor.close().await?;
///     Ok(())
/// }
/// ```
pub struct Sensor {
    transport: Box<dyn Transport>,
    decoder: FrameDecoder,
    session: Session,
    config: SensorConfig,
    parameters: Option<SystemParameters>,
    timeout: Duration,
}

impl Sensor {
    /// Create a sensor on a local serial port
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the baud rate is not a
    /// multiple of 9600 in the supported 9600 to 115200 range.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Result<Self> {
        if baud_rate < 9600 || baud_rate > 115_200 || baud_rate % BAUD_RATE_BASE != 0 {
            return Err(Error::InvalidConfiguration(format!(
                "baud rate {baud_rate} is not a multiple of 9600 in 9600..=115200"
            )));
        }

        Ok(Self::from_transport(Box::new(SerialTransport::new(
            path, baud_rate,
        ))))
    }

    /// Create a sensor behind an RS232-to-TCP device server
    pub fn new_tcp(addr: impl Into<String>, port: u16) -> Self {
        Self::from_transport(Box::new(TcpTransport::new(addr, port)))
    }

    /// Create a sensor over any transport (emulators, test harnesses)
    pub fn from_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            decoder: FrameDecoder::new(),
            session: Session::new(),
            config: SensorConfig::default(),
            parameters: None,
            timeout: Duration::from_secs(constants::DEFAULT_READ_TIMEOUT),
        }
    }

    /// Set address and password
    pub fn with_config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-frame read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current addressing and credentials
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Last system parameters confirmed by the device, if any were read
    pub fn parameters(&self) -> Option<&SystemParameters> {
        self.parameters.as_ref()
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Open the transport
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.connect().await?;
        info!("Connected to {}", self.transport.endpoint());
        Ok(())
    }

    /// Release the transport and close the session
    pub async fn close(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            info!("Disconnecting from {}", self.transport.endpoint());
            self.transport.disconnect().await?;
        }
        self.session.close();
        Ok(())
    }

    // Password and addressing

    /// Verify the configured password
    ///
    /// Returns `true` on acceptance (the session becomes verified) and
    /// `false` on rejection.
    pub async fn verify_password(&mut self) -> Result<bool> {
        self.ensure_open()?;

        let mut payload = BytesMut::with_capacity(5);
        payload.put_u8(instruction::VERIFY_PASSWORD);
        payload.put_u32(self.config.password);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => {
                self.session.verify()?;
                info!("Password accepted");
                Ok(true)
            }
            status::WRONG_PASSWORD => Ok(false),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::ADDRESS_MISMATCH => Err(DeviceError::AddressMismatch.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Change the sensor password
    ///
    /// The configured password is updated only after the device confirms.
    pub async fn set_password(&mut self, new_password: u32) -> Result<()> {
        self.ensure_verified()?;

        let mut payload = BytesMut::with_capacity(5);
        payload.put_u8(instruction::SET_PASSWORD);
        payload.put_u32(new_password);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => {
                self.config.password = new_password;
                debug!("Password changed");
                Ok(())
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Change the sensor address
    ///
    /// The configured address is updated only after the device confirms;
    /// subsequent frames use the new address.
    pub async fn set_address(&mut self, new_address: u32) -> Result<()> {
        self.ensure_verified()?;

        let mut payload = BytesMut::with_capacity(5);
        payload.put_u8(instruction::SET_ADDRESS);
        payload.put_u32(new_address);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => {
                self.config.address = new_address;
                debug!("Address changed to 0x{:08X}", new_address);
                Ok(())
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    // System parameters

    /// Write a system parameter register
    ///
    /// Value ranges are checked before any I/O: baud divisor 1 to 12,
    /// security level 1 to 5, packet size code 0 to 3. The cached parameter
    /// block is updated only after the device confirms.
    pub async fn set_system_parameter(&mut self, parameter: u8, value: u8) -> Result<()> {
        self.ensure_verified()?;

        match parameter {
            instruction::parameter::BAUD_RATE => {
                if !(1..=12).contains(&value) {
                    return Err(Error::InvalidConfiguration(format!(
                        "baud rate divisor {value} outside 1..=12"
                    )));
                }
            }
            instruction::parameter::SECURITY_LEVEL => {
                if !(1..=5).contains(&value) {
                    return Err(Error::InvalidConfiguration(format!(
                        "security level {value} outside 1..=5"
                    )));
                }
            }
            instruction::parameter::PACKET_SIZE => {
                if value > 3 {
                    return Err(Error::InvalidConfiguration(format!(
                        "packet size code {value} outside 0..=3"
                    )));
                }
            }
            other => {
                return Err(Error::InvalidConfiguration(format!(
                    "unknown parameter register {other}"
                )));
            }
        }

        let payload = Bytes::copy_from_slice(&[
            instruction::SET_SYSTEM_PARAMETER,
            parameter,
            value,
        ]);

        let (code, _) = self.execute(payload).await?;
        match code {
            status::OK => {
                if let Some(params) = &mut self.parameters {
                    match parameter {
                        instruction::parameter::BAUD_RATE => {
                            params.baud_divisor = u16::from(value);
                        }
                        instruction::parameter::SECURITY_LEVEL => {
                            params.security_level = u16::from(value);
                        }
                        instruction::parameter::PACKET_SIZE => {
                            if let Ok(size) = PacketSize::from_code(u16::from(value)) {
                                params.packet_size = size;
                            }
                        }
                        _ => {}
                    }
                }
                debug!("Parameter {} set to {}", parameter, value);
                Ok(())
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::INVALID_REGISTER => Err(DeviceError::InvalidRegister.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Set the baud rate (must be a multiple of 9600)
    pub async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if baud_rate % BAUD_RATE_BASE != 0 {
            return Err(Error::InvalidConfiguration(format!(
                "baud rate {baud_rate} is not a multiple of {BAUD_RATE_BASE}"
            )));
        }

        let divisor = baud_rate / BAUD_RATE_BASE;
        if !(1..=12).contains(&divisor) {
            return Err(Error::InvalidConfiguration(format!(
                "baud rate {baud_rate} outside 9600..=115200"
            )));
        }

        self.set_system_parameter(instruction::parameter::BAUD_RATE, divisor as u8)
            .await
    }

    /// Set the matching security level, 1 (lowest) to 5 (highest)
    pub async fn set_security_level(&mut self, level: u8) -> Result<()> {
        self.set_system_parameter(instruction::parameter::SECURITY_LEVEL, level)
            .await
    }

    /// Set the transfer packet size (32, 64, 128 or 256 bytes)
    pub async fn set_max_packet_size(&mut self, bytes: usize) -> Result<()> {
        let size = PacketSize::from_bytes(bytes)
            .map_err(|_| Error::InvalidConfiguration(format!("unsupported packet size {bytes}")))?;

        self.set_system_parameter(instruction::parameter::PACKET_SIZE, size.code())
            .await
    }

    /// Read the system parameter block
    pub async fn get_system_parameters(&mut self) -> Result<SystemParameters> {
        self.ensure_verified()?;

        let (code, payload) = self.execute(command(instruction::GET_SYSTEM_PARAMETERS)).await?;
        match code {
            status::OK => {
                let params = SystemParameters::parse(&payload)?;
                trace!(?params, "Read system parameters");
                self.parameters = Some(params);
                Ok(params)
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Template storage capacity
    pub async fn get_storage_capacity(&mut self) -> Result<u16> {
        Ok(self.get_system_parameters().await?.storage_capacity)
    }

    /// Matching security level
    pub async fn get_security_level(&mut self) -> Result<u16> {
        Ok(self.get_system_parameters().await?.security_level)
    }

    /// Transfer packet size in bytes
    pub async fn get_max_packet_size(&mut self) -> Result<usize> {
        Ok(self.get_system_parameters().await?.max_packet_len())
    }

    /// Baud rate in bits per second
    pub async fn get_baud_rate(&mut self) -> Result<u32> {
        Ok(self.get_system_parameters().await?.baud_rate())
    }

    // Template bookkeeping

    /// Read one page of the template usage bitmap
    ///
    /// Returns one flag per position, `true` meaning occupied. Flags come
    /// out in LSB-first bit order within each byte, bytes in received order;
    /// position numbers on the device depend on this exact order.
    pub async fn get_template_index(&mut self, page: u8) -> Result<Vec<bool>> {
        self.ensure_verified()?;

        if page >= INDEX_PAGES {
            return Err(Error::InvalidConfiguration(format!(
                "index page {page} outside 0..{INDEX_PAGES}"
            )));
        }

        let payload = Bytes::copy_from_slice(&[instruction::TEMPLATE_INDEX, page]);

        let (code, payload) = self.execute(payload).await?;
        match code {
            status::OK => Ok(decode_index_page(&payload)),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Number of stored templates
    pub async fn get_template_count(&mut self) -> Result<u16> {
        self.ensure_verified()?;

        let (code, payload) = self.execute(command(instruction::TEMPLATE_COUNT)).await?;
        match code {
            status::OK => read_u16(&payload),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    // Image capture

    /// Capture a finger image into the image buffer
    ///
    /// Returns `false` while no finger is on the sensor; poll until `true`.
    pub async fn read_image(&mut self) -> Result<bool> {
        self.ensure_verified()?;

        let (code, _) = self.execute(command(instruction::READ_IMAGE)).await?;
        match code {
            status::OK => Ok(true),
            status::NO_FINGER => Ok(false),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::READ_IMAGE_FAILED => Err(DeviceError::ReadImageFailed.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Download the raw image stream from the image buffer
    ///
    /// The stream packs two 4-bit samples per byte; feed it to
    /// [`zfmrust_types::FingerImage::from_stream`] to expand into 8-bit
    /// grayscale pixels.
    pub async fn download_image(&mut self) -> Result<Bytes> {
        self.ensure_verified()?;

        let (code, _) = self.execute(command(instruction::DOWNLOAD_IMAGE)).await?;
        match code {
            status::OK => {}
            status::COMMUNICATION_ERROR => return Err(DeviceError::CommunicationError.into()),
            status::DOWNLOAD_IMAGE_FAILED => return Err(DeviceError::DownloadImageFailed.into()),
            other => return Err(Error::UnknownStatus(other)),
        }

        self.receive_stream().await
    }

    /// Convert the image buffer into characteristics in the given buffer
    pub async fn convert_image(&mut self, buffer: CharBuffer) -> Result<()> {
        self.ensure_verified()?;

        let payload = Bytes::copy_from_slice(&[instruction::CONVERT_IMAGE, buffer.code()]);

        let (code, _) = self.execute(payload).await?;
        match code {
            status::OK => Ok(()),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::MESSY_IMAGE => Err(DeviceError::MessyImage.into()),
            status::FEW_FEATURE_POINTS => Err(DeviceError::FewFeaturePoints.into()),
            status::INVALID_IMAGE => Err(DeviceError::InvalidImage.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    // Templates

    /// Combine both characteristics buffers into a template
    ///
    /// The template lands in both buffers. Returns `false` when the two
    /// captures do not belong to the same finger.
    pub async fn create_template(&mut self) -> Result<bool> {
        self.ensure_verified()?;

        let (code, _) = self.execute(command(instruction::CREATE_TEMPLATE)).await?;
        match code {
            status::OK => Ok(true),
            status::CHARACTERISTICS_MISMATCH => Ok(false),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Store the template from the given buffer
    ///
    /// With `position: None` the first free slot is used: index pages are
    /// scanned in order and the position is `page_size * page + first free
    /// flag`. Fails with [`DeviceError::InvalidPosition`] when the store is
    /// full. Returns the position stored at.
    pub async fn store_template(
        &mut self,
        position: Option<u16>,
        buffer: CharBuffer,
    ) -> Result<u16> {
        self.ensure_verified()?;

        let capacity = self.get_storage_capacity().await?;

        let position = match position {
            Some(position) => {
                if position >= capacity {
                    return Err(Error::InvalidConfiguration(format!(
                        "position {position} outside capacity {capacity}"
                    )));
                }
                position
            }
            None => self.find_free_position(capacity).await?,
        };

        let mut payload = BytesMut::with_capacity(4);
        payload.put_u8(instruction::STORE_TEMPLATE);
        payload.put_u8(buffer.code());
        payload.put_u16(position);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => {
                debug!("Template stored at position {}", position);
                Ok(position)
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::INVALID_POSITION => Err(DeviceError::InvalidPosition.into()),
            status::FLASH_ERROR => Err(DeviceError::FlashError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Scan the index pages for the first unused position
    async fn find_free_position(&mut self, capacity: u16) -> Result<u16> {
        for page in 0..INDEX_PAGES {
            let flags = self.get_template_index(page).await?;

            if let Some(index) = flags.iter().position(|&used| !used) {
                let position = flags.len() as u16 * u16::from(page) + index as u16;

                if position < capacity {
                    return Ok(position);
                }

                // Later pages only hold higher positions
                break;
            }
        }

        Err(DeviceError::InvalidPosition.into())
    }

    /// Search the template store for the characteristics in the buffer
    ///
    /// `count: None` searches the whole store. Returns the position and
    /// accuracy score of the best match, or `(-1, -1)` when nothing matched;
    /// no match is an ordinary outcome, not an error.
    pub async fn search_template(
        &mut self,
        buffer: CharBuffer,
        start: u16,
        count: Option<u16>,
    ) -> Result<(i32, i32)> {
        self.ensure_verified()?;

        let count = match count {
            Some(count) => count,
            None => self.get_storage_capacity().await?,
        };

        let mut payload = BytesMut::with_capacity(6);
        payload.put_u8(instruction::SEARCH_TEMPLATE);
        payload.put_u8(buffer.code());
        payload.put_u16(start);
        payload.put_u16(count);

        let (code, payload) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => {
                require_len(&payload, 4)?;
                let position = u16::from_be_bytes([payload[0], payload[1]]);
                let score = u16::from_be_bytes([payload[2], payload[3]]);
                Ok((i32::from(position), i32::from(score)))
            }
            status::NO_TEMPLATE_FOUND => Ok((-1, -1)),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Load a stored template into the given buffer
    pub async fn load_template(&mut self, position: u16, buffer: CharBuffer) -> Result<()> {
        self.ensure_verified()?;

        let capacity = self.get_storage_capacity().await?;
        if position >= capacity {
            return Err(Error::InvalidConfiguration(format!(
                "position {position} outside capacity {capacity}"
            )));
        }

        let mut payload = BytesMut::with_capacity(4);
        payload.put_u8(instruction::LOAD_TEMPLATE);
        payload.put_u8(buffer.code());
        payload.put_u16(position);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => Ok(()),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::LOAD_TEMPLATE_FAILED => Err(DeviceError::LoadTemplateFailed.into()),
            status::INVALID_POSITION => Err(DeviceError::InvalidPosition.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Delete `count` templates starting at `position`
    ///
    /// Returns `false` when the device refuses the deletion.
    pub async fn delete_template(&mut self, position: u16, count: u16) -> Result<bool> {
        self.ensure_verified()?;

        let capacity = self.get_storage_capacity().await?;
        if position >= capacity {
            return Err(Error::InvalidConfiguration(format!(
                "position {position} outside capacity {capacity}"
            )));
        }
        if count > capacity - position {
            return Err(Error::InvalidConfiguration(format!(
                "count {count} exceeds capacity {capacity} from position {position}"
            )));
        }

        let mut payload = BytesMut::with_capacity(5);
        payload.put_u8(instruction::DELETE_TEMPLATE);
        payload.put_u16(position);
        payload.put_u16(count);

        let (code, _) = self.execute(payload.freeze()).await?;
        match code {
            status::OK => Ok(true),
            status::DELETE_TEMPLATE_FAILED => Ok(false),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            status::INVALID_POSITION => Err(DeviceError::InvalidPosition.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Delete every template in the store
    ///
    /// Returns `false` when the device refuses.
    pub async fn clear_database(&mut self) -> Result<bool> {
        self.ensure_verified()?;

        let (code, _) = self.execute(command(instruction::CLEAR_DATABASE)).await?;
        match code {
            status::OK => Ok(true),
            status::CLEAR_DATABASE_FAILED => Ok(false),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    // Characteristics

    /// Compare the characteristics in buffer 1 and buffer 2
    ///
    /// Returns the accuracy score; 0 means the fingers are not the same,
    /// which is an ordinary outcome, not an error.
    pub async fn compare_characteristics(&mut self) -> Result<u16> {
        self.ensure_verified()?;

        let (code, payload) = self
            .execute(command(instruction::COMPARE_CHARACTERISTICS))
            .await?;
        match code {
            status::OK => read_u16(&payload),
            status::NOT_MATCHING => Ok(0),
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Upload characteristics into the given buffer
    ///
    /// The data is streamed in packets of the device's current maximum
    /// size, then downloaded again for verification. Returns `true` when
    /// the sensor stored exactly what was sent.
    pub async fn upload_characteristics(
        &mut self,
        buffer: CharBuffer,
        data: &[u8],
    ) -> Result<bool> {
        self.ensure_verified()?;

        if data.is_empty() {
            return Err(Error::InvalidConfiguration(
                "characteristics data is empty".into(),
            ));
        }

        let max_packet_size = self.get_max_packet_size().await?;

        let payload = Bytes::copy_from_slice(&[instruction::UPLOAD_CHARACTERISTICS, buffer.code()]);

        let (code, _) = self.execute(payload).await?;
        match code {
            status::OK => {}
            status::COMMUNICATION_ERROR => return Err(DeviceError::CommunicationError.into()),
            status::PACKET_RESPONSE_FAILED => {
                return Err(DeviceError::PacketResponseFailed.into());
            }
            other => return Err(Error::UnknownStatus(other)),
        }

        self.send_stream(data, max_packet_size).await?;

        // Read back and compare so a corrupted transfer is caught here
        let stored = self.download_characteristics(buffer).await?;
        Ok(stored == data)
    }

    /// Download the characteristics held in the given buffer
    pub async fn download_characteristics(&mut self, buffer: CharBuffer) -> Result<Bytes> {
        self.ensure_verified()?;

        let payload =
            Bytes::copy_from_slice(&[instruction::DOWNLOAD_CHARACTERISTICS, buffer.code()]);

        let (code, _) = self.execute(payload).await?;
        match code {
            status::OK => {}
            status::COMMUNICATION_ERROR => return Err(DeviceError::CommunicationError.into()),
            status::DOWNLOAD_CHARACTERISTICS_FAILED => {
                return Err(DeviceError::DownloadCharacteristicsFailed.into());
            }
            other => return Err(Error::UnknownStatus(other)),
        }

        self.receive_stream().await
    }

    // Miscellaneous

    /// Ask the sensor for a random 32-bit number
    pub async fn generate_random_number(&mut self) -> Result<u32> {
        self.ensure_verified()?;

        let (code, payload) = self
            .execute(command(instruction::GENERATE_RANDOM_NUMBER))
            .await?;
        match code {
            status::OK => {
                require_len(&payload, 4)?;
                Ok(u32::from_be_bytes([
                    payload[0], payload[1], payload[2], payload[3],
                ]))
            }
            status::COMMUNICATION_ERROR => Err(DeviceError::CommunicationError.into()),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    // Helpers

    fn ensure_open(&self) -> Result<()> {
        match self.session.state() {
            SessionState::Closed => Err(zfmrust_core::Error::SessionClosed.into()),
            SessionState::Busy => Err(zfmrust_core::Error::InvalidSessionState(
                "a transfer is in progress".into(),
            )
            .into()),
            _ => Ok(()),
        }
    }

    fn ensure_verified(&self) -> Result<()> {
        self.session.ensure_verified().map_err(Error::from)
    }

    fn exchange(&mut self) -> Exchange<'_> {
        Exchange {
            transport: self.transport.as_mut(),
            decoder: &mut self.decoder,
            address: self.config.address,
            timeout: self.timeout,
        }
    }

    /// Run one command exchange, closing the session when the failure
    /// desynchronized the byte stream
    async fn execute(&mut self, payload: Bytes) -> Result<(u8, Bytes)> {
        let mut exchange = self.exchange();
        match exchange.execute(payload).await {
            Ok(reply) => Ok(reply),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Receive a bulk transfer, holding the busy state for its duration
    async fn receive_stream(&mut self) -> Result<Bytes> {
        self.session.begin_transfer().map_err(Error::from)?;

        let mut exchange = self.exchange();
        match stream::receive(&mut exchange).await {
            Ok(data) => {
                self.session.end_transfer();
                Ok(data)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Send a bulk transfer, holding the busy state for its duration
    async fn send_stream(&mut self, data: &[u8], max_packet_size: usize) -> Result<()> {
        self.session.begin_transfer().map_err(Error::from)?;

        let mut exchange = self.exchange();
        match stream::send(&mut exchange, data, max_packet_size).await {
            Ok(()) => {
                self.session.end_transfer();
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            warn!("Session failed: {}", err);
            self.session.close();
        }
        err
    }
}

/// Single-byte command payload
fn command(code: u8) -> Bytes {
    Bytes::copy_from_slice(&[code])
}

fn require_len(payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() < expected {
        return Err(Error::TruncatedResponse {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_u16(payload: &[u8]) -> Result<u16> {
    require_len(payload, 2)?;
    Ok(u16::from_be_bytes([payload[0], payload[1]]))
}
