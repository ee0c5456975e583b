//! Type definitions for zfmrust

pub mod error;
pub mod image;
pub mod params;
pub mod template;

pub use error::{Error, Result};
pub use image::{FingerImage, IMAGE_HEIGHT, IMAGE_WIDTH};
pub use params::{BAUD_RATE_BASE, PacketSize, SystemParameters};
pub use template::{CharBuffer, INDEX_PAGES, decode_index_page};
