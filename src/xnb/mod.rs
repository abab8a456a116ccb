//! Low-level XNB binary format.
//!
//! Layout of one file:
//!
//! ```text
//! container header:  magic "XNB", platform byte, version byte, flags byte,
//!                    total file size (u32)
//! object stream:     manifest (reader names + versions), shared slot count,
//!                    primary object, shared resource section
//! ```
//!
//! The container header belongs to the asset-management side; the object
//! stream is what [`ContentReader`] decodes.

pub mod codec;
pub mod manifest;
pub mod reader;

pub use manifest::{ManifestEntry, TypeReaderRegistry};
pub use reader::ContentReader;

use std::io::Read;

use byteorder::ReadBytesExt;

use codec::XnbRead;
use crate::util::{Error, Result};

/// XNB magic bytes.
pub const XNB_MAGIC: &[u8; 3] = b"XNB";

/// Format version written by XNA Game Studio 4.0 and MonoGame.
pub const XNB_FORMAT_VERSION: u8 = 5;

/// Flag bit: content targets the HiDef graphics profile.
pub const FLAG_HIDEF: u8 = 0x01;
/// Flag bit: payload is LZ4-compressed.
pub const FLAG_COMPRESSED_LZ4: u8 = 0x40;
/// Flag bit: payload is LZX-compressed.
pub const FLAG_COMPRESSED_LZX: u8 = 0x80;

/// Container header size in bytes.
pub const HEADER_SIZE: usize = 10;

/// Target platform byte in the container header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetPlatform {
    Windows,
    WindowsPhone,
    Xbox360,
    DesktopGl,
    Android,
    Ios,
}

impl TargetPlatform {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            b'w' => Self::Windows,
            b'm' => Self::WindowsPhone,
            b'x' => Self::Xbox360,
            b'd' => Self::DesktopGl,
            b'a' => Self::Android,
            b'i' => Self::Ios,
            v => return Err(Error::UnsupportedPlatform(v)),
        })
    }
}

/// Parsed XNB container header.
#[derive(Clone, Debug)]
pub struct XnbHeader {
    pub platform: TargetPlatform,
    pub version: u8,
    pub hidef: bool,
    pub compressed: bool,
    /// Total file size including this header.
    pub file_size: u32,
}

impl XnbHeader {
    /// Parse and validate the container header from the front of a stream.
    pub fn parse(stream: &mut impl Read) -> Result<Self> {
        let mut magic = [0u8; 3];
        stream.read_exact(&mut magic)?;
        if &magic != XNB_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let platform = TargetPlatform::from_u8(stream.read_u8()?)?;

        let version = stream.read_u8()?;
        if version != XNB_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let flags = stream.read_u8()?;
        let file_size = stream.read_uint32()?;

        Ok(Self {
            platform,
            version,
            hidef: flags & FLAG_HIDEF != 0,
            compressed: flags & (FLAG_COMPRESSED_LZX | FLAG_COMPRESSED_LZ4) != 0,
            file_size,
        })
    }
}
