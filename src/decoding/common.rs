// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reader helpers shared across the rectangle decoders.
//!
//! All multi-byte protocol fields are big-endian. Pixel data endianness
//! follows the negotiated pixel format and is handled in [`crate::pixel`].

use crate::error::{DecodeError, Result};
use crate::pixel::{self, Color, Cpixel};
use crate::protocol::{ColourMap, PixelFormat};
use std::io::{self, Read};

/// Maps a reader failure onto the decoder's error kinds.
///
/// `UnexpectedEof` means the transport or the inflater ran dry
/// mid-encoding. `InvalidData` is only produced by the inflater in this
/// crate, so it carries zlib corruption.
pub(crate) fn map_read_error(err: io::Error) -> DecodeError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
        io::ErrorKind::InvalidData => DecodeError::Zlib(err.to_string()),
        _ => DecodeError::Io(err),
    }
}

pub(crate) fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(map_read_error)
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u16_be<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub(crate) fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads exactly `len` bytes into a fresh buffer.
///
/// The buffer grows with the data actually received, so a corrupt length
/// prefix cannot force a huge allocation before the stream runs dry.
pub(crate) fn read_vec<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut remaining = len;
    while remaining > 0 {
        let take = remaining.min(chunk.len());
        read_exact(reader, &mut chunk[..take])?;
        buf.extend_from_slice(&chunk[..take]);
        remaining -= take;
    }
    Ok(buf)
}

/// Pixel widths the protocol can carry. The fixed buffers below depend on
/// this bound; `bits_per_pixel` arrives off the wire, so anything else is
/// a malformed format rather than a reason to panic.
fn pixel_width(len: usize) -> Result<usize> {
    if (1..=4).contains(&len) {
        Ok(len)
    } else {
        Err(DecodeError::MalformedPixel(format!(
            "unsupported pixel size of {len} bytes"
        )))
    }
}

/// Reads one PIXEL and decodes it to a colour.
pub(crate) fn read_color<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    colour_map: Option<&ColourMap>,
) -> Result<Color> {
    let len = pixel_width(format.bytes_per_pixel())?;
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf[..len])?;
    pixel::decode_pixel(&buf[..len], format, colour_map)
}

/// Reads one CPIXEL without interpreting it.
pub(crate) fn read_cpixel<R: Read>(reader: &mut R, format: &PixelFormat) -> Result<Cpixel> {
    let len = pixel_width(format.bytes_per_cpixel())?;
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf[..len])?;
    Ok(Cpixel::from_slice(&buf[..len]))
}
