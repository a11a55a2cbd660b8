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

//! Pixel decoding from the negotiated wire format.
//!
//! This module turns on-wire pixel bytes into layout-independent colours.
//! It implements the translation logic using direct runtime conversion:
//! read the pixel value in the format's endianness, extract each channel
//! with the format's shifts and maxima, and normalise to the full 16-bit
//! range. Colour-mapped formats go through the session's [`ColourMap`]
//! instead.
//!
//! It also implements the CPIXEL (compact pixel) rule used inside ZRLE
//! tiles: a 32-bit true-colour pixel with depth 24 or less travels as its
//! 3 significant bytes, with the always-zero byte reinserted on expansion.

use crate::error::{DecodeError, Result};
use crate::protocol::{ColourMap, PixelFormat};

/// A decoded colour, independent of the on-wire pixel layout.
///
/// Components are normalised to the full 16-bit range regardless of how
/// many bits the wire format spends on each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red component, 0..=65535.
    pub r: u16,
    /// Green component, 0..=65535.
    pub g: u16,
    /// Blue component, 0..=65535.
    pub b: u16,
}

/// A compact pixel exactly as transmitted inside ZRLE tiles.
///
/// Holds the raw wire bytes; it is never reinterpreted without the pixel
/// format that produced it. Use [`Cpixel::to_pixel_bytes`] to recover the
/// full PIXEL form or [`Cpixel::to_color`] to decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cpixel {
    bytes: [u8; 4],
    len: u8,
}

impl Cpixel {
    /// Wraps wire bytes as a compact pixel.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than 4 bytes; CPIXELs never are.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        assert!(data.len() <= 4, "CPIXEL is at most 4 bytes");
        let mut bytes = [0u8; 4];
        bytes[..data.len()].copy_from_slice(data);
        #[allow(clippy::cast_possible_truncation)] // length is at most 4
        let len = data.len() as u8;
        Self { bytes, len }
    }

    /// An all-zero compact pixel of the given width, used to pre-fill grids.
    pub(crate) fn zeroed(len: usize) -> Self {
        #[allow(clippy::cast_possible_truncation)] // length is at most 4
        let len = len as u8;
        Self { bytes: [0; 4], len }
    }

    /// The raw wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Number of wire bytes this compact pixel occupies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if the pixel carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Expands the compact pixel to the full PIXEL byte form.
    ///
    /// For the 3-byte compact case the always-zero byte is reinserted at the
    /// most-significant position: appended for little-endian layouts,
    /// prepended for big-endian. Every other width is already a PIXEL.
    #[must_use]
    pub fn to_pixel_bytes(&self, format: &PixelFormat) -> Vec<u8> {
        if self.len() == 3 && format.bytes_per_pixel() == 4 {
            let mut pixel = Vec::with_capacity(4);
            if format.big_endian {
                pixel.push(0);
                pixel.extend_from_slice(self.as_bytes());
            } else {
                pixel.extend_from_slice(self.as_bytes());
                pixel.push(0);
            }
            pixel
        } else {
            self.as_bytes().to_vec()
        }
    }

    /// The pixel value as an unsigned integer in the format's endianness.
    #[must_use]
    pub fn raw_value(&self, format: &PixelFormat) -> u32 {
        match self.as_bytes() {
            [b0] => u32::from(*b0),
            [b0, b1] => {
                if format.big_endian {
                    u32::from(u16::from_be_bytes([*b0, *b1]))
                } else {
                    u32::from(u16::from_le_bytes([*b0, *b1]))
                }
            }
            [b0, b1, b2] => {
                if format.big_endian {
                    u32::from(*b0) << 16 | u32::from(*b1) << 8 | u32::from(*b2)
                } else {
                    u32::from(*b0) | u32::from(*b1) << 8 | u32::from(*b2) << 16
                }
            }
            [b0, b1, b2, b3] => {
                if format.big_endian {
                    u32::from_be_bytes([*b0, *b1, *b2, *b3])
                } else {
                    u32::from_le_bytes([*b0, *b1, *b2, *b3])
                }
            }
            _ => unreachable!("CPIXEL is 1 to 4 bytes"),
        }
    }

    /// Decodes the compact pixel to a colour.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedPixel`] under the same conditions as
    /// [`decode_pixel`].
    pub fn to_color(&self, format: &PixelFormat, colour_map: Option<&ColourMap>) -> Result<Color> {
        decode_pixel(&self.to_pixel_bytes(format), format, colour_map)
    }
}

/// Decodes one PIXEL from its wire bytes.
///
/// `data` must be exactly `format.bytes_per_pixel()` bytes. True-colour
/// formats extract and normalise each channel; colour-mapped formats look
/// the value up in `colour_map`.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedPixel`] if the byte width is not one the
/// protocol allows, if a colour-mapped pixel arrives without a colour map,
/// or if the map has no entry for the pixel value.
pub fn decode_pixel(
    data: &[u8],
    format: &PixelFormat,
    colour_map: Option<&ColourMap>,
) -> Result<Color> {
    let raw = read_raw_pixel(data, format)?;

    if format.true_colour {
        Ok(Color {
            r: scale_component(
                (raw >> format.red_shift) & u32::from(format.red_max),
                format.red_max,
            ),
            g: scale_component(
                (raw >> format.green_shift) & u32::from(format.green_max),
                format.green_max,
            ),
            b: scale_component(
                (raw >> format.blue_shift) & u32::from(format.blue_max),
                format.blue_max,
            ),
        })
    } else {
        let map = colour_map.ok_or_else(|| {
            DecodeError::MalformedPixel("colour-mapped pixel without a colour map".to_string())
        })?;
        map.get(raw as usize).ok_or_else(|| {
            DecodeError::MalformedPixel(format!("colour map has no entry for index {raw}"))
        })
    }
}

/// Extracts a pixel value from raw bytes according to the pixel format.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedPixel`] for byte widths outside the
/// protocol's 8/16/32 bits per pixel.
fn read_raw_pixel(data: &[u8], format: &PixelFormat) -> Result<u32> {
    match data.len() {
        1 => Ok(u32::from(data[0])),
        2 => {
            if format.big_endian {
                Ok(u32::from(u16::from_be_bytes([data[0], data[1]])))
            } else {
                Ok(u32::from(u16::from_le_bytes([data[0], data[1]])))
            }
        }
        4 => {
            if format.big_endian {
                Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
            } else {
                Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
            }
        }
        n => Err(DecodeError::MalformedPixel(format!(
            "unsupported pixel size of {n} bytes"
        ))),
    }
}

/// Scales a colour component from its format-specific range to 16-bit.
///
/// A component spanning `0..=max` maps linearly onto `0..=65535`; a zero
/// max yields zero.
#[inline]
#[allow(clippy::cast_possible_truncation)] // value <= max, so the quotient fits in u16
fn scale_component(value: u32, max: u16) -> u16 {
    if max == 0 {
        return 0;
    }
    if max == 65535 {
        return value as u16;
    }

    // Scale: value * 65535 / max. Use 64-bit to avoid overflow.
    ((u64::from(value) * 65535) / u64::from(max)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rgba32_pixel() {
        let format = PixelFormat::rgba32();
        // R=128, G=64, B=32 at shifts 0/8/16, little-endian.
        let color = decode_pixel(&[128, 64, 32, 0], &format, None).unwrap();
        assert_eq!(color.r, (128u32 * 65535 / 255) as u16);
        assert_eq!(color.g, (64u32 * 65535 / 255) as u16);
        assert_eq!(color.b, (32u32 * 65535 / 255) as u16);
    }

    #[test]
    fn test_decode_rgb565_pixel_scales_channels() {
        let format = PixelFormat::rgb565();
        // Full red: 31 << 11 = 0xF800.
        let color = decode_pixel(&0xF800u16.to_le_bytes(), &format, None).unwrap();
        assert_eq!(color, Color { r: 65535, g: 0, b: 0 });

        // Mid green: 32 << 5.
        let color = decode_pixel(&(32u16 << 5).to_le_bytes(), &format, None).unwrap();
        assert_eq!(color.g, (32u32 * 65535 / 63) as u16);
    }

    #[test]
    fn test_decode_big_endian_pixel() {
        let mut format = PixelFormat::rgb565();
        format.big_endian = true;
        let color = decode_pixel(&0xF800u16.to_be_bytes(), &format, None).unwrap();
        assert_eq!(color.r, 65535);
    }

    #[test]
    fn test_decode_colour_mapped_pixel() {
        let mut format = PixelFormat::bgr233();
        format.true_colour = false;
        let map = ColourMap::new(vec![
            Color { r: 0, g: 0, b: 0 },
            Color { r: 65535, g: 0, b: 0 },
        ]);

        let color = decode_pixel(&[1], &format, Some(&map)).unwrap();
        assert_eq!(color.r, 65535);

        // Index past the end of the map is malformed.
        assert!(matches!(
            decode_pixel(&[2], &format, Some(&map)),
            Err(DecodeError::MalformedPixel(_))
        ));

        // So is a mapped pixel with no map at all.
        assert!(matches!(
            decode_pixel(&[0], &format, None),
            Err(DecodeError::MalformedPixel(_))
        ));
    }

    #[test]
    fn test_cpixel_expansion_little_endian_appends_zero() {
        let format = PixelFormat::rgba32();
        let cpixel = Cpixel::from_slice(&[0x11, 0x22, 0x33]);
        assert_eq!(cpixel.to_pixel_bytes(&format), vec![0x11, 0x22, 0x33, 0]);
        assert_eq!(cpixel.raw_value(&format), 0x0033_2211);
    }

    #[test]
    fn test_cpixel_expansion_big_endian_prepends_zero() {
        let mut format = PixelFormat::rgba32();
        format.big_endian = true;
        let cpixel = Cpixel::from_slice(&[0x11, 0x22, 0x33]);
        assert_eq!(cpixel.to_pixel_bytes(&format), vec![0, 0x11, 0x22, 0x33]);
        assert_eq!(cpixel.raw_value(&format), 0x0011_2233);
    }

    #[test]
    fn test_cpixel_non_compact_widths_pass_through() {
        let format = PixelFormat::rgb565();
        let cpixel = Cpixel::from_slice(&[0xAB, 0xCD]);
        assert_eq!(cpixel.to_pixel_bytes(&format), vec![0xAB, 0xCD]);
        assert_eq!(cpixel.raw_value(&format), 0xCDAB);
    }

    #[test]
    fn test_cpixel_to_color() {
        let format = PixelFormat::rgba32();
        let cpixel = Cpixel::from_slice(&[255, 0, 128]);
        let color = cpixel.to_color(&format, None).unwrap();
        assert_eq!(color.r, 65535);
        assert_eq!(color.g, 0);
        assert_eq!(color.b, (128u32 * 65535 / 255) as u16);
    }

    #[test]
    fn test_scale_component_bounds() {
        assert_eq!(scale_component(0, 31), 0);
        assert_eq!(scale_component(31, 31), 65535);
        assert_eq!(scale_component(255, 255), 65535);
        assert_eq!(scale_component(0, 0), 0);
    }
}
