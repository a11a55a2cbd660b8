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

//! VNC Raw encoding decoder.
//!
//! The simplest encoding: `width * height` PIXELs in row-major order,
//! directly in the negotiated pixel format. High bandwidth but universally
//! supported.

use super::common;
use crate::error::Result;
use crate::pixel::{self, Color};
use crate::protocol::{ColourMap, PixelFormat, Rectangle};
use std::io::Read;

/// Decodes a Raw rectangle into a row-major colour grid.
pub fn decode<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    colour_map: Option<&ColourMap>,
    rect: &Rectangle,
) -> Result<Vec<Vec<Color>>> {
    let width = rect.width as usize;
    let height = rect.height as usize;
    let bpp = format.bytes_per_pixel();

    // One bulk read for the whole rectangle, then per-pixel decode.
    let data = common::read_vec(reader, width * height * bpp)?;

    let mut rows = Vec::with_capacity(height);
    for row in 0..height {
        let mut pixels = Vec::with_capacity(width);
        for col in 0..width {
            let offset = (row * width + col) * bpp;
            pixels.push(pixel::decode_pixel(
                &data[offset..offset + bpp],
                format,
                colour_map,
            )?);
        }
        rows.push(pixels);
    }
    Ok(rows)
}
