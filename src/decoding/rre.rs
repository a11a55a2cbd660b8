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

//! VNC RRE (Rise-and-Run-length Encoding) decoder.
//!
//! RRE encodes a rectangle as a background colour plus a list of solid
//! subrectangles. Format: \[nSubrects(u32)\]\[bgColor\]\[subrect1\]...\[subrectN\]
//! Each subrect: \[color\]\[x(u16)\]\[y(u16)\]\[w(u16)\]\[h(u16)\]
//!
//! The consumer paints the background first, then the subrectangles in
//! transmission order.

use super::common;
use crate::error::Result;
use crate::pixel::Color;
use crate::protocol::{ColourMap, PixelFormat};
use std::io::Read;

/// A solid subrectangle inside an RRE rectangle, positioned relative to the
/// rectangle's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RreSubrect {
    /// The colour filling this subrectangle.
    pub color: Color,
    /// The X coordinate of the subrectangle's top-left corner.
    pub x: u16,
    /// The Y coordinate of the subrectangle's top-left corner.
    pub y: u16,
    /// The width of the subrectangle in pixels.
    pub width: u16,
    /// The height of the subrectangle in pixels.
    pub height: u16,
}

/// Decodes an RRE rectangle: background colour plus subrectangles.
pub fn decode<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    colour_map: Option<&ColourMap>,
) -> Result<(Color, Vec<RreSubrect>)> {
    let count = common::read_u32_be(reader)? as usize;
    let background = common::read_color(reader, format, colour_map)?;

    // The count is an untrusted wire value; the list grows with the data
    // actually received instead of reserving for it up front.
    let mut subrects = Vec::new();
    for _ in 0..count {
        let color = common::read_color(reader, format, colour_map)?;
        let x = common::read_u16_be(reader)?;
        let y = common::read_u16_be(reader)?;
        let width = common::read_u16_be(reader)?;
        let height = common::read_u16_be(reader)?;
        subrects.push(RreSubrect {
            color,
            x,
            y,
            width,
            height,
        });
    }
    Ok((background, subrects))
}
