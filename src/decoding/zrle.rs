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

//! ZRLE (Zlib Run-Length Encoding) decoder.
//!
//! ZRLE is a highly efficient encoding that combines tiling, palette-based
//! compression, run-length encoding, and zlib compression. It is effective
//! for a wide range of screen content.
//!
//! # Decoding Process
//!
//! 1. A big-endian `u32` length and that many compressed bytes are read
//!    from the transport and appended to the connection's zlib stream.
//! 2. The rectangle is divided into 64x64 pixel tiles, row-major, with edge
//!    tiles clipped to the rectangle.
//! 3. Each tile starts with a one-byte sub-encoding selector, read from the
//!    decompressed stream, followed by the tile's pixel data in CPIXEL form.
//!
//! # Tile Sub-encodings
//!
//! - **Raw:** `width * height` CPIXELs, uncompressed.
//! - **Solid:** one CPIXEL replicated across the tile.
//! - **Packed palette (2-16 colours):** a palette followed by bit-packed
//!   indices, each row starting on a byte boundary.
//! - **Plain RLE:** CPIXEL plus run-length pairs.
//! - **Palette RLE (2-127 colours):** palette indices, optionally with a
//!   run length when the top bit is set.

use super::common;
use crate::error::{DecodeError, Result};
use crate::pixel::Cpixel;
use crate::protocol::{PixelFormat, Rectangle};
use crate::zlib::ZlibStream;
use log::debug;
use std::io::Read;

/// Tiles are at most 64 pixels on a side.
const TILE_SIZE: u16 = 64;

/// Per-tile compression selector, parsed from the leading sub-encoding
/// byte. Values 17..=127 and 129 are reserved by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubEncoding {
    Raw,
    Solid,
    PackedPalette(u8),
    PlainRle,
    PaletteRle(u8),
}

impl SubEncoding {
    fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Solid),
            2..=16 => Ok(Self::PackedPalette(value)),
            128 => Ok(Self::PlainRle),
            130..=255 => Ok(Self::PaletteRle(value - 128)),
            _ => Err(DecodeError::InvalidSubencoding(value)),
        }
    }
}

/// One tile of a ZRLE rectangle, positioned relative to the rectangle's
/// top-left corner. Dimensions are 1..=64; the tiles of a rectangle cover
/// it exactly, without overlap.
#[derive(Debug)]
struct Tile {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    pixels: Vec<Cpixel>,
}

/// Partitions a rectangle into row-major 64x64 tiles, edge tiles clipped.
fn create_tiles(width: u16, height: u16) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for y in (0..height).step_by(TILE_SIZE as usize) {
        for x in (0..width).step_by(TILE_SIZE as usize) {
            tiles.push(Tile {
                x,
                y,
                width: (width - x).min(TILE_SIZE),
                height: (height - y).min(TILE_SIZE),
                pixels: Vec::new(),
            });
        }
    }
    tiles
}

/// Composes decoded tiles into the rectangle's row-major CPIXEL grid.
fn tiles_to_grid(tiles: &[Tile], width: u16, height: u16, cpixel_len: usize) -> Vec<Vec<Cpixel>> {
    let mut grid = vec![vec![Cpixel::zeroed(cpixel_len); width as usize]; height as usize];
    for tile in tiles {
        let tile_width = tile.width as usize;
        for row in 0..tile.height as usize {
            for col in 0..tile_width {
                grid[tile.y as usize + row][tile.x as usize + col] =
                    tile.pixels[row * tile_width + col];
            }
        }
    }
    grid
}

/// Decodes the run length that follows a run-length-encoded pixel.
///
/// The length is one more than the sum of the bytes read; every byte except
/// the last is 255. `limit` bounds how many bytes a single run may spend,
/// the tile's area being always sufficient for a conforming encoder.
fn read_run_length<R: Read>(reader: &mut R, limit: usize) -> Result<usize> {
    let mut length = 1usize;
    let mut bytes_read = 0usize;
    loop {
        let byte = common::read_u8(reader)?;
        bytes_read += 1;
        length += byte as usize;
        if byte != 255 {
            return Ok(length);
        }
        if bytes_read >= limit {
            return Err(DecodeError::RunUnterminated);
        }
    }
}

fn read_palette<R: Read>(reader: &mut R, format: &PixelFormat, size: u8) -> Result<Vec<Cpixel>> {
    (0..size).map(|_| common::read_cpixel(reader, format)).collect()
}

fn read_raw_pixels<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    area: usize,
) -> Result<Vec<Cpixel>> {
    let mut pixels = Vec::with_capacity(area);
    for _ in 0..area {
        pixels.push(common::read_cpixel(reader, format)?);
    }
    Ok(pixels)
}

fn read_solid_fill<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    area: usize,
) -> Result<Vec<Cpixel>> {
    let pixel = common::read_cpixel(reader, format)?;
    Ok(vec![pixel; area])
}

/// Reads a packed-palette tile: a palette of `palette_size` CPIXELs, then
/// bit-packed indices. Indices are packed MSB-first with 1, 2, or 4 bits
/// each; a fresh byte starts at the left edge of every row.
fn read_packed_palette<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    width: u16,
    height: u16,
    palette_size: u8,
) -> Result<Vec<Cpixel>> {
    let palette = read_palette(reader, format, palette_size)?;
    let bits_per_index: usize = match palette_size {
        2 => 1,
        3..=4 => 2,
        _ => 4, // 5-16 colours
    };

    let width = width as usize;
    let row_bytes = (width * bits_per_index).div_ceil(8);
    let mask = (1u8 << bits_per_index) - 1;

    let mut pixels = Vec::with_capacity(width * height as usize);
    for _ in 0..height {
        let row = common::read_vec(reader, row_bytes)?;
        for col in 0..width {
            let bit = col * bits_per_index;
            let shift = 8 - bits_per_index - bit % 8;
            let index = (row[bit / 8] >> shift) & mask;
            let pixel = palette
                .get(index as usize)
                .copied()
                .ok_or(DecodeError::PaletteIndexOob {
                    index,
                    palette_size: palette.len(),
                })?;
            pixels.push(pixel);
        }
    }
    Ok(pixels)
}

/// Reads a plain-RLE tile: CPIXEL and run-length pairs until the tile is
/// full. The run lengths must sum to exactly the tile's area.
fn read_plain_rle<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    area: usize,
) -> Result<Vec<Cpixel>> {
    let mut pixels = Vec::with_capacity(area);
    while pixels.len() < area {
        let pixel = common::read_cpixel(reader, format)?;
        let run = read_run_length(reader, area)?;
        let remaining = area - pixels.len();
        if run > remaining {
            return Err(DecodeError::RunOverrun { run, remaining });
        }
        pixels.extend(std::iter::repeat(pixel).take(run));
    }
    Ok(pixels)
}

/// Reads a palette-RLE tile. Index bytes below 128 emit a single pixel;
/// the top bit marks a run, whose length follows the index byte.
fn read_palette_rle<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    area: usize,
    palette_size: u8,
) -> Result<Vec<Cpixel>> {
    let palette = read_palette(reader, format, palette_size)?;
    let mut pixels = Vec::with_capacity(area);
    while pixels.len() < area {
        let byte = common::read_u8(reader)?;
        let index = byte & 0x7F;
        let pixel = palette
            .get(index as usize)
            .copied()
            .ok_or(DecodeError::PaletteIndexOob {
                index,
                palette_size: palette.len(),
            })?;

        if byte < 128 {
            pixels.push(pixel);
        } else {
            let run = read_run_length(reader, area)?;
            let remaining = area - pixels.len();
            if run > remaining {
                return Err(DecodeError::RunOverrun { run, remaining });
            }
            pixels.extend(std::iter::repeat(pixel).take(run));
        }
    }
    Ok(pixels)
}

/// Reads one tile's sub-encoding byte and pixel data from the zlib stream.
fn read_tile(stream: &mut ZlibStream, format: &PixelFormat, tile: &mut Tile) -> Result<()> {
    let area = tile.width as usize * tile.height as usize;
    let sub_encoding = SubEncoding::from_byte(common::read_u8(stream)?)?;

    tile.pixels = match sub_encoding {
        SubEncoding::Raw => read_raw_pixels(stream, format, area),
        SubEncoding::Solid => read_solid_fill(stream, format, area),
        SubEncoding::PackedPalette(size) => {
            read_packed_palette(stream, format, tile.width, tile.height, size)
        }
        SubEncoding::PlainRle => read_plain_rle(stream, format, area),
        SubEncoding::PaletteRle(size) => read_palette_rle(stream, format, area, size),
    }?;
    Ok(())
}

/// Decodes a ZRLE rectangle into its row-major CPIXEL grid.
///
/// The length prefix and compressed payload come from the transport;
/// everything after travels through the connection's persistent inflater,
/// whose state must be preserved across rectangles.
pub fn decode<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    zlib: &mut ZlibStream,
    rect: &Rectangle,
) -> Result<Vec<Vec<Cpixel>>> {
    let compressed_len = common::read_u32_be(reader)? as usize;
    let payload = common::read_vec(reader, compressed_len)?;
    zlib.feed(&payload);

    debug!(
        "ZRLE: {}x{} rectangle at ({}, {}), {} compressed bytes",
        rect.width, rect.height, rect.x, rect.y, compressed_len
    );

    let mut tiles = create_tiles(rect.width, rect.height);
    for tile in &mut tiles {
        read_tile(zlib, format, tile)?;
    }
    Ok(tiles_to_grid(
        &tiles,
        rect.width,
        rect.height,
        format.bytes_per_cpixel(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cpixel(bytes: &[u8]) -> Cpixel {
        Cpixel::from_slice(bytes)
    }

    #[test]
    fn test_run_length_single_byte() {
        let mut input = Cursor::new(vec![0x00]);
        assert_eq!(read_run_length(&mut input, 4096).unwrap(), 1);
        assert_eq!(input.position(), 1);

        let mut input = Cursor::new(vec![0xFE]);
        assert_eq!(read_run_length(&mut input, 4096).unwrap(), 255);
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_run_length_terminated_sequences() {
        let mut input = Cursor::new(vec![0xFF, 0x00]);
        assert_eq!(read_run_length(&mut input, 4096).unwrap(), 256);
        assert_eq!(input.position(), 2);

        let mut input = Cursor::new(vec![0xFF, 0xFE]);
        assert_eq!(read_run_length(&mut input, 4096).unwrap(), 510);
        assert_eq!(input.position(), 2);

        // The byte after the terminator is not consumed.
        let mut input = Cursor::new(vec![0xFF, 0xFF, 0x00, 0xFF]);
        assert_eq!(read_run_length(&mut input, 4096).unwrap(), 511);
        assert_eq!(input.position(), 3);
    }

    #[test]
    fn test_run_length_unterminated() {
        // Four 0xFF bytes with a limit of four: no terminator in budget.
        let mut input = Cursor::new(vec![0xFF; 8]);
        assert!(matches!(
            read_run_length(&mut input, 4),
            Err(DecodeError::RunUnterminated)
        ));
    }

    #[test]
    fn test_create_tiles_130x65() {
        let tiles = create_tiles(130, 65);
        let expected = [
            (0, 0, 64, 64),
            (64, 0, 64, 64),
            (128, 0, 2, 64),
            (0, 64, 64, 1),
            (64, 64, 64, 1),
            (128, 64, 2, 1),
        ];
        assert_eq!(tiles.len(), expected.len());
        for (tile, &(x, y, w, h)) in tiles.iter().zip(&expected) {
            assert_eq!((tile.x, tile.y, tile.width, tile.height), (x, y, w, h));
        }
    }

    #[test]
    fn test_create_tiles_cover_exactly() {
        for &(w, h) in &[(1u16, 1u16), (64, 64), (65, 1), (100, 75), (800, 600)] {
            let tiles = create_tiles(w, h);
            let mut covered = vec![vec![0u8; w as usize]; h as usize];
            for tile in &tiles {
                assert!(tile.width >= 1 && tile.width <= 64);
                assert!(tile.height >= 1 && tile.height <= 64);
                for row in 0..tile.height as usize {
                    for col in 0..tile.width as usize {
                        covered[tile.y as usize + row][tile.x as usize + col] += 1;
                    }
                }
            }
            assert!(
                covered.iter().flatten().all(|&count| count == 1),
                "tiles of {w}x{h} must cover each pixel exactly once"
            );
        }
    }

    #[test]
    fn test_tiles_to_grid_composition() {
        let tiles = vec![
            Tile {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
                pixels: vec![cpixel(&[0xA0])],
            },
            Tile {
                x: 1,
                y: 0,
                width: 2,
                height: 1,
                pixels: vec![cpixel(&[0xB0]), cpixel(&[0xC0])],
            },
        ];
        let grid = tiles_to_grid(&tiles, 3, 1, 1);
        assert_eq!(
            grid,
            vec![vec![cpixel(&[0xA0]), cpixel(&[0xB0]), cpixel(&[0xC0])]]
        );
    }

    #[test]
    fn test_sub_encoding_reserved_values() {
        for value in [17u8, 42, 127, 129] {
            assert!(matches!(
                SubEncoding::from_byte(value),
                Err(DecodeError::InvalidSubencoding(v)) if v == value
            ));
        }
        assert_eq!(SubEncoding::from_byte(0).unwrap(), SubEncoding::Raw);
        assert_eq!(SubEncoding::from_byte(1).unwrap(), SubEncoding::Solid);
        assert_eq!(
            SubEncoding::from_byte(16).unwrap(),
            SubEncoding::PackedPalette(16)
        );
        assert_eq!(SubEncoding::from_byte(128).unwrap(), SubEncoding::PlainRle);
        assert_eq!(
            SubEncoding::from_byte(130).unwrap(),
            SubEncoding::PaletteRle(2)
        );
        assert_eq!(
            SubEncoding::from_byte(255).unwrap(),
            SubEncoding::PaletteRle(127)
        );
    }

    #[test]
    fn test_packed_palette_rows_are_byte_aligned() {
        let format = PixelFormat::bgr233();
        // Two colours, one bit per index, width 3: each row spends a whole
        // byte even though only three bits carry data.
        let mut data = vec![0x05, 0x0A]; // palette entries, 1 byte each
        data.push(0b1010_0000); // row 0: indices 1,0,1
        data.push(0b0100_0000); // row 1: indices 0,1,0
        let mut input = Cursor::new(data);

        let pixels = read_packed_palette(&mut input, &format, 3, 2, 2).unwrap();
        let p0 = cpixel(&[0x05]);
        let p1 = cpixel(&[0x0A]);
        assert_eq!(pixels, vec![p1, p0, p1, p0, p1, p0]);
    }

    #[test]
    fn test_plain_rle_reader() {
        let format = PixelFormat::bgr233();
        // 4 pixels of 0x11 then 2 pixels of 0x22 in a 3x2 tile.
        let data = vec![0x11, 0x03, 0x22, 0x01];
        let mut input = Cursor::new(data);

        let pixels = read_plain_rle(&mut input, &format, 6).unwrap();
        assert_eq!(
            pixels,
            vec![
                cpixel(&[0x11]),
                cpixel(&[0x11]),
                cpixel(&[0x11]),
                cpixel(&[0x11]),
                cpixel(&[0x22]),
                cpixel(&[0x22]),
            ]
        );
    }

    #[test]
    fn test_plain_rle_overrun() {
        let format = PixelFormat::bgr233();
        // Run of 2 into a single remaining pixel.
        let mut input = Cursor::new(vec![0x11, 0x01]);
        assert!(matches!(
            read_plain_rle(&mut input, &format, 1),
            Err(DecodeError::RunOverrun { run: 2, remaining: 1 })
        ));
    }

    #[test]
    fn test_palette_rle_single_and_run_indices() {
        let format = PixelFormat::bgr233();
        // Palette of two; one single-pixel index, then a run of 3 on the
        // other entry.
        let data = vec![0x05, 0x0A, 0x00, 0x81, 0x02];
        let mut input = Cursor::new(data);

        let pixels = read_palette_rle(&mut input, &format, 4, 2).unwrap();
        assert_eq!(
            pixels,
            vec![cpixel(&[0x05]), cpixel(&[0x0A]), cpixel(&[0x0A]), cpixel(&[0x0A])]
        );
    }

    #[test]
    fn test_palette_rle_index_out_of_bounds() {
        let format = PixelFormat::bgr233();
        // Palette of two entries, run index 5.
        let mut input = Cursor::new(vec![0x05, 0x0A, 0x85, 0x00]);
        assert!(matches!(
            read_palette_rle(&mut input, &format, 4, 2),
            Err(DecodeError::PaletteIndexOob {
                index: 5,
                palette_size: 2
            })
        ));
    }
}
