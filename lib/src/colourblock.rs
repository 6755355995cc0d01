// Copyright (c) 2006 Simon Brown <si@sjbrown.co.uk>
// Copyright (c) 2018-2021 Jan Solanti <jhs@psonet.com>
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to	deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
// CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE
// SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use core::mem;

use byteorder::{ByteOrder, LittleEndian};

use crate::math::{quantise, Vec3};
use crate::palette::{colour_palette, PaletteMode};

/// A BC1 colour block: two 5:6:5 endpoints and sixteen 2-bit indices,
/// pixel 0 in the lowest bits.
///
/// BC2 and BC3 embed the same structure after their alpha block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bc1Block {
    pub col0: u16,
    pub col1: u16,
    pub indices: u32,
}

/// Converts a colour in [0, 1] to a 5:6:5 value
pub fn pack_565(colour: &Vec3) -> u16 {
    let r = u16::from(quantise(colour.x(), 5));
    let g = u16::from(quantise(colour.y(), 6));
    let b = u16::from(quantise(colour.z(), 5));

    (r << 11) | (g << 5) | b
}

fn pack_indices(indices: &[u8; 16]) -> u32 {
    indices
        .iter()
        .enumerate()
        .fold(0u32, |packed, (i, &index)| packed | (u32::from(index & 0x03) << (2 * i)))
}

impl Bc1Block {
    pub const SIZE: usize = 8;

    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() == Self::SIZE);
        Bc1Block {
            col0: LittleEndian::read_u16(&bytes[0..2]),
            col1: LittleEndian::read_u16(&bytes[2..4]),
            indices: LittleEndian::read_u32(&bytes[4..8]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u16(&mut bytes[0..2], self.col0);
        LittleEndian::write_u16(&mut bytes[2..4], self.col1);
        LittleEndian::write_u32(&mut bytes[4..8], self.indices);
        bytes
    }

    /// Unpacks the 2-bit index of every pixel
    pub fn index_array(&self) -> [u8; 16] {
        let mut indices = [0u8; 16];
        for (i, index) in indices.iter_mut().enumerate() {
            *index = ((self.indices >> (2 * i)) & 0x03) as u8;
        }
        indices
    }

    /// How a BC1 decoder interprets this block
    pub fn mode(&self) -> PaletteMode {
        if self.col0 > self.col1 {
            PaletteMode::FourColour
        } else {
            PaletteMode::ThreeColour
        }
    }

    pub fn palette(&self, is_bc1: bool) -> [[u8; 4]; 4] {
        colour_palette(self.col0, self.col1, is_bc1).0
    }

    /// Decompresses to 4x4 RGBA pixels
    pub fn decode(&self, is_bc1: bool) -> [[u8; 4]; 16] {
        let palette = self.palette(is_bc1);
        self.index_array().map(|index| palette[index as usize])
    }
}

/// Writes a three-colour block. Index 0 selects `start`, 1 `end`, 2 the
/// midpoint and 3 transparent black.
pub fn write3(start: &Vec3, end: &Vec3, indices: &[u8; 16]) -> Bc1Block {
    write3_packed(pack_565(start), pack_565(end), indices)
}

/// Writes a four-colour block. Index 0 selects `start`, 1 `end`, 2 the
/// colour 1/3 of the way and 3 the colour 2/3 of the way towards `end`.
pub fn write4(start: &Vec3, end: &Vec3, indices: &[u8; 16]) -> Bc1Block {
    write4_packed(pack_565(start), pack_565(end), indices)
}

/// Like [`write4`] with endpoints already in 5:6:5
pub fn write4_packed(mut a: u16, mut b: u16, indices: &[u8; 16]) -> Bc1Block {
    // remap indices
    let mut remapped = [0u8; 16];
    if a < b {
        mem::swap(&mut a, &mut b);
        for (remapped, index) in remapped.iter_mut().zip(indices) {
            *remapped = (index ^ 0x01) & 0x03;
        }
    } else if a > b {
        // use indices as-is
        remapped = *indices;
    } else if a > 0 {
        // equal endpoints would decode as three-colour, step col1 down and
        // select col0 everywhere
        b = a - 1;
    } else {
        // black: select col1 everywhere
        a = 1;
        remapped = [1; 16];
    }

    Bc1Block {
        col0: a,
        col1: b,
        indices: pack_indices(&remapped),
    }
}

/// Like [`write3`] with endpoints already in 5:6:5
pub fn write3_packed(mut a: u16, mut b: u16, indices: &[u8; 16]) -> Bc1Block {
    let mut remapped = *indices;

    if a > b {
        // swap a, b and indices referring to them
        mem::swap(&mut a, &mut b);
        for index in &mut remapped[..] {
            *index = match *index {
                0 => 1,
                1 => 0,
                x => x,
            };
        }
    }

    Bc1Block {
        col0: a,
        col1: b,
        indices: pack_indices(&remapped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::*;

    #[test]
    fn bytes_are_little_endian() {
        let block = Bc1Block {
            col0: 0x1234,
            col1: 0xABCD,
            indices: 0x0102_0304,
        };
        let bytes = block.to_bytes();
        assert_eq!(bytes, [0x34, 0x12, 0xCD, 0xAB, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(Bc1Block::from_bytes(&bytes), block);
    }

    #[test]
    fn decode_reference_blocks() {
        let block = Bc1Block::from_bytes(BC1_GRAY.encoded);
        let decoded = block.decode(true);
        for (pixel, expected) in decoded.iter().zip(BC1_GRAY.decoded.chunks(4)) {
            assert_eq!(&pixel[..], expected);
        }

        let block = Bc1Block::from_bytes(BC1_COLOUR.encoded);
        let decoded = block.decode(true);
        for (pixel, expected) in decoded.iter().zip(BC1_COLOUR.decoded.chunks(4)) {
            assert_eq!(&pixel[..], expected);
        }
    }

    #[test]
    fn write4_always_selects_four_colour_mode() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        let blue = Vec3::new(0.0, 0.0, 1.0);
        let indices = [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3];

        for (start, end) in [(red, blue), (blue, red)] {
            let block = write4(&start, &end, &indices);
            assert_eq!(block.mode(), PaletteMode::FourColour);

            // whichever order the endpoints were packed in, the decoded
            // colours must follow the requested indices
            let decoded = block.decode(true);
            assert_eq!(decoded[0], [(start.x() * 255.0) as u8, 0, (start.z() * 255.0) as u8, 255]);
            assert_eq!(decoded[1], [(end.x() * 255.0) as u8, 0, (end.z() * 255.0) as u8, 255]);
        }
    }

    #[test]
    fn write4_with_equal_endpoints_stays_four_colour() {
        let grey = Vec3::new(0.5, 0.5, 0.5);
        let block = write4(&grey, &grey, &[3; 16]);
        assert_eq!(block.mode(), PaletteMode::FourColour);
        assert_eq!(block.col0, pack_565(&grey));
        assert_eq!(block.col1, block.col0 - 1);
        assert_eq!(block.indices, 0);

        let black = Vec3::new(0.0, 0.0, 0.0);
        let block = write4(&black, &black, &[2; 16]);
        assert_eq!(block.mode(), PaletteMode::FourColour);
        assert_eq!(block.decode(true), [[0, 0, 0, 255]; 16]);
    }

    #[test]
    fn write3_keeps_transparent_index() {
        let white = Vec3::new(1.0, 1.0, 1.0);
        let black = Vec3::new(0.0, 0.0, 0.0);
        let mut indices = [0u8; 16];
        indices[1] = 1;
        indices[2] = 2;
        indices[3] = 3;

        let block = write3(&white, &black, &indices);
        assert_eq!(block.mode(), PaletteMode::ThreeColour);
        let decoded = block.decode(true);
        assert_eq!(decoded[0], [255, 255, 255, 255]);
        assert_eq!(decoded[1], [0, 0, 0, 255]);
        assert_eq!(decoded[2], [127, 127, 127, 255]);
        assert_eq!(decoded[3], [0, 0, 0, 0]);
    }
}
