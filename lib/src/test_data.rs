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

//! Reference blocks for the unit tests, encoded with AMD Compressonator
//! v4.1.5083. Names follow `<format>_<pattern>`.

/// One 4x4 block in encoded form and as tightly packed RGBA8 pixels
pub struct Fixture {
    pub encoded: &'static [u8],
    pub decoded: &'static [u8; 64],
}

impl Fixture {
    pub fn pixels(&self) -> [[u8; 4]; 16] {
        let mut pixels = [[0u8; 4]; 16];
        for (pixel, bytes) in pixels.iter_mut().zip(self.decoded.chunks_exact(4)) {
            pixel.copy_from_slice(bytes);
        }
        pixels
    }
}

/// Checkerboard of black and white with the four middle pixels 0x7F
pub const BC1_GRAY: Fixture = Fixture {
    encoded: &[0x00, 0x00, 0xFF, 0xFF, 0x11, 0x68, 0x29, 0x44],
    decoded: &opaque(&grey(&checkerboard(0x7F))),
};

/// Three bands of orange: one row, one row, two rows. Same as libsquish.
pub const BC1_COLOUR: Fixture = Fixture {
    encoded: &[0xA9, 0xFC, 0x45, 0xFB, 0x00, 0xFF, 0x55, 0x55],
    decoded: &opaque(&BANDS),
};

/// Checkerboard with the middle pixels 0x55 and alpha rising by 0x11 per pixel
pub const BC2_GRAY: Fixture = Fixture {
    encoded: &[
        0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE, // alpha
        0xFF, 0xFF, 0x00, 0x00, 0x44, 0x3D, 0x7C, 0x11, // colour
    ],
    decoded: &alpha_ramp(&grey(&checkerboard(0x55))),
};

/// The BC1_COLOUR bands with alpha rising by 0x11 per pixel
pub const BC2_COLOUR: Fixture = Fixture {
    encoded: &[
        0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE, // alpha
        0xA9, 0xFC, 0x45, 0xFB, 0x00, 0xFF, 0x55, 0x55, // colour
    ],
    decoded: &alpha_ramp(&BANDS),
};

const BANDS: [[u8; 3]; 16] = {
    let top = [0xFF, 0x96, 0x4A];
    let middle = [0xFF, 0x78, 0x34];
    let bottom = [0xFF, 0x69, 0x29];
    [
        top, top, top, top, // row 0
        middle, middle, middle, middle, // row 1
        bottom, bottom, bottom, bottom, // row 2
        bottom, bottom, bottom, bottom, // row 3
    ]
};

const fn checkerboard(middle: u8) -> [u8; 16] {
    [
        0xFF, 0x00, 0xFF, 0x00, // row 0
        0x00, middle, middle, 0xFF, // row 1
        0xFF, middle, middle, 0x00, // row 2
        0x00, 0xFF, 0x00, 0xFF, // row 3
    ]
}

const fn grey(luma: &[u8; 16]) -> [[u8; 3]; 16] {
    let mut rgb = [[0u8; 3]; 16];
    let mut i = 0;
    while i < 16 {
        rgb[i] = [luma[i], luma[i], luma[i]];
        i += 1;
    }
    rgb
}

const fn with_alpha(rgb: &[[u8; 3]; 16], step: u8, start: u8) -> [u8; 64] {
    let mut rgba = [0u8; 64];
    let mut i = 0;
    while i < 16 {
        rgba[4 * i] = rgb[i][0];
        rgba[4 * i + 1] = rgb[i][1];
        rgba[4 * i + 2] = rgb[i][2];
        rgba[4 * i + 3] = start.wrapping_add(step.wrapping_mul(i as u8));
        i += 1;
    }
    rgba
}

const fn opaque(rgb: &[[u8; 3]; 16]) -> [u8; 64] {
    with_alpha(rgb, 0, 0xFF)
}

const fn alpha_ramp(rgb: &[[u8; 3]; 16]) -> [u8; 64] {
    with_alpha(rgb, 0x11, 0)
}
