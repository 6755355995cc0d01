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

//! Palette reconstruction shared by the encoders and the decoders.
//!
//! The encoders score candidates with exactly the palettes built here, and the
//! decoders build their output from them too, so an error estimate always
//! matches what a decoder will produce.

/// How a BC1 colour block interprets its indices
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaletteMode {
    /// Two endpoints plus two interpolated colours at 1/3 and 2/3
    FourColour,
    /// Two endpoints, their midpoint and transparent black in slot 3
    ThreeColour,
}

/// Expands a 5:6:5 colour to 8 bits per channel by bit replication
pub fn unpack_565(value: u16) -> [u8; 3] {
    let r = ((value >> 11) & 0x1F) as u8;
    let g = ((value >> 5) & 0x3F) as u8;
    let b = (value & 0x1F) as u8;

    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Builds the 4-entry palette of a BC1 colour block.
///
/// BC2 and BC3 colour blocks (`is_bc1 == false`) always use four colours;
/// BC1 uses four colours iff `col0 > col1`.
pub fn colour_palette(col0: u16, col1: u16, is_bc1: bool) -> ([[u8; 4]; 4], PaletteMode) {
    let a = unpack_565(col0);
    let b = unpack_565(col1);

    let mode = if is_bc1 && col0 <= col1 {
        PaletteMode::ThreeColour
    } else {
        PaletteMode::FourColour
    };

    let mut palette = [[0u8, 0, 0, u8::MAX]; 4];
    for i in 0..3 {
        let c = u32::from(a[i]);
        let d = u32::from(b[i]);

        palette[0][i] = a[i];
        palette[1][i] = b[i];
        match mode {
            PaletteMode::FourColour => {
                palette[2][i] = ((2 * c + d) / 3) as u8;
                palette[3][i] = ((c + 2 * d) / 3) as u8;
            }
            PaletteMode::ThreeColour => {
                palette[2][i] = ((c + d) / 2) as u8;
                palette[3][i] = 0;
            }
        }
    }

    if mode == PaletteMode::ThreeColour {
        palette[3][3] = 0;
    }

    (palette, mode)
}

/// Channel-weighted squared distance between the RGB parts of two colours
pub fn colour_distance(a: &[u8; 4], b: &[u8; 4], weights: &[f32; 3]) -> f32 {
    let mut error = 0.0;
    for i in 0..3 {
        let d = f32::from(a[i]) - f32::from(b[i]);
        error += weights[i] * d * d;
    }
    error
}

/// Finds the closest of the first `count` palette entries. Earlier entries
/// win ties.
pub fn nearest_colour(
    palette: &[[u8; 4]; 4],
    count: usize,
    colour: &[u8; 4],
    weights: &[f32; 3],
) -> (u8, f32) {
    debug_assert!(count > 0 && count <= 4);

    let mut best = (0u8, f32::MAX);
    for (i, entry) in palette.iter().enumerate().take(count) {
        let d = colour_distance(entry, colour, weights);
        if d < best.1 {
            best = (i as u8, d);
        }
    }
    best
}

/// Picks the closest entry of a four-colour palette from the distances to
/// each entry, using pairwise comparisons instead of a running minimum.
///
/// Exact for collinear palettes ordered `[c0, c1, 2/3 c0 + 1/3 c1,
/// 1/3 c0 + 2/3 c1]`, which is what BC1 four-colour mode produces up to
/// rounding.
pub fn select_index4(d: [f32; 4]) -> u8 {
    let b0 = (d[0] > d[3]) as u8;
    let b1 = (d[1] > d[2]) as u8;
    let b2 = (d[0] > d[2]) as u8;
    let b3 = (d[1] > d[3]) as u8;
    let b4 = (d[2] > d[3]) as u8;

    let x0 = b1 & b2;
    let x1 = b0 & b3;
    let x2 = b0 & b4;

    x2 | ((x0 | x1) << 1)
}

/// Builds the 8-entry palette of an alpha ramp block.
///
/// `alpha0 > alpha1` selects the 8-level ramp, otherwise 6 interpolated
/// levels plus the fixed values 0 and 255.
pub fn alpha_palette(alpha0: u8, alpha1: u8) -> [u8; 8] {
    let a0 = u32::from(alpha0);
    let a1 = u32::from(alpha1);

    let mut codes = [0u8; 8];
    codes[0] = alpha0;
    codes[1] = alpha1;
    if alpha0 > alpha1 {
        for i in 1..7u32 {
            codes[1 + i as usize] = (((7 - i) * a0 + i * a1) / 7) as u8;
        }
    } else {
        for i in 1..5u32 {
            codes[1 + i as usize] = (((5 - i) * a0 + i * a1) / 5) as u8;
        }
        codes[6] = 0;
        codes[7] = u8::MAX;
    }
    codes
}

/// Finds the closest alpha code, returning the index and squared error.
/// Earlier codes win ties.
pub fn nearest_alpha(codes: &[u8; 8], value: u8) -> (u8, u32) {
    let mut best = (0u8, u32::MAX);
    for (i, &code) in codes.iter().enumerate() {
        let d = i32::from(value) - i32::from(code);
        let d = (d * d) as u32;
        if d < best.1 {
            best = (i as u8, d);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn unpack_extremes() {
        assert_eq!(unpack_565(0x0000), [0, 0, 0]);
        assert_eq!(unpack_565(0xFFFF), [255, 255, 255]);
        assert_eq!(unpack_565(0xF800), [255, 0, 0]);
        assert_eq!(unpack_565(0x07E0), [0, 255, 0]);
        assert_eq!(unpack_565(0x001F), [0, 0, 255]);
    }

    #[test]
    fn mode_follows_endpoint_order() {
        assert_eq!(colour_palette(2, 1, true).1, PaletteMode::FourColour);
        assert_eq!(colour_palette(1, 2, true).1, PaletteMode::ThreeColour);
        assert_eq!(colour_palette(1, 1, true).1, PaletteMode::ThreeColour);
        assert_eq!(colour_palette(1, 2, false).1, PaletteMode::FourColour);
    }

    #[test]
    fn four_colour_interpolation_truncates() {
        let (palette, _) = colour_palette(0xFFFF, 0x0000, true);
        assert_eq!(palette[2], [170, 170, 170, 255]);
        assert_eq!(palette[3], [85, 85, 85, 255]);
    }

    #[test]
    fn three_colour_has_transparent_black() {
        let (palette, _) = colour_palette(0x0000, 0xFFFF, true);
        assert_eq!(palette[2], [127, 127, 127, 255]);
        assert_eq!(palette[3], [0, 0, 0, 0]);
    }

    #[test]
    fn alpha_palettes() {
        assert_eq!(alpha_palette(255, 0), [255, 0, 218, 182, 145, 109, 72, 36]);
        assert_eq!(alpha_palette(0, 255), [0, 255, 51, 102, 153, 204, 0, 255]);
        assert_eq!(alpha_palette(9, 9), [9, 9, 9, 9, 9, 9, 0, 255]);
    }

    #[test]
    fn nearest_prefers_earlier_entry_on_ties() {
        let palette = [[10, 10, 10, 255], [10, 10, 10, 255], [0; 4], [0; 4]];
        assert_eq!(nearest_colour(&palette, 4, &[10, 10, 10, 255], &[1.0; 3]), (0, 0.0));
        assert_eq!(nearest_alpha(&[5, 5, 0, 0, 0, 0, 0, 0], 5), (0, 0));
    }

    #[test]
    fn pairwise_selection_matches_linear_search_on_collinear_palettes() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let c0: [f32; 3] = [rng.gen(), rng.gen(), rng.gen()];
            let c1: [f32; 3] = [rng.gen(), rng.gen(), rng.gen()];
            let lerp = |t: f32| [0, 1, 2].map(|i| c0[i] + (c1[i] - c0[i]) * t);
            let palette = [lerp(0.0), lerp(1.0), lerp(1.0 / 3.0), lerp(2.0 / 3.0)];

            let colour: [f32; 3] = [rng.gen(), rng.gen(), rng.gen()];
            let d = palette.map(|p| (0..3).map(|i| (p[i] - colour[i]) * (p[i] - colour[i])).sum::<f32>());

            let mut best = 0;
            for i in 1..4 {
                if d[i] < d[best] {
                    best = i;
                }
            }
            let chosen = select_index4(d) as usize;
            assert!(d[chosen] <= d[best] + 1e-6, "{:?} {} {}", d, chosen, best);
        }
    }
}
