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

//! Alpha blocks: the explicit 4-bit alpha of BC2 and the interpolated ramp
//! used for BC3 alpha and the BC4/BC5 channels.

mod optimal;
mod quick;

use byteorder::{ByteOrder, LittleEndian};

use crate::block::ColourBlock;
use crate::math::{expand, quantise};
use crate::palette::{alpha_palette, nearest_alpha};
use crate::Quality;

/// BC2 alpha: sixteen 4-bit values, pixel 0 in the lowest bits
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExplicitAlphaBlock {
    pub alpha: u64,
}

impl ExplicitAlphaBlock {
    pub const SIZE: usize = 8;

    /// Quantises the alpha of every pixel to 4 bits. Ignored pixels get 0.
    pub fn compress(block: &ColourBlock) -> Self {
        let mut alpha = 0u64;
        for (i, (pixel, &weight)) in block.colours().iter().zip(block.weights()).enumerate() {
            let quant = if weight > 0.0 {
                quantise(f32::from(pixel[3]) / 255.0, 4)
            } else {
                0
            };
            alpha |= u64::from(quant) << (4 * i);
        }
        ExplicitAlphaBlock { alpha }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() == Self::SIZE);
        ExplicitAlphaBlock {
            alpha: LittleEndian::read_u64(bytes),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, self.alpha);
        bytes
    }

    pub fn decode(&self) -> [u8; 16] {
        let mut values = [0u8; 16];
        for (i, value) in values.iter_mut().enumerate() {
            *value = expand(((self.alpha >> (4 * i)) & 0x0F) as u8, 4);
        }
        values
    }
}

/// An interpolated ramp: two 8-bit endpoints and sixteen 3-bit indices packed
/// into 48 bits, pixel 0 in the lowest bits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AlphaBlock {
    pub alpha0: u8,
    pub alpha1: u8,
    pub indices: u64,
}

impl AlphaBlock {
    pub const SIZE: usize = 8;

    pub fn new(alpha0: u8, alpha1: u8, indices: &[u8; 16]) -> Self {
        let indices = indices
            .iter()
            .enumerate()
            .fold(0u64, |packed, (i, &index)| packed | (u64::from(index & 0x07) << (3 * i)));

        AlphaBlock {
            alpha0,
            alpha1,
            indices,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() == Self::SIZE);
        AlphaBlock {
            alpha0: bytes[0],
            alpha1: bytes[1],
            indices: LittleEndian::read_uint(&bytes[2..8], 6),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.alpha0;
        bytes[1] = self.alpha1;
        LittleEndian::write_uint(&mut bytes[2..8], self.indices, 6);
        bytes
    }

    pub fn index_array(&self) -> [u8; 16] {
        let mut indices = [0u8; 16];
        for (i, index) in indices.iter_mut().enumerate() {
            *index = ((self.indices >> (3 * i)) & 0x07) as u8;
        }
        indices
    }

    /// True if the block uses eight interpolated levels rather than six plus
    /// 0 and 255
    pub fn is_eight_level(&self) -> bool {
        self.alpha0 > self.alpha1
    }

    pub fn palette(&self) -> [u8; 8] {
        alpha_palette(self.alpha0, self.alpha1)
    }

    pub fn decode(&self) -> [u8; 16] {
        let codes = self.palette();
        self.index_array().map(|index| codes[index as usize])
    }
}

/// One channel of a block prepared for ramp fitting
pub(crate) struct RampValues {
    values: [u8; 16],
    weights: [f32; 16],
}

impl RampValues {
    pub fn new(block: &ColourBlock, channel: usize) -> Self {
        let mut values = [0u8; 16];
        for (value, pixel) in values.iter_mut().zip(block.colours()) {
            *value = pixel[channel];
        }
        RampValues {
            values,
            weights: *block.weights(),
        }
    }

    /// Values of the pixels that count, with their weights
    fn active(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.values
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, &w)| w > 0.0)
            .map(|(&v, &w)| (v, w))
    }

    /// Smallest and largest active value, if any pixel is active
    fn range(&self) -> Option<(u8, u8)> {
        self.active()
            .map(|(v, _)| v)
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// Assigns every pixel its nearest code. Returns `None` once the weighted
    /// error reaches `limit`.
    fn fit(&self, codes: &[u8; 8], limit: f32, indices: &mut [u8; 16]) -> Option<f32> {
        let mut error = 0f32;
        for i in 0..16 {
            if self.weights[i] <= 0.0 {
                indices[i] = 0;
                continue;
            }

            let (index, d) = nearest_alpha(codes, self.values[i]);
            indices[i] = index;
            error += self.weights[i] * d as f32;
            if error >= limit {
                return None;
            }
        }
        Some(error)
    }

    /// Fits a palette without a limit
    fn fit_all(&self, alpha0: u8, alpha1: u8) -> (AlphaBlock, f32) {
        let mut indices = [0u8; 16];
        let error = self
            .fit(&alpha_palette(alpha0, alpha1), f32::INFINITY, &mut indices)
            .unwrap_or(f32::INFINITY);
        (AlphaBlock::new(alpha0, alpha1, &indices), error)
    }

    /// Weighted squared error of a block against these values
    pub fn error(&self, block: &AlphaBlock) -> f32 {
        block
            .decode()
            .iter()
            .zip(self.values.iter().zip(self.weights.iter()))
            .filter(|(_, (_, &w))| w > 0.0)
            .map(|(&d, (&v, &w))| {
                let diff = f32::from(d) - f32::from(v);
                w * diff * diff
            })
            .sum()
    }
}

/// Compresses one channel of a block to a ramp block
pub fn compress_ramp(block: &ColourBlock, channel: usize, quality: Quality) -> AlphaBlock {
    let values = RampValues::new(block, channel);

    match values.range() {
        // nothing to encode
        None => AlphaBlock::default(),
        // a single value is exact with both endpoints on it
        Some((min, max)) if min == max => AlphaBlock::new(min, max, &[0; 16]),
        Some(_) => match quality {
            Quality::Fastest | Quality::Normal => quick::compress(&values),
            Quality::Production | Quality::Highest => optimal::compress(&values),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const QUALITIES: [Quality; 4] = [
        Quality::Fastest,
        Quality::Normal,
        Quality::Production,
        Quality::Highest,
    ];

    fn alpha_block(alpha: [u8; 16]) -> ColourBlock {
        let mut rgba = [[0u8; 4]; 16];
        for (p, a) in rgba.iter_mut().zip(alpha.iter()) {
            *p = [0, 0, 0, *a];
        }
        ColourBlock::new(rgba)
    }

    #[test]
    fn explicit_alpha_matches_reference() {
        for data in [BC2_GRAY, BC2_COLOUR] {
            let block = ColourBlock::new(data.pixels());
            let encoded = ExplicitAlphaBlock::compress(&block);
            assert_eq!(&encoded.to_bytes()[..], &data.encoded[..8]);

            let decoded = ExplicitAlphaBlock::from_bytes(&data.encoded[..8]).decode();
            for (value, pixel) in decoded.iter().zip(data.pixels().iter()) {
                assert_eq!(*value, pixel[3]);
            }
        }
    }

    #[test]
    fn explicit_alpha_ignores_unweighted_pixels() {
        let block = ColourBlock::with_mask([[0, 0, 0, 255]; 16], 0xFFFE);
        let encoded = ExplicitAlphaBlock::compress(&block);
        assert_eq!(encoded.alpha & 0x0F, 0);
        assert_eq!(encoded.alpha >> 4, 0x0FFF_FFFF_FFFF_FFFF);
    }

    #[test]
    fn ramp_bytes_are_little_endian() {
        let mut indices = [0u8; 16];
        indices[0] = 7;
        indices[15] = 5;
        let block = AlphaBlock::new(200, 10, &indices);
        let bytes = block.to_bytes();
        assert_eq!(bytes, [200, 10, 0x07, 0, 0, 0, 0, 0xA0]);
        assert_eq!(AlphaBlock::from_bytes(&bytes), block);
        assert_eq!(block.index_array(), indices);
    }

    #[test]
    fn flat_alpha_is_exact() {
        let block = ColourBlock::new([[255, 0, 0, 255]; 16]);
        for quality in QUALITIES {
            let encoded = compress_ramp(&block, 3, quality);
            assert_eq!((encoded.alpha0, encoded.alpha1), (255, 255));
            assert_eq!(encoded.decode(), [255; 16]);
        }
    }

    #[test]
    fn ignored_channel_is_zero_block() {
        let block = ColourBlock::with_weights([[1, 2, 3, 4]; 16], [0.0; 16]);
        assert_eq!(compress_ramp(&block, 3, Quality::Normal), AlphaBlock::default());
        assert_eq!(AlphaBlock::default().to_bytes(), [0; 8]);
    }

    #[test]
    fn narrow_range_is_exact() {
        let mut alpha = [0u8; 16];
        for (i, a) in alpha.iter_mut().enumerate() {
            *a = 100 + (i % 8) as u8;
        }
        let block = alpha_block(alpha);
        for quality in [Quality::Production, Quality::Highest] {
            assert_eq!(compress_ramp(&block, 3, quality).decode(), alpha);
        }
    }

    #[test]
    fn six_level_ramp_keeps_extremes() {
        let mut alpha = [128u8; 16];
        alpha[0] = 0;
        alpha[1] = 255;
        for (i, a) in alpha.iter_mut().enumerate().skip(2) {
            *a = 120 + i as u8;
        }
        let block = alpha_block(alpha);
        let values = RampValues::new(&block, 3);

        for quality in QUALITIES {
            let encoded = compress_ramp(&block, 3, quality);
            let decoded = encoded.decode();
            assert_eq!(decoded[0], 0, "{:?}", quality);
            assert_eq!(decoded[1], 255, "{:?}", quality);
            assert!(values.error(&encoded) <= 14.0 * 4.0, "{:?}", quality);
        }
    }

    #[test]
    fn optimal_is_never_worse_than_quick() {
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..64 {
            let lo: u8 = rng.gen_range(0..200);
            let spread: u8 = rng.gen_range(1..=55);
            let mut alpha = [0u8; 16];
            for a in alpha.iter_mut() {
                *a = lo + rng.gen_range(0..=spread);
            }
            let block = alpha_block(alpha);
            let values = RampValues::new(&block, 3);

            let quick = values.error(&compress_ramp(&block, 3, Quality::Normal));
            let optimal = values.error(&compress_ramp(&block, 3, Quality::Highest));
            assert!(optimal <= quick, "{:?}: {} > {}", alpha, optimal, quick);
        }
    }

    #[test]
    fn palette_mode_follows_endpoint_order() {
        let mut rng = StdRng::seed_from_u64(8);
        for quality in QUALITIES {
            for _ in 0..16 {
                let alpha: [u8; 16] = rng.gen();
                let encoded = compress_ramp(&alpha_block(alpha), 3, quality);
                let codes = encoded.palette();
                if encoded.is_eight_level() {
                    assert!(codes[2..].windows(2).all(|w| w[0] >= w[1]));
                    assert!(codes[0] >= codes[2] && codes[7] >= codes[1]);
                } else {
                    assert_eq!((codes[6], codes[7]), (0, 255));
                }
            }
        }
    }
}
