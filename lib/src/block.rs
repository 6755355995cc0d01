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

//! The fixed 4x4 tile every compressor works on.

/// Source of a channel when swizzling a block
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
    /// Constant 0
    Zero,
    /// Constant 255
    One,
}

impl Channel {
    /// Reads this channel from an RGBA pixel
    pub fn select(self, pixel: &[u8; 4]) -> u8 {
        match self {
            Channel::Red => pixel[0],
            Channel::Green => pixel[1],
            Channel::Blue => pixel[2],
            Channel::Alpha => pixel[3],
            Channel::Zero => 0,
            Channel::One => u8::MAX,
        }
    }

    /// Applies a swizzle to one pixel
    pub fn swizzle(channels: [Channel; 4], pixel: &[u8; 4]) -> [u8; 4] {
        channels.map(|channel| channel.select(pixel))
    }
}

/// A 4x4 block of RGBA8 pixels in row-major order, each with a non-negative
/// weight. A weight of zero excludes the pixel from fitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColourBlock {
    colours: [[u8; 4]; 16],
    weights: [f32; 16],
}

impl ColourBlock {
    /// Creates a block where every pixel has weight 1
    pub fn new(rgba: [[u8; 4]; 16]) -> Self {
        ColourBlock {
            colours: rgba,
            weights: [1.0; 16],
        }
    }

    /// Creates a block where pixel `i` has weight 1 if bit `i` of `mask` is
    /// set and 0 otherwise
    pub fn with_mask(rgba: [[u8; 4]; 16], mask: u32) -> Self {
        let mut weights = [0.0; 16];
        for (i, w) in weights.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                *w = 1.0;
            }
        }

        ColourBlock {
            colours: rgba,
            weights,
        }
    }

    /// Creates a block with explicit per-pixel weights. Negative or non-finite
    /// weights are treated as 0.
    pub fn with_weights(rgba: [[u8; 4]; 16], weights: [f32; 16]) -> Self {
        ColourBlock {
            colours: rgba,
            weights: weights.map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 }),
        }
    }

    /// Creates a block from normalised float pixels, clamped to [0, 1] and
    /// rounded to 8 bits per channel
    pub fn from_rgba_f32(rgba: &[[f32; 4]; 16]) -> Self {
        let mut colours = [[0u8; 4]; 16];
        for (out, pixel) in colours.iter_mut().zip(rgba) {
            for (o, &v) in out.iter_mut().zip(pixel) {
                let v = if v.is_nan() { 0.0 } else { v };
                *o = libm::roundf(v.max(0.0).min(1.0) * 255.0) as u8;
            }
        }
        Self::new(colours)
    }

    /// Extracts the block at block coordinates (`bx`, `by`) from a tightly
    /// packed RGBA8 image. Pixels past the right or bottom edge repeat the
    /// existing pixels of the block instead of being padded with black.
    pub fn from_image(rgba: &[u8], width: usize, height: usize, bx: usize, by: usize) -> Self {
        debug_assert!(rgba.len() >= 4 * width * height);
        debug_assert!(4 * bx < width && 4 * by < height);

        let block_width = (width - 4 * bx).min(4);
        let block_height = (height - 4 * by).min(4);

        let mut colours = [[0u8; 4]; 16];
        for py in 0..4 {
            for px in 0..4 {
                let sx = 4 * bx + px % block_width;
                let sy = 4 * by + py % block_height;
                let src = 4 * (width * sy + sx);
                colours[4 * py + px].copy_from_slice(&rgba[src..src + 4]);
            }
        }

        Self::new(colours)
    }

    pub fn colours(&self) -> &[[u8; 4]; 16] {
        &self.colours
    }

    pub fn weights(&self) -> &[f32; 16] {
        &self.weights
    }

    pub fn colour(&self, i: usize) -> [u8; 4] {
        debug_assert!(i < 16);
        self.colours[i]
    }

    pub fn colour_at(&self, x: usize, y: usize) -> [u8; 4] {
        debug_assert!(x < 4 && y < 4);
        self.colours[4 * y + x]
    }

    pub fn weight(&self, i: usize) -> f32 {
        debug_assert!(i < 16);
        self.weights[i]
    }

    /// Rearranges the channels of every pixel, e.g. `[Alpha, Green, Zero, One]`
    pub fn swizzle(&mut self, channels: [Channel; 4]) {
        for pixel in self.colours.iter_mut() {
            *pixel = Channel::swizzle(channels, pixel);
        }
    }

    fn active(&self) -> impl Iterator<Item = &[u8; 4]> + '_ {
        self.colours
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, &w)| w > 0.0)
            .map(|(c, _)| c)
    }

    /// True if all weighted pixels share the same RGBA value
    pub fn is_single_colour(&self) -> bool {
        let mut active = self.active();
        match active.next() {
            Some(first) => active.all(|c| c == first),
            None => true,
        }
    }

    /// True if all weighted pixels share the same value in `channel` (0-3)
    pub fn is_single_value(&self, channel: usize) -> bool {
        debug_assert!(channel < 4);
        let mut active = self.active();
        match active.next() {
            Some(first) => active.all(|c| c[channel] == first[channel]),
            None => true,
        }
    }

    /// True if any weighted pixel is not fully opaque
    pub fn has_alpha(&self) -> bool {
        self.active().any(|c| c[3] != u8::MAX)
    }

    /// True if every weighted pixel has equal red, green and blue
    pub fn is_greyscale(&self) -> bool {
        self.active().all(|c| c[0] == c[1] && c[1] == c[2])
    }

    /// True if no pixel carries any weight
    pub fn is_fully_ignored(&self) -> bool {
        self.weights.iter().all(|&w| w <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> [[u8; 4]; 16] {
        let mut rgba = [[0u8; 4]; 16];
        for (i, p) in rgba.iter_mut().enumerate() {
            *p = [i as u8, 2 * i as u8, 3 * i as u8, 255 - i as u8];
        }
        rgba
    }

    #[test]
    fn addressing_is_row_major() {
        let block = ColourBlock::new(ramp());
        assert_eq!(block.colour_at(0, 0), block.colour(0));
        assert_eq!(block.colour_at(3, 0), block.colour(3));
        assert_eq!(block.colour_at(1, 2), block.colour(9));
    }

    #[test]
    fn mask_sets_weights() {
        let block = ColourBlock::with_mask(ramp(), 0b101);
        assert_eq!(block.weight(0), 1.0);
        assert_eq!(block.weight(1), 0.0);
        assert_eq!(block.weight(2), 1.0);
        assert_eq!(block.weight(3), 0.0);
        assert!(!block.is_fully_ignored());
        assert!(ColourBlock::with_mask(ramp(), 0).is_fully_ignored());
    }

    #[test]
    fn invalid_weights_are_ignored() {
        let mut weights = [1.0; 16];
        weights[0] = -3.0;
        weights[1] = f32::NAN;
        let block = ColourBlock::with_weights(ramp(), weights);
        assert_eq!(block.weight(0), 0.0);
        assert_eq!(block.weight(1), 0.0);
        assert_eq!(block.weight(2), 1.0);
    }

    #[test]
    fn swizzle_moves_channels() {
        let mut block = ColourBlock::new(ramp());
        block.swizzle([Channel::Alpha, Channel::Red, Channel::Zero, Channel::One]);
        assert_eq!(block.colour(2), [253, 2, 0, 255]);
    }

    #[test]
    fn channel_selection() {
        let pixel = [1, 2, 3, 4];
        assert_eq!(Channel::Blue.select(&pixel), 3);
        assert_eq!(Channel::One.select(&pixel), 255);
        assert_eq!(
            Channel::swizzle([Channel::Green, Channel::Green, Channel::Zero, Channel::Red], &pixel),
            [2, 2, 0, 1]
        );
    }

    #[test]
    fn uniformity_ignores_unweighted_pixels() {
        let mut rgba = [[10, 20, 30, 255]; 16];
        rgba[5] = [0, 0, 0, 0];
        assert!(!ColourBlock::new(rgba).is_single_colour());
        assert!(!ColourBlock::new(rgba).is_single_value(3));
        assert!(!ColourBlock::new(rgba).is_single_value(0));

        let masked = ColourBlock::with_mask(rgba, !(1 << 5));
        assert!(masked.is_single_colour());
        assert!(!masked.has_alpha());
        assert!(ColourBlock::new(rgba).has_alpha());
    }

    #[test]
    fn greyscale_detection() {
        assert!(ColourBlock::new([[7, 7, 7, 0]; 16]).is_greyscale());
        assert!(!ColourBlock::new(ramp()).is_greyscale());
    }

    #[test]
    fn edge_blocks_repeat_pixels() {
        // 5x5 image, the second block column only has a single pixel column
        let (width, height) = (5, 5);
        let mut image = vec![0u8; 4 * width * height];
        for y in 0..height {
            for x in 0..width {
                let i = 4 * (y * width + x);
                image[i..i + 4].copy_from_slice(&[x as u8 * 10, y as u8 * 10, 1, 255]);
            }
        }

        let block = ColourBlock::from_image(&image, width, height, 1, 1);
        for p in block.colours() {
            assert_eq!(*p, [40, 40, 1, 255]);
        }

        let block = ColourBlock::from_image(&image, width, height, 1, 0);
        assert_eq!(block.colour_at(3, 2), [40, 20, 1, 255]);
        assert!(block.weights().iter().all(|&w| w == 1.0));
    }

    #[test]
    fn float_input_is_rounded_and_clamped() {
        let mut rgba = [[0.5f32, 1.5, -1.0, 1.0]; 16];
        rgba[1] = [f32::NAN, 0.0, 1.0, 0.0];
        let block = ColourBlock::from_rgba_f32(&rgba);
        assert_eq!(block.colour(0), [128, 255, 0, 255]);
        assert_eq!(block.colour(1), [0, 0, 255, 0]);
    }
}
