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

use crate::colourblock::{self, Bc1Block};
use crate::colourset::ColourSet;
use crate::math::{expand, quantise};

use super::{score_endpoints, ColourFitImpl};

/// Steps the green search extends past the observed range on each side
const WINDOW: i32 = 4;

/// Brute-force fit for greyscale sets.
///
/// Searches 6-bit green endpoint pairs, deriving red and blue from the
/// expanded green value, and scores each pair on all three channels.
pub struct GreenFit<'a> {
    colourset: &'a ColourSet,
    weights: [f32; 3],
    lo: u8,
    hi: u8,
}

impl<'a> GreenFit<'a> {
    pub fn new(colourset: &'a ColourSet, weights: [f32; 3]) -> Self {
        debug_assert!(colourset.is_greyscale());

        let (min, max) = (0..colourset.count())
            .map(|j| colourset.colour(j)[1])
            .fold((u8::MAX, 0u8), |(min, max), g| (min.min(g), max.max(g)));
        let (min, max) = if min > max { (0, 0) } else { (min, max) };

        let lo = i32::from(quantise(f32::from(min) / 255.0, 6)) - WINDOW;
        let hi = i32::from(quantise(f32::from(max) / 255.0, 6)) + WINDOW;

        GreenFit {
            colourset,
            weights,
            lo: lo.max(0) as u8,
            hi: hi.min(63) as u8,
        }
    }

    fn search(&self, admit: impl Fn(u8, u8) -> bool) -> Option<(u16, u16, [u8; 16])> {
        let mut best: Option<(u16, u16, [u8; 16])> = None;
        let mut best_error = f32::INFINITY;
        let mut closest = [0u8; 16];

        for g0 in self.lo..=self.hi {
            let col0 = grey_565(g0);
            for g1 in self.lo..=self.hi {
                if !admit(g0, g1) {
                    continue;
                }
                let col1 = grey_565(g1);
                if let Some(error) =
                    score_endpoints(self.colourset, &self.weights, col0, col1, best_error, &mut closest)
                {
                    best_error = error;
                    best = Some((col0, col1, closest));
                }
            }
        }

        best
    }
}

/// 5:6:5 grey with red and blue matched to the expanded 6-bit green
pub fn grey_565(green: u8) -> u16 {
    let rb = u16::from(quantise(f32::from(expand(green, 6)) / 255.0, 5));
    (rb << 11) | (u16::from(green) << 5) | rb
}

impl<'a> ColourFitImpl<'a> for GreenFit<'a> {
    fn colourset(&self) -> &'a ColourSet {
        self.colourset
    }

    fn compress3(&mut self) -> Option<Bc1Block> {
        // red follows green, so packed order follows green order
        let (col0, col1, closest) = self.search(|g0, g1| g0 <= g1)?;

        let mut indices = [0u8; 16];
        self.colourset.remap_indices(&closest, &mut indices);
        Some(colourblock::write3_packed(col0, col1, &indices))
    }

    fn compress4(&mut self) -> Option<Bc1Block> {
        let (col0, col1, closest) = self.search(|g0, g1| g0 > g1)?;

        let mut indices = [0u8; 16];
        self.colourset.remap_indices(&closest, &mut indices);
        Some(colourblock::write4_packed(col0, col1, &indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ColourBlock;
    use crate::colourfit::ClusterFit;
    use crate::palette::{unpack_565, PaletteMode};
    use crate::{Format, COLOUR_WEIGHTS_PERCEPTUAL, COLOUR_WEIGHTS_UNIFORM};

    fn grey_ramp(step: u8) -> ColourBlock {
        let mut rgba = [[0u8; 4]; 16];
        for (i, p) in rgba.iter_mut().enumerate() {
            let v = 40 + i as u8 * step;
            *p = [v, v, v, 255];
        }
        ColourBlock::new(rgba)
    }

    #[test]
    fn grey_endpoints_stay_grey() {
        for g in 0..64u8 {
            let packed = grey_565(g);
            assert_eq!((packed >> 5) & 0x3F, u16::from(g));
            let [r, green, b] = unpack_565(packed);
            assert_eq!(r, b);
            assert!((i32::from(r) - i32::from(green)).abs() <= 4, "{} {}", r, green);
        }
    }

    #[test]
    fn green_order_gives_palette_mode() {
        let set = ColourSet::new(&grey_ramp(9), Format::Bc1, false);
        let mut fit = GreenFit::new(&set, COLOUR_WEIGHTS_UNIFORM);

        assert_eq!(fit.compress4().unwrap().mode(), PaletteMode::FourColour);
        assert_eq!(fit.compress3().unwrap().mode(), PaletteMode::ThreeColour);
    }

    #[test]
    fn beats_or_matches_cluster_fit_on_grey() {
        for step in [1u8, 3, 6, 12] {
            let set = ColourSet::new(&grey_ramp(step), Format::Bc1, false);

            let green = GreenFit::new(&set, COLOUR_WEIGHTS_PERCEPTUAL)
                .compress4()
                .unwrap();
            let cluster = ClusterFit::new(&set, COLOUR_WEIGHTS_PERCEPTUAL, false)
                .compress4()
                .unwrap();

            let green = set.error(&green, true, &COLOUR_WEIGHTS_PERCEPTUAL);
            let cluster = set.error(&cluster, true, &COLOUR_WEIGHTS_PERCEPTUAL);
            // the cluster fit may pick non-grey endpoints, so allow a little slack
            assert!(green <= cluster * 1.25 + 16.0, "step {}: {} vs {}", step, green, cluster);
        }
    }
}
