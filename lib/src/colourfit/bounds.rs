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
use crate::math::quantise;

use super::{score_endpoints, ColourFitImpl};

/// Inclusive range of quantised values for one channel
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Span {
    lo: u16,
    hi: u16,
}

impl Span {
    fn len(&self) -> u64 {
        u64::from(self.hi - self.lo) + 1
    }
}

/// Exhaustive colour fit over a box of 5:6:5 endpoints around the colours of
/// the set.
///
/// The quantised bounding box is widened by its full range plus one step on
/// each side, which reaches endpoints that put the colours on the inner
/// levels of the ramp, then every endpoint pair in it is scored against the whole set.
pub struct BoxFit<'a> {
    colourset: &'a ColourSet,
    weights: [f32; 3],
    spans: [Span; 3],
}

impl<'a> BoxFit<'a> {
    /// Returns `None` if the box holds more than `budget` endpoint pairs.
    pub fn new(colourset: &'a ColourSet, weights: [f32; 3], budget: u32) -> Option<Self> {
        if colourset.count() == 0 {
            return None;
        }

        const BITS: [u32; 3] = [5, 6, 5];
        let mut spans = [Span { lo: 0, hi: 0 }; 3];
        for (channel, span) in spans.iter_mut().enumerate() {
            let (min, max) = (0..colourset.count())
                .map(|j| colourset.colour(j)[channel])
                .fold((u8::MAX, 0u8), |(min, max), v| (min.min(v), max.max(v)));

            let bits = BITS[channel];
            let limit = (1i32 << bits) - 1;
            let lo = i32::from(quantise(f32::from(min) / 255.0, bits));
            let hi = i32::from(quantise(f32::from(max) / 255.0, bits));
            let margin = hi - lo + 1;

            *span = Span {
                lo: (lo - margin).max(0) as u16,
                hi: (hi + margin).min(limit) as u16,
            };
        }

        let endpoints: u64 = spans.iter().map(Span::len).product();
        if endpoints * endpoints > u64::from(budget) {
            return None;
        }

        Some(BoxFit {
            colourset,
            weights,
            spans,
        })
    }

    fn endpoint_count(&self) -> u32 {
        self.spans.iter().map(Span::len).product::<u64>() as u32
    }

    /// The n-th 5:6:5 endpoint of the box
    fn endpoint(&self, n: u32) -> u16 {
        let [r, g, b] = self.spans;
        let n = u64::from(n);
        let blue = n % b.len();
        let green = (n / b.len()) % g.len();
        let red = n / (b.len() * g.len());

        ((r.lo + red as u16) << 11) | ((g.lo + green as u16) << 5) | (b.lo + blue as u16)
    }

    /// Tries every pair accepted by `admit`, keeping the lowest error
    fn search(&self, admit: impl Fn(u16, u16) -> bool) -> Option<(u16, u16, [u8; 16])> {
        let count = self.endpoint_count();
        let mut best: Option<(u16, u16, [u8; 16])> = None;
        let mut best_error = f32::INFINITY;
        let mut closest = [0u8; 16];

        for m in 0..count {
            let col0 = self.endpoint(m);
            for n in 0..count {
                let col1 = self.endpoint(n);
                if !admit(col0, col1) {
                    continue;
                }
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

impl<'a> ColourFitImpl<'a> for BoxFit<'a> {
    fn colourset(&self) -> &'a ColourSet {
        self.colourset
    }

    fn compress3(&mut self) -> Option<Bc1Block> {
        let (col0, col1, closest) = self.search(|col0, col1| col0 <= col1)?;

        let mut indices = [0u8; 16];
        self.colourset.remap_indices(&closest, &mut indices);
        Some(colourblock::write3_packed(col0, col1, &indices))
    }

    fn compress4(&mut self) -> Option<Bc1Block> {
        let (col0, col1, closest) = self.search(|col0, col1| col0 > col1)?;

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
    use crate::palette::colour_palette;
    use crate::{Format, COLOUR_WEIGHTS_UNIFORM};

    fn two_tone() -> ColourBlock {
        let mut rgba = [[200, 40, 16, 255]; 16];
        for p in rgba.iter_mut().skip(10) {
            *p = [180, 60, 30, 255];
        }
        ColourBlock::new(rgba)
    }

    #[test]
    fn box_is_widened_and_clamped() {
        let set = ColourSet::new(&ColourBlock::new([[0, 0, 0, 255]; 16]), Format::Bc1, false);
        let fit = BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, 1 << 16).unwrap();
        assert_eq!(fit.spans, [Span { lo: 0, hi: 1 }; 3]);
        assert_eq!(fit.endpoint_count(), 8);
        assert_eq!(fit.endpoint(7), (1 << 11) | (1 << 5) | 1);
    }

    #[test]
    fn budget_is_respected() {
        let set = ColourSet::new(&two_tone(), Format::Bc1, false);
        let fit = BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, u32::MAX).unwrap();
        let pairs = u64::from(fit.endpoint_count()).pow(2);

        assert!(BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, pairs as u32).is_some());
        assert!(BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, pairs as u32 - 1).is_none());

        // a full-range block never fits the default budget
        let mut rgba = [[0, 0, 0, 255]; 16];
        rgba[15] = [255, 255, 255, 255];
        let set = ColourSet::new(&ColourBlock::new(rgba), Format::Bc1, false);
        assert!(BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, 1 << 16).is_none());
    }

    #[test]
    fn reaches_endpoints_past_the_colours() {
        // two colours on the inner levels of a red ramp, so the exact
        // endpoints lie outside their bounding box
        let col0 = (26 << 11) | (32 << 5) | 10;
        let col1 = (17 << 11) | (32 << 5) | 10;
        let (palette, _) = colour_palette(col0, col1, true);
        let mut rgba = [palette[2]; 16];
        for p in rgba.iter_mut().skip(8) {
            *p = palette[3];
        }
        let set = ColourSet::new(&ColourBlock::new(rgba), Format::Bc1, false);

        let mut fit = BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, u32::MAX).unwrap();
        assert_eq!(fit.spans[0], Span { lo: 16, hi: 27 });

        let block = fit.compress4().unwrap();
        assert_eq!(set.error(&block, true, &COLOUR_WEIGHTS_UNIFORM), 0.0);
    }

    #[test]
    fn never_worse_than_cluster_endpoints_inside_the_box() {
        let set = ColourSet::new(&two_tone(), Format::Bc1, false);
        let mut fit = BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, u32::MAX).unwrap();
        let [r, g, b] = fit.spans;
        let exhaustive = fit.compress4().unwrap();
        let cluster = ClusterFit::new(&set, COLOUR_WEIGHTS_UNIFORM, true)
            .compress4()
            .unwrap();

        // pull the cluster endpoints into the box channel by channel
        let clamp = |c: u16| -> u16 {
            let red = (c >> 11).clamp(r.lo, r.hi);
            let green = ((c >> 5) & 0x3F).clamp(g.lo, g.hi);
            let blue = (c & 0x1F).clamp(b.lo, b.hi);
            (red << 11) | (green << 5) | blue
        };
        let (col0, col1) = (clamp(cluster.col0), clamp(cluster.col1));
        assert!(col0 > col1);
        let mut closest = [0u8; 16];
        let in_box = score_endpoints(
            &set,
            &COLOUR_WEIGHTS_UNIFORM,
            col0,
            col1,
            f32::INFINITY,
            &mut closest,
        )
        .unwrap();

        let exhaustive = set.error(&exhaustive, true, &COLOUR_WEIGHTS_UNIFORM);
        assert!(exhaustive <= in_box, "{} > {}", exhaustive, in_box);
    }

    #[test]
    fn three_colour_search_honours_punch_through() {
        let mut rgba = *two_tone().colours();
        rgba[3][3] = 0;
        let set = ColourSet::new(&ColourBlock::new(rgba), Format::Bc1, false);

        let block = BoxFit::new(&set, COLOUR_WEIGHTS_UNIFORM, 1 << 20)
            .unwrap()
            .compress3()
            .unwrap();
        assert!(block.col0 <= block.col1);
        assert_eq!(block.index_array()[3], 3);
        assert!(set.error(&block, true, &COLOUR_WEIGHTS_UNIFORM).is_finite());
    }
}
