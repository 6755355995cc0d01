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

use core::ops::RangeInclusive;

use crate::math::f32_to_i32_clamped;
use crate::palette::alpha_palette;

use super::{quick, AlphaBlock, RampValues};

/// Steps each endpoint may move away from a search centre
const WINDOW: i32 = 8;

fn window(centre: u8) -> RangeInclusive<u8> {
    let lo = (i32::from(centre) - WINDOW).max(0);
    let hi = (i32::from(centre) + WINDOW).min(i32::from(u8::MAX));
    lo as u8..=hi as u8
}

/// Low and high endpoints of `levels`-step ramps that put `min` and `max`
/// on levels, for every pair of levels. Most of these extrapolate past
/// `min` and `max`.
fn anchored(min: u8, max: u8, levels: i32) -> impl Iterator<Item = (u8, u8)> {
    let span = f32::from(max - min);
    let last = levels - 1;
    (0..last).flat_map(move |lo_level| {
        (lo_level + 1..=last).map(move |hi_level| {
            let step = span / (hi_level - lo_level) as f32;
            let lo = f32::from(min) - step * lo_level as f32;
            let hi = lo + step * last as f32;
            (
                f32_to_i32_clamped(lo, 255) as u8,
                f32_to_i32_clamped(hi, 255) as u8,
            )
        })
    })
}

/// Keeps the best ramp seen so far
struct Search<'a> {
    values: &'a RampValues,
    best: AlphaBlock,
    error: f32,
    indices: [u8; 16],
}

impl<'a> Search<'a> {
    fn try_pair(&mut self, alpha0: u8, alpha1: u8) {
        let codes = alpha_palette(alpha0, alpha1);
        if let Some(error) = self.values.fit(&codes, self.error, &mut self.indices) {
            self.best = AlphaBlock::new(alpha0, alpha1, &self.indices);
            self.error = error;
        }
    }

    /// Scores every pair around a centre. `eight_level` picks which
    /// endpoint order is admitted.
    fn around(&mut self, alpha0: u8, alpha1: u8, eight_level: bool) {
        for a0 in window(alpha0) {
            for a1 in window(alpha1) {
                if (a0 > a1) == eight_level {
                    self.try_pair(a0, a1);
                }
            }
        }
    }

    /// Finds the ramp with the lowest error among those that put two of the
    /// `distinct` values exactly on levels, regardless of the best so far.
    /// Returns its endpoints in block order.
    fn best_anchored(&self, distinct: &[u8], eight_level: bool) -> Option<(u8, u8)> {
        let levels = if eight_level { 8 } else { 6 };
        let mut indices = [0u8; 16];
        let mut best: Option<((u8, u8), f32)> = None;

        for (i, &min) in distinct.iter().enumerate() {
            for &max in &distinct[i + 1..] {
                for (lo, hi) in anchored(min, max, levels) {
                    let (alpha0, alpha1) = if eight_level { (hi, lo) } else { (lo, hi) };
                    if (alpha0 > alpha1) != eight_level {
                        continue;
                    }
                    let limit = best.map_or(f32::INFINITY, |(_, e)| e);
                    let codes = alpha_palette(alpha0, alpha1);
                    if let Some(error) = self.values.fit(&codes, limit, &mut indices) {
                        best = Some(((alpha0, alpha1), error));
                    }
                }
            }
        }
        best.map(|(endpoints, _)| endpoints)
    }
}

/// Active values without repeats, in ascending order
fn distinct(values: &RampValues) -> ([u8; 16], usize) {
    let mut distinct = [0u8; 16];
    let mut count = 0;
    for (value, _) in values.active() {
        if !distinct[..count].contains(&value) {
            distinct[count] = value;
            count += 1;
        }
    }
    distinct[..count].sort_unstable();
    (distinct, count)
}

/// Searches endpoint pairs in both ramp modes.
///
/// Ranges narrower than eight steps are encoded exactly by the eight-level
/// ramp between the extremes. Otherwise the search starts from the quick fit
/// and scans windows around the extremes and around the best ramp that puts
/// two of the values on levels, abandoning a pair as soon as its partial error
/// reaches the best so far.
pub fn compress(values: &RampValues) -> AlphaBlock {
    let (min, max) = match values.range() {
        Some(range) => range,
        None => return AlphaBlock::default(),
    };

    if max - min < 8 {
        return values.fit_all(max, min).0;
    }

    let best = quick::compress(values);
    let error = values.error(&best);
    let mut search = Search {
        values,
        best,
        error,
        indices: [0u8; 16],
    };

    let (sorted, count) = distinct(values);
    let distinct = &sorted[..count];

    // eight interpolated levels
    search.around(max, min, true);
    if let Some((alpha0, alpha1)) = search.best_anchored(distinct, true) {
        search.around(alpha0, alpha1, true);
    }

    // six interpolated levels between the values that 0 and 255 do not cover
    let (min5, max5) = values
        .active()
        .map(|(v, _)| v)
        .filter(|&v| v != 0 && v != u8::MAX)
        .fold((u8::MAX, 0u8), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (min5, max5) = if min5 > max5 { (min, max) } else { (min5, max5) };

    search.around(min5, max5, false);
    if let Some((alpha0, alpha1)) = search.best_anchored(distinct, false) {
        search.around(alpha0, alpha1, false);
    }

    search.best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ColourBlock;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn values(alpha: [u8; 16]) -> RampValues {
        let mut rgba = [[0u8; 4]; 16];
        for (p, a) in rgba.iter_mut().zip(alpha.iter()) {
            p[3] = *a;
        }
        RampValues::new(&ColourBlock::new(rgba), 3)
    }

    /// Scores every endpoint pair
    fn brute_force(values: &RampValues) -> f32 {
        let mut best = f32::INFINITY;
        let mut indices = [0u8; 16];
        for alpha0 in 0..=255u8 {
            for alpha1 in 0..=255u8 {
                if let Some(error) = values.fit(&alpha_palette(alpha0, alpha1), best, &mut indices) {
                    best = error;
                }
            }
        }
        best
    }

    #[test]
    fn windows_are_clamped() {
        assert_eq!(window(3), 0..=11);
        assert_eq!(window(250), 242..=255);
    }

    #[test]
    fn narrow_ranges_are_exact() {
        for spread in 1..8u8 {
            let mut alpha = [0u8; 16];
            for (i, a) in alpha.iter_mut().enumerate() {
                *a = 60 + (i as u8 % (spread + 1));
            }
            let values = values(alpha);
            assert_eq!(compress(&values).decode(), alpha);
        }
    }

    #[test]
    fn anchors_on_value_pairs() {
        let (sorted, count) = distinct(&values([
            90, 10, 90, 180, 10, 91, 10, 10, 90, 91, 180, 91, 180, 90, 91, 180,
        ]));
        assert_eq!(&sorted[..count], &[10, 90, 91, 180]);

        // 10 on the first level and 180 on the fifth of six
        assert!(anchored(10, 180, 6).any(|pair| pair == (10, 223)));
    }

    #[test]
    fn matches_brute_force() {
        let blocks = [
            [0, 12, 25, 37, 50, 62, 75, 87, 100, 112, 125, 137, 150, 162, 175, 187],
            // the best six-level ramp ends far past 180
            [10, 10, 10, 10, 90, 90, 90, 90, 91, 91, 91, 91, 180, 180, 180, 180],
            [0, 255, 100, 101, 102, 103, 104, 140, 141, 150, 0, 255, 0, 255, 120, 130],
        ];
        for alpha in blocks {
            let values = values(alpha);
            let found = values.error(&compress(&values));
            let reference = brute_force(&values);
            assert_eq!(found, reference, "{:?}", alpha);
        }
    }

    #[test]
    fn close_to_brute_force_on_clustered_values() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..8 {
            let clusters: [u8; 5] = rng.gen();
            let count = rng.gen_range(2..=clusters.len());
            let mut alpha = [0u8; 16];
            for a in alpha.iter_mut() {
                *a = clusters[rng.gen_range(0..count)];
            }

            let values = values(alpha);
            let found = values.error(&compress(&values));
            let reference = brute_force(&values);
            assert!(found <= reference * 1.25 + 32.0, "{:?}: {} vs {}", alpha, found, reference);
        }
    }
}
