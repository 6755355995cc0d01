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

use crate::math::f32_to_i32_clamped;

use super::{AlphaBlock, RampValues};

const MAX_ITERATIONS: usize = 8;

/// Share of `alpha0` in each code of the eight-level ramp
const RAMP_WEIGHTS: [f32; 8] = [
    1.0,
    0.0,
    6.0 / 7.0,
    5.0 / 7.0,
    4.0 / 7.0,
    3.0 / 7.0,
    2.0 / 7.0,
    1.0 / 7.0,
];

/// Widens `[min, max]` to span at least `steps` values
fn fix_range(min: u8, max: u8, steps: i32) -> (u8, u8) {
    let mut min = i32::from(min);
    let mut max = i32::from(max);
    if max - min < steps {
        max = (min + steps).min(i32::from(u8::MAX));
    }
    if max - min < steps {
        min = (max - steps).max(0);
    }
    (min as u8, max as u8)
}

/// Fits both ramp modes from the value range, then refines the eight-level
/// ramp by least squares until the indices settle.
pub fn compress(values: &RampValues) -> AlphaBlock {
    // get range for 5-alpha and 7-alpha interpolation
    let mut min5 = u8::MAX;
    let mut max5 = 0u8;
    let mut min7 = u8::MAX;
    let mut max7 = 0u8;

    for (value, _) in values.active() {
        min7 = min7.min(value);
        max7 = max7.max(value);

        // 0 and 255 have their own codes in the six-level ramp
        if value != 0 {
            min5 = min5.min(value);
        }
        if value != u8::MAX {
            max5 = max5.max(value);
        }
    }

    // handle the case that no valid range was found
    if min5 > max5 {
        min5 = max5;
    }
    if min7 > max7 {
        min7 = max7;
    }

    let (min5, max5) = fix_range(min5, max5, 5);
    let (min7, max7) = fix_range(min7, max7, 7);

    let (block5, error5) = values.fit_all(min5, max5);
    let (block7, error7) = refine(values, max7, min7);

    if error5 <= error7 {
        block5
    } else {
        block7
    }
}

fn refine(values: &RampValues, alpha0: u8, alpha1: u8) -> (AlphaBlock, f32) {
    let (mut best, mut best_error) = values.fit_all(alpha0, alpha1);

    for _ in 0..MAX_ITERATIONS {
        let (a, b) = match solve(values, &best.index_array()) {
            Some(endpoints) => endpoints,
            None => break,
        };

        let (alpha0, alpha1) = (a.max(b), a.min(b));
        if alpha0 == alpha1 || (alpha0, alpha1) == (best.alpha0, best.alpha1) {
            break;
        }

        let (block, error) = values.fit_all(alpha0, alpha1);
        if error >= best_error {
            break;
        }
        best = block;
        best_error = error;
    }

    (best, best_error)
}

/// Least-squares endpoints of the eight-level ramp for fixed indices
fn solve(values: &RampValues, indices: &[u8; 16]) -> Option<(u8, u8)> {
    let mut alpha2_sum = 0f32;
    let mut beta2_sum = 0f32;
    let mut alphabeta_sum = 0f32;
    let mut alphax_sum = 0f32;
    let mut betax_sum = 0f32;

    for i in 0..16 {
        let weight = values.weights[i];
        if weight <= 0.0 {
            continue;
        }

        let alpha = RAMP_WEIGHTS[indices[i] as usize];
        let beta = 1.0 - alpha;
        let x = f32::from(values.values[i]);

        alpha2_sum += weight * alpha * alpha;
        beta2_sum += weight * beta * beta;
        alphabeta_sum += weight * alpha * beta;
        alphax_sum += weight * alpha * x;
        betax_sum += weight * beta * x;
    }

    let denom = alpha2_sum * beta2_sum - alphabeta_sum * alphabeta_sum;
    if libm::fabsf(denom) <= f32::EPSILON {
        return None;
    }
    let factor = 1.0 / denom;

    let a = (alphax_sum * beta2_sum - betax_sum * alphabeta_sum) * factor;
    let b = (betax_sum * alpha2_sum - alphax_sum * alphabeta_sum) * factor;

    Some((
        f32_to_i32_clamped(a, 255) as u8,
        f32_to_i32_clamped(b, 255) as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ColourBlock;

    fn values(alpha: [u8; 16]) -> RampValues {
        let mut rgba = [[0u8; 4]; 16];
        for (p, a) in rgba.iter_mut().zip(alpha.iter()) {
            p[3] = *a;
        }
        RampValues::new(&ColourBlock::new(rgba), 3)
    }

    #[test]
    fn ranges_are_widened() {
        assert_eq!(fix_range(10, 12, 7), (10, 17));
        assert_eq!(fix_range(253, 255, 7), (248, 255));
        assert_eq!(fix_range(0, 200, 5), (0, 200));
    }

    #[test]
    fn eight_level_codebook_uses_full_range() {
        // alternating extremes only fit the eight-level ramp from its own range
        let mut alpha = [0u8; 16];
        for (i, a) in alpha.iter_mut().enumerate() {
            *a = 20 + (i as u8 % 8) * 30;
        }
        let values = values(alpha);
        let encoded = compress(&values);
        assert!(encoded.is_eight_level());
        assert!(values.error(&encoded) <= 16.0 * 16.0);
    }

    #[test]
    fn refinement_never_increases_error() {
        let alpha = [
            3, 17, 40, 41, 90, 92, 95, 130, 131, 170, 171, 180, 200, 220, 230, 250,
        ];
        let values = values(alpha);
        let (_, start) = values.fit_all(250, 3);
        let (block, refined) = refine(&values, 250, 3);
        assert!(refined <= start);
        assert_eq!(values.error(&block), refined);
    }

    #[test]
    fn solve_recovers_exact_ramp() {
        let indices = [0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7];
        let block = AlphaBlock::new(210, 0, &indices);
        let values = values(block.decode());
        assert_eq!(solve(&values, &indices), Some((210, 0)));
    }
}
