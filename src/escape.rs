// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iterator.  Both fractals iterate `z = z² + c`
//! until `|z|² < 4` fails or the iteration cap is reached; they only
//! differ in where `z` starts, what `c` is, and whether the starting
//! point itself counts as the first iteration.

use num::Complex;

/// The squared escape radius.  Comparing squared magnitudes saves a
/// square root per iteration.
pub const ESCAPE_NORM_SQR: f64 = 4.0;

/// One orbit to be tested for escape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscapeTime {
    /// Initial value of `z`.
    pub seed: Complex<f64>,
    /// The `c` added on every iteration.
    pub constant: Complex<f64>,
    /// The count the iteration counter starts at.
    pub start: usize,
}

impl EscapeTime {
    /// The Mandelbrot orbit of `point`: `z` starts at zero, `c` is the
    /// point itself, and the counter starts at 0 so that a point which
    /// is never iterated is distinguishable from one iterated once.
    #[inline]
    pub fn mandelbrot(point: Complex<f64>) -> Self {
        EscapeTime {
            seed: Complex::new(0.0, 0.0),
            constant: point,
            start: 0,
        }
    }

    /// The Julia orbit of `point` under constant `c`: `z` starts at
    /// the point, which counts as the first sample, so the counter
    /// starts at 1.
    #[inline]
    pub fn julia(point: Complex<f64>, c: Complex<f64>) -> Self {
        EscapeTime {
            seed: point,
            constant: c,
            start: 1,
        }
    }

    /// Iterate until escape or until the counter reaches `max`, and
    /// return the final counter.  The result lies in `start..=max`
    /// (or is `start` itself when `start >= max`).
    ///
    /// Non-finite values fail the `< 4` test and count as escaped, so
    /// the loop is bounded by `max` whatever the arithmetic does.
    #[inline]
    pub fn count(&self, max: usize) -> usize {
        let mut z = self.seed;
        let mut iteration = self.start;
        while z.norm_sqr() < ESCAPE_NORM_SQR && iteration < max {
            z = z * z + self.constant;
            iteration += 1;
        }
        iteration
    }
}
