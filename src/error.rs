// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Every way a render call can be refused.  The numerical kernel
//! itself cannot fail, so the only errors are arguments that break a
//! precondition, and those are always caught before the first pixel
//! is written.

use failure::Fail;

/// The precondition a caller violated.
#[derive(Clone, Debug, Fail, PartialEq)]
pub enum Precondition {
    /// The output grid has no columns.
    #[fail(display = "grid width must be positive")]
    ZeroGridWidth,
    /// The output grid has no rows.
    #[fail(display = "grid height must be positive")]
    ZeroGridHeight,
    /// `width * height` does not fit in a `usize`.
    #[fail(display = "grid of {}x{} pixels is too large", _0, _1)]
    GridTooLarge(usize, usize),
    /// The iteration cap is zero.
    #[fail(display = "iteration cap must be positive")]
    ZeroIterations,
    /// The palette has no colors to cycle through.
    #[fail(display = "palette must contain at least one color")]
    EmptyPalette,
    /// The output buffer is not exactly one slot per pixel.
    #[fail(display = "output buffer holds {} pixels, grid needs {}", actual, expected)]
    BufferLength {
        /// `grid.width * grid.height`
        expected: usize,
        /// The length the caller actually passed.
        actual: usize,
    },
    /// Viewport width or height is zero, negative, or not a number.
    #[fail(display = "viewport extent {}x{} must be positive and finite", _0, _1)]
    ViewportExtent(f64, f64),
    /// Viewport corner is not a finite point.
    #[fail(display = "viewport origin ({}, {}) must be finite", _0, _1)]
    ViewportOrigin(f64, f64),
    /// Julia constant is not a finite point.
    #[fail(display = "julia constant ({}, {}) must be finite", _0, _1)]
    JuliaConstant(f64, f64),
    /// A threaded render was asked to use no threads.
    #[fail(display = "thread count must be positive")]
    ZeroThreads,
}

/// The crate error.
#[derive(Clone, Debug, Fail, PartialEq)]
pub enum Error {
    /// An argument failed validation; nothing was rendered.
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(Precondition),
}

impl From<Precondition> for Error {
    fn from(precondition: Precondition) -> Self {
        Error::InvalidArgument(precondition)
    }
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
