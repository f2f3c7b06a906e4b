#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal renderer
//!
//! The Mandelbrot and Julia sets are drawn by sampling a rectangle of
//! the complex plane on a grid of pixels and iterating `z = z² + c`
//! from each sample.  A pixel is colored by how many iterations its
//! orbit took to leave the circle of radius 2 around the origin; an
//! orbit that is still inside when the iteration cap is reached is
//! taken to be in the set and painted opaque black.
//!
//! The Mandelbrot set uses the sample as `c` and starts `z` at zero.
//! The Julia set fixes `c` for the whole image and starts `z` at the
//! sample instead, counting that starting point as the first
//! iteration.
//!
//! ```
//! use escapebrot::{render_mandelbrot, Grid, Palette, Viewport};
//!
//! let palette = Palette::spectral(256).unwrap();
//! let mut pixels = vec![0u32; 64 * 48];
//! render_mandelbrot(
//!     100,
//!     Grid(64, 48),
//!     Viewport::new(-2.5, -1.5, 4.0, 3.0),
//!     palette.as_slice(),
//!     &mut pixels,
//! )
//! .unwrap();
//! ```

pub mod error;
pub mod escape;
pub mod palette;
pub mod planes;
pub mod render;

pub use crate::error::{Error, Precondition, Result};
pub use crate::escape::EscapeTime;
pub use crate::palette::{colorize, Palette, SENTINEL};
pub use crate::planes::{Grid, Pixel, PlaneMapper, Viewport};
pub use crate::render::{render_julia, render_mandelbrot, Fractal, Progress, Renderer};
