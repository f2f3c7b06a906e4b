//! Contains the PlaneMapper struct, which describes a relationship
//! between a grid of pixels with its origin at the top-left corner
//! and a rectangle on the complex plane described by its lower-left
//! corner and its extent.
//!
//! Pixel rows run top to bottom while the imaginary axis runs bottom
//! to top, so row 0 samples the top edge of the viewport and the last
//! row samples just above its bottom edge.
use num::Complex;

use crate::error::{Precondition, Result};

/// Describes the width and height of the output raster.  The origin
/// is assumed to be at 0,0, so only the extent is stored.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Grid(pub usize, pub usize);

impl Grid {
    /// Number of columns.
    pub fn width(&self) -> usize {
        self.0
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.1
    }

    /// The number of pixels in the grid, or an error if either side
    /// is empty or the product overflows.
    pub fn len(&self) -> Result<usize> {
        if self.0 == 0 {
            return Err(Precondition::ZeroGridWidth.into());
        }
        if self.1 == 0 {
            return Err(Precondition::ZeroGridHeight.into());
        }
        self.0
            .checked_mul(self.1)
            .ok_or_else(|| Precondition::GridTooLarge(self.0, self.1).into())
    }
}

/// The rectangle of the complex plane being sampled: lower-left
/// corner `(x, y)` plus `width` and `height`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real part of the lower-left corner.
    pub x: f64,
    /// Imaginary part of the lower-left corner.
    pub y: f64,
    /// Extent along the real axis.
    pub width: f64,
    /// Extent along the imaginary axis.
    pub height: f64,
}

impl Viewport {
    /// Builds a viewport from its lower-left corner and extent.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }

    /// The lower-left corner as a complex number.
    pub fn origin(&self) -> Complex<f64> {
        Complex::new(self.x, self.y)
    }

    fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(Precondition::ViewportOrigin(self.x, self.y).into());
        }
        // Written so that NaN fails too.
        let positive = |v: f64| v > 0.0 && v.is_finite();
        if !positive(self.width) || !positive(self.height) {
            return Err(Precondition::ViewportExtent(self.width, self.height).into());
        }
        Ok(())
    }
}

/// Describes the column, row of a pixel in the grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of a `Grid` onto points of a `Viewport`.  The step
/// sizes are computed once here rather than once per pixel.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The raster being filled.
    pub grid: Grid,
    /// The region of the complex plane it samples.
    pub viewport: Viewport,
    // Width and height of one pixel in plane units.
    step: (f64, f64),
    // Imaginary part sampled by row 0.
    top: f64,
}

impl PlaneMapper {
    /// Constructor.  Fails if the grid is empty or the viewport is
    /// not a proper rectangle.
    pub fn new(grid: Grid, viewport: Viewport) -> Result<PlaneMapper> {
        grid.len()?;
        viewport.validate()?;
        Ok(PlaneMapper {
            grid,
            viewport,
            step: (
                viewport.width / (grid.width() as f64),
                viewport.height / (grid.height() as f64),
            ),
            top: viewport.y + viewport.height,
        })
    }

    /// The total number of pixels in the grid.
    pub fn len(&self) -> usize {
        self.grid.width() * self.grid.height()
    }

    /// Always false; an empty grid is rejected by `new`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real part sampled by every pixel in `column`.
    #[inline]
    pub fn column_to_re(&self, column: usize) -> f64 {
        self.viewport.x + (column as f64) * self.step.0
    }

    /// Imaginary part sampled by every pixel in `row`.
    #[inline]
    pub fn row_to_im(&self, row: usize) -> f64 {
        self.top - (row as f64) * self.step.1
    }

    /// Given a pixel on the grid, return the point of the complex
    /// plane it samples.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }

    /// Offset of a pixel in a row-major buffer.
    #[inline]
    pub fn pixel_to_offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.grid.width() + pixel.0
    }
}
