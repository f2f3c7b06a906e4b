// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frame driver.  Walks every pixel of the grid, top row first and
//! left to right within a row, runs the escape-time iterator on the
//! point the pixel samples, and writes the resulting color into the
//! caller's buffer.
//!
//! Each pixel reads only the immutable render parameters and writes
//! one slot, so rows can be handed out to worker threads in bands
//! without any locking.

use std::sync::atomic::{AtomicBool, Ordering};

use itertools::iproduct;
use log::{debug, info, trace};
use num::Complex;

use crate::error::{Precondition, Result};
use crate::escape::EscapeTime;
use crate::palette::colorize;
use crate::planes::{Grid, Pixel, PlaneMapper, Viewport};

/// Which escape-time fractal to draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Fractal {
    /// Each pixel's point is the additive constant; `z` starts at 0.
    Mandelbrot,
    /// Each pixel's point is the starting `z`; the constant is fixed.
    Julia(Complex<f64>),
}

impl Fractal {
    /// The orbit a given plane point follows under this fractal.
    #[inline]
    pub fn orbit(&self, point: Complex<f64>) -> EscapeTime {
        match *self {
            Fractal::Mandelbrot => EscapeTime::mandelbrot(point),
            Fractal::Julia(c) => EscapeTime::julia(point, c),
        }
    }
}

/// How far a cancellable render got.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Progress {
    /// Every slot of the buffer was written.
    Complete,
    /// Stopped before row `rows`; rows `0..rows` are fully written and
    /// the rest of the buffer is untouched.
    Cancelled {
        /// Number of rows written, counted from the top.
        rows: usize,
    },
}

/// The parameters of a render, validated once.  Once built, this
/// object is immutable and may be shared between threads.
#[derive(Copy, Clone, Debug)]
pub struct Renderer {
    fractal: Fractal,
    plane: PlaneMapper,
    limit: usize,
}

impl Renderer {
    /// Requires the fractal, the size of the output grid, the region
    /// of the complex plane to sample, and the iteration cap.
    pub fn new(fractal: Fractal, grid: Grid, viewport: Viewport, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Precondition::ZeroIterations.into());
        }
        if let Fractal::Julia(c) = fractal {
            if !c.re.is_finite() || !c.im.is_finite() {
                return Err(Precondition::JuliaConstant(c.re, c.im).into());
            }
        }
        let plane = PlaneMapper::new(grid, viewport)?;
        Ok(Renderer {
            fractal,
            plane,
            limit,
        })
    }

    /// The fractal being drawn.
    pub fn fractal(&self) -> Fractal {
        self.fractal
    }

    /// The pixel-to-plane mapping.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The iteration cap.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The escape count of a single pixel.  A pixel is in the set
    /// exactly when this equals `limit()`.
    #[inline]
    pub fn escape_count(&self, pixel: &Pixel) -> usize {
        self.fractal
            .orbit(self.plane.pixel_to_point(pixel))
            .count(self.limit)
    }

    /// Escape counts of the whole grid, row-major, top row first.
    pub fn escape_counts(&self) -> Vec<usize> {
        iproduct!(0..self.plane.grid.height(), 0..self.plane.grid.width())
            .map(|(row, column)| self.escape_count(&Pixel(column, row)))
            .collect()
    }

    fn check(&self, palette: &[u32], buffer: &[u32]) -> Result<()> {
        if palette.is_empty() {
            return Err(Precondition::EmptyPalette.into());
        }
        if buffer.len() != self.plane.len() {
            return Err(Precondition::BufferLength {
                expected: self.plane.len(),
                actual: buffer.len(),
            }
            .into());
        }
        Ok(())
    }

    // Fills one row; `line` is exactly one grid width long.
    #[inline]
    fn render_row(&self, row: usize, palette: &[u32], line: &mut [u32]) {
        let im = self.plane.row_to_im(row);
        for (column, slot) in line.iter_mut().enumerate() {
            let point = Complex::new(self.plane.column_to_re(column), im);
            let count = self.fractal.orbit(point).count(self.limit);
            *slot = colorize(count, self.limit, palette);
        }
    }

    // Fills consecutive rows starting at `first_row`.
    fn render_rows(&self, first_row: usize, palette: &[u32], rows: &mut [u32]) {
        for (i, line) in rows.chunks_mut(self.plane.grid.width()).enumerate() {
            self.render_row(first_row + i, palette, line);
        }
    }

    /// The main function for single-threaded renders.  Writes every
    /// slot of `buffer` exactly once.
    pub fn render(&self, palette: &[u32], buffer: &mut [u32]) -> Result<()> {
        self.check(palette, buffer)?;
        debug!(
            "rendering {:?} on {}x{} pixels, limit {}",
            self.fractal,
            self.plane.grid.width(),
            self.plane.grid.height(),
            self.limit
        );
        self.render_rows(0, palette, buffer);
        Ok(())
    }

    /// As `render`, but checks `cancel` before starting each row and
    /// stops as soon as it is set.
    pub fn render_until(
        &self,
        palette: &[u32],
        buffer: &mut [u32],
        cancel: &AtomicBool,
    ) -> Result<Progress> {
        self.render_while(palette, buffer, |_| !cancel.load(Ordering::Relaxed))
    }

    // Renders rows while `proceed(row)` holds, asking once per row.
    fn render_while<F>(&self, palette: &[u32], buffer: &mut [u32], mut proceed: F) -> Result<Progress>
    where
        F: FnMut(usize) -> bool,
    {
        self.check(palette, buffer)?;
        debug!(
            "rendering {:?} on {}x{} pixels, limit {}, cancellable",
            self.fractal,
            self.plane.grid.width(),
            self.plane.grid.height(),
            self.limit
        );
        for (row, line) in buffer.chunks_mut(self.plane.grid.width()).enumerate() {
            if !proceed(row) {
                info!("render cancelled after {} rows", row);
                return Ok(Progress::Cancelled { rows: row });
            }
            self.render_row(row, palette, line);
        }
        Ok(Progress::Complete)
    }

    /// A multi-threaded version of `render`.  The buffer is split into
    /// at most `threads` bands of whole rows, one scoped thread per
    /// band.  The output is identical to `render`.
    pub fn render_threaded(&self, palette: &[u32], buffer: &mut [u32], threads: usize) -> Result<()> {
        if threads == 0 {
            return Err(Precondition::ZeroThreads.into());
        }
        self.check(palette, buffer)?;
        let height = self.plane.grid.height();
        // Ceiling division; `height >= 1` was checked above.
        let band_rows = (height - 1) / threads + 1;
        debug!(
            "rendering {:?} on {}x{} pixels, limit {}, {} rows per band",
            self.fractal,
            self.plane.grid.width(),
            height,
            self.limit,
            band_rows
        );
        let outcome = crossbeam::scope(|spawner| {
            for (band, rows) in buffer
                .chunks_mut(band_rows * self.plane.grid.width())
                .enumerate()
            {
                spawner.spawn(move |_| {
                    let first_row = band * band_rows;
                    trace!("band {} starts at row {}", band, first_row);
                    self.render_rows(first_row, palette, rows);
                });
            }
        });
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
        Ok(())
    }
}

/// Renders the Mandelbrot set.  `buffer` must hold exactly one slot
/// per pixel of `grid`; nothing is written unless every argument is
/// valid.
pub fn render_mandelbrot(
    limit: usize,
    grid: Grid,
    viewport: Viewport,
    palette: &[u32],
    buffer: &mut [u32],
) -> Result<()> {
    Renderer::new(Fractal::Mandelbrot, grid, viewport, limit)?.render(palette, buffer)
}

/// Renders the Julia set of `constant`.  Same contract as
/// `render_mandelbrot`.
pub fn render_julia(
    limit: usize,
    grid: Grid,
    viewport: Viewport,
    constant: Complex<f64>,
    palette: &[u32],
    buffer: &mut [u32],
) -> Result<()> {
    Renderer::new(Fractal::Julia(constant), grid, viewport, limit)?.render(palette, buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::palette::{Palette, SENTINEL};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const UNWRITTEN: u32 = 0x0BAD_F00D;

    fn full_view() -> Viewport {
        Viewport::new(-2.0, -2.0, 4.0, 4.0)
    }

    #[test]
    fn scenario_mandelbrot_corner_pixel() {
        let mut buffer = vec![UNWRITTEN; 4];
        render_mandelbrot(50, Grid(2, 2), full_view(), &[0xFF01_0203], &mut buffer).unwrap();
        assert_eq!(buffer[0], 0xFF01_0203);
        // Pixel (1, 1) samples the origin.
        assert_eq!(buffer[3], SENTINEL);
    }

    #[test]
    fn scenario_julia_unit_circle_cycle() {
        let mut buffer = vec![UNWRITTEN; 1];
        render_julia(
            10,
            Grid(1, 1),
            Viewport::new(0.0, 0.0, 1.0, 1.0),
            Complex::new(0.0, 0.0),
            &[0xFF01_0203],
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer, vec![SENTINEL]);
    }

    #[test]
    fn origin_is_always_bounded() {
        for &limit in &[1, 7, 100, 1000] {
            let renderer = Renderer::new(Fractal::Mandelbrot, Grid(2, 2), full_view(), limit).unwrap();
            assert_eq!(renderer.escape_count(&Pixel(1, 1)), limit);
        }
    }

    #[test]
    fn distant_viewport_escapes_immediately() {
        let palette = [0xFF11_2233, 0xFF44_5566];
        let viewport = Viewport::new(100.0, 0.0, 1.0, 1.0);
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(8, 6), viewport, 64).unwrap();
        assert!(renderer.escape_counts().iter().all(|&c| c == 1));
        let mut buffer = vec![UNWRITTEN; 48];
        renderer.render(&palette, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&c| c == palette[0]));
    }

    #[test]
    fn every_slot_is_written() {
        // No palette entry and not the sentinel, so any survivor shows.
        let palette = Palette::spectral(16).unwrap();
        assert!(!palette.as_slice().contains(&UNWRITTEN));
        for fractal in &[Fractal::Mandelbrot, Fractal::Julia(Complex::new(-0.34, 0.6175))] {
            let renderer = Renderer::new(*fractal, Grid(37, 23), full_view(), 40).unwrap();
            let mut buffer = vec![UNWRITTEN; 37 * 23];
            renderer.render(palette.as_slice(), &mut buffer).unwrap();
            assert!(buffer.iter().all(|&c| c != UNWRITTEN));
        }
    }

    #[test]
    fn colors_follow_counts() {
        let palette = Palette::spectral(5).unwrap();
        let renderer = Renderer::new(
            Fractal::Julia(Complex::new(-0.8, 0.156)),
            Grid(19, 11),
            Viewport::new(-1.6, -1.0, 3.2, 2.0),
            30,
        )
        .unwrap();
        let mut buffer = vec![0; 19 * 11];
        renderer.render(palette.as_slice(), &mut buffer).unwrap();
        let counts = renderer.escape_counts();
        for (color, &count) in buffer.iter().zip(counts.iter()) {
            assert_eq!(*color, palette.colorize(count, 30));
        }
    }

    #[test]
    fn classification_does_not_depend_on_palette_colors() {
        // Palette indistinguishable from the sentinel: bounded and
        // escaped pixels share a color, but the counts still differ.
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(16, 16), full_view(), 25).unwrap();
        let mut buffer = vec![UNWRITTEN; 256];
        renderer.render(&[SENTINEL], &mut buffer).unwrap();
        assert!(buffer.iter().all(|&c| c == SENTINEL));
        let counts = renderer.escape_counts();
        let bounded = counts.iter().filter(|&&c| c == 25).count();
        assert!(bounded > 0);
        assert!(bounded < counts.len());
        assert_eq!(counts[0], 1);
    }

    #[test]
    fn renders_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let palette = Palette::spectral(64).unwrap();
        for _ in 0..8 {
            let viewport = Viewport::new(
                rng.gen_range(-2.5, 0.5),
                rng.gen_range(-1.5, 0.5),
                rng.gen_range(0.01, 3.0),
                rng.gen_range(0.01, 3.0),
            );
            let fractal = if rng.gen() {
                Fractal::Mandelbrot
            } else {
                Fractal::Julia(Complex::new(rng.gen_range(-1.0, 1.0), rng.gen_range(-1.0, 1.0)))
            };
            let renderer = Renderer::new(fractal, Grid(21, 13), viewport, 80).unwrap();
            let mut first = vec![0; 21 * 13];
            let mut second = vec![UNWRITTEN; 21 * 13];
            renderer.render(palette.as_slice(), &mut first).unwrap();
            renderer.render(palette.as_slice(), &mut second).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn threaded_matches_single_threaded() {
        let palette = Palette::spectral(32).unwrap();
        for fractal in &[Fractal::Mandelbrot, Fractal::Julia(Complex::new(0.285, 0.01))] {
            let renderer = Renderer::new(*fractal, Grid(31, 17), full_view(), 60).unwrap();
            let mut expected = vec![0; 31 * 17];
            renderer.render(palette.as_slice(), &mut expected).unwrap();
            // Includes more threads than rows.
            for &threads in &[1, 2, 3, 4, 16, 17, 40] {
                let mut buffer = vec![UNWRITTEN; 31 * 17];
                renderer
                    .render_threaded(palette.as_slice(), &mut buffer, threads)
                    .unwrap();
                assert_eq!(buffer, expected, "{} threads", threads);
            }
        }
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(4, 4), full_view(), 10).unwrap();
        let mut buffer = vec![UNWRITTEN; 16];
        let cancel = AtomicBool::new(true);
        let progress = renderer.render_until(&[1], &mut buffer, &cancel).unwrap();
        assert_eq!(progress, Progress::Cancelled { rows: 0 });
        assert!(buffer.iter().all(|&c| c == UNWRITTEN));
    }

    #[test]
    fn cancelled_mid_render_keeps_finished_rows() {
        let palette = Palette::spectral(8).unwrap();
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(9, 7), full_view(), 20).unwrap();
        let mut expected = vec![0; 63];
        renderer.render(palette.as_slice(), &mut expected).unwrap();
        let mut buffer = vec![UNWRITTEN; 63];
        let progress = renderer
            .render_while(palette.as_slice(), &mut buffer, |row| row < 3)
            .unwrap();
        assert_eq!(progress, Progress::Cancelled { rows: 3 });
        assert_eq!(&buffer[..27], &expected[..27]);
        assert!(buffer[27..].iter().all(|&c| c == UNWRITTEN));
    }

    #[test]
    fn render_until_stops_once_the_flag_is_raised() {
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(5, 6), full_view(), 20).unwrap();
        let mut expected = vec![0; 30];
        renderer.render(&[7, 8], &mut expected).unwrap();
        let cancel = AtomicBool::new(false);
        let mut buffer = vec![UNWRITTEN; 30];
        // Raise the flag on reaching row 2, as a watcher thread would.
        let progress = renderer
            .render_while(&[7, 8], &mut buffer, |row| {
                if row == 2 {
                    cancel.store(true, Ordering::Relaxed);
                }
                !cancel.load(Ordering::Relaxed)
            })
            .unwrap();
        assert_eq!(progress, Progress::Cancelled { rows: 2 });
        assert_eq!(&buffer[..10], &expected[..10]);
        assert!(buffer[10..].iter().all(|&c| c == UNWRITTEN));
    }

    #[test]
    fn uncancelled_render_until_matches_render() {
        let palette = Palette::spectral(8).unwrap();
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(9, 7), full_view(), 20).unwrap();
        let mut expected = vec![0; 63];
        renderer.render(palette.as_slice(), &mut expected).unwrap();
        let mut buffer = vec![UNWRITTEN; 63];
        let progress = renderer
            .render_until(palette.as_slice(), &mut buffer, &AtomicBool::new(false))
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn rejects_invalid_arguments_before_writing() {
        let vp = full_view();
        let mut buffer = vec![UNWRITTEN; 4];
        let cases: Vec<(Result<()>, Precondition)> = vec![
            (
                render_mandelbrot(0, Grid(2, 2), vp, &[1], &mut buffer),
                Precondition::ZeroIterations,
            ),
            (
                render_mandelbrot(10, Grid(0, 2), vp, &[1], &mut buffer),
                Precondition::ZeroGridWidth,
            ),
            (
                render_mandelbrot(10, Grid(2, 0), vp, &[1], &mut buffer),
                Precondition::ZeroGridHeight,
            ),
            (
                render_mandelbrot(10, Grid(2, 2), vp, &[], &mut buffer),
                Precondition::EmptyPalette,
            ),
            (
                render_mandelbrot(10, Grid(3, 2), vp, &[1], &mut buffer),
                Precondition::BufferLength {
                    expected: 6,
                    actual: 4,
                },
            ),
            (
                render_julia(
                    10,
                    Grid(2, 2),
                    vp,
                    Complex::new(std::f64::NAN, 0.0),
                    &[1],
                    &mut buffer,
                ),
                Precondition::JuliaConstant(std::f64::NAN, 0.0),
            ),
        ];
        for (result, precondition) in cases {
            match (result, precondition) {
                // NaN never compares equal, so match on the shape.
                (
                    Err(Error::InvalidArgument(Precondition::JuliaConstant(re, _))),
                    Precondition::JuliaConstant(..),
                ) => assert!(re.is_nan()),
                (Err(Error::InvalidArgument(got)), want) => assert_eq!(got, want),
                (Ok(()), want) => panic!("accepted invalid argument, expected {:?}", want),
            }
        }
        assert!(buffer.iter().all(|&c| c == UNWRITTEN));
    }

    #[test]
    fn huge_thread_counts_use_one_row_per_band() {
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(4, 4), full_view(), 10).unwrap();
        let mut expected = vec![0; 16];
        renderer.render(&[1], &mut expected).unwrap();
        let mut buffer = vec![UNWRITTEN; 16];
        renderer
            .render_threaded(&[1], &mut buffer, usize::max_value())
            .unwrap();
        assert_eq!(buffer, expected);
    }

    #[test]
    fn threaded_rejects_zero_threads() {
        let renderer = Renderer::new(Fractal::Mandelbrot, Grid(2, 2), full_view(), 10).unwrap();
        let mut buffer = vec![UNWRITTEN; 4];
        assert_eq!(
            renderer.render_threaded(&[1], &mut buffer, 0).unwrap_err(),
            Error::InvalidArgument(Precondition::ZeroThreads)
        );
        assert_eq!(
            renderer.render_threaded(&[1], &mut buffer[..3], 2).unwrap_err(),
            Error::InvalidArgument(Precondition::BufferLength {
                expected: 4,
                actual: 3
            })
        );
        assert!(buffer.iter().all(|&c| c == UNWRITTEN));
    }
}
