// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning iteration counts into colors.
//!
//! Colors are 32-bit values with the alpha channel in the high byte.
//! Palettes built here put red in the low byte, so the little-endian
//! bytes of a color read R, G, B, A.

use std::f64::consts::PI;

use crate::error::{Precondition, Result};

/// The color of a point that never escaped: opaque black.
pub const SENTINEL: u32 = 0xFF00_0000;

/// Colors an iteration count.  A count that reached the cap is in the
/// set and gets `SENTINEL`; anything else cycles through `palette`,
/// starting with the first entry for a count of 1.
///
/// Escape counts are at least 1; a count of 0 is colored like 1.
///
/// # Panics
///
/// If `palette` is empty.
#[inline]
pub fn colorize(count: usize, max: usize, palette: &[u32]) -> u32 {
    if count == max {
        SENTINEL
    } else {
        palette[count.saturating_sub(1) % palette.len()]
    }
}

/// An owned, never-empty palette.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<u32>,
}

impl Palette {
    /// Wraps a list of pre-formatted opaque colors.
    pub fn new(colors: Vec<u32>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Precondition::EmptyPalette.into());
        }
        Ok(Palette { colors })
    }

    /// A warm palette of `size` entries that rises from dark red
    /// through orange to a bright yellow-ish peak in the middle and
    /// falls back again, so that cycling through it has no seam.
    pub fn spectral(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Precondition::EmptyPalette.into());
        }
        let span = if size > 1 { (size - 1) as f64 } else { 1.0 };
        let colors = (0..size)
            .map(|i| {
                let p = ((i as f64) / span * PI).sin();
                let (r, g, b) = hsv_to_rgb(p / 5.0, 0.8, 0.5 + p / 2.0);
                pack(channel(r), channel(g), channel(b))
            })
            .collect();
        Ok(Palette { colors })
    }

    /// The colors, in order.
    pub fn as_slice(&self) -> &[u32] {
        &self.colors
    }

    /// Number of colors; never zero.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// See `colorize`.
    #[inline]
    pub fn colorize(&self, count: usize, max: usize) -> u32 {
        colorize(count, max, &self.colors)
    }
}

impl AsRef<[u32]> for Palette {
    fn as_ref(&self) -> &[u32] {
        &self.colors
    }
}

/// Opaque color with red in the low byte.
#[inline]
pub fn pack(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (u32::from(b) << 16) | (u32::from(g) << 8) | u32::from(r)
}

// Scales a unit channel to a byte, truncating.
fn channel(v: f64) -> u8 {
    (v * 255.0) as u8
}

/// HSV to RGB, all components in `[0, 1]`.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sextant = (h * 6.0).floor();
    let f = h * 6.0 - sextant;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sextant as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}
