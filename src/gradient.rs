//! Shared numeric helpers for the descriptor engine: gamma-compressed
//! intensity planes, forward-difference gradients, gradient polar form, and
//! the separable box filter used for cell pooling.

use ndarray::Array2;

use crate::image::ImageAccess;

/// Guards the zero-gradient case in `atan2` so the orientation stays defined.
const ATAN_EPS: f64 = 1e-15;

/// Read an image into a square-root (gamma) compressed intensity plane.
///
/// The transform compresses dynamic range and reduces sensitivity to
/// illumination; pixel values are `u8` so non-negativity holds by
/// construction.
pub(crate) fn intensity_plane<I: ImageAccess>(image: &I) -> Array2<f64> {
    let (h, w) = (image.height() as usize, image.width() as usize);
    Array2::from_shape_fn((h, w), |(r, c)| {
        f64::from(image.get_pixel(c as i32, r as i32)).sqrt()
    })
}

/// Forward finite differences along columns (`gx`) and rows (`gy`).
///
/// The last column of `gx` and the last row of `gy` stay zero: no wraparound,
/// no reflection.
pub(crate) fn gradients(plane: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let (h, w) = plane.dim();
    let mut gx = Array2::zeros((h, w));
    let mut gy = Array2::zeros((h, w));

    for r in 0..h {
        for c in 0..w.saturating_sub(1) {
            gx[[r, c]] = plane[[r, c + 1]] - plane[[r, c]];
        }
    }
    for r in 0..h.saturating_sub(1) {
        for c in 0..w {
            gy[[r, c]] = plane[[r + 1, c]] - plane[[r, c]];
        }
    }

    (gx, gy)
}

/// Per-pixel gradient magnitude and orientation.
///
/// Orientation is `atan2(gy, gx + eps)` in degrees shifted by +180 so the
/// range is `[0, 360]`; the epsilon keeps the zero-gradient pixel defined.
pub(crate) fn magnitude_orientation(
    gx: &Array2<f64>,
    gy: &Array2<f64>,
) -> (Array2<f64>, Array2<f64>) {
    debug_assert_eq!(gx.dim(), gy.dim());
    let magnitude = Array2::from_shape_fn(gx.dim(), |idx| {
        (gx[idx] * gx[idx] + gy[idx] * gy[idx]).sqrt()
    });
    let orientation = Array2::from_shape_fn(gx.dim(), |idx| {
        gy[idx].atan2(gx[idx] + ATAN_EPS).to_degrees() + 180.0
    });
    (magnitude, orientation)
}

/// Reflect an index into `[0, len)` about the array edges, duplicating the
/// edge sample: -1 -> 0, -2 -> 1, len -> len - 1, ...
#[inline]
fn reflect(mut idx: isize, len: usize) -> usize {
    let n = len as isize;
    debug_assert!(n > 0);
    loop {
        if idx < 0 {
            idx = -idx - 1;
        } else if idx >= n {
            idx = 2 * n - idx - 1;
        } else {
            return idx as usize;
        }
    }
}

/// Uniform (box) average filter with window `size`, applied separably along
/// rows then columns with reflected edges.
///
/// The window for output index `i` spans `[i - size/2, i + size - 1 - size/2]`
/// (integer division), so odd windows are centered and even windows lean one
/// sample left.
pub(crate) fn box_filter(plane: &Array2<f64>, size: usize) -> Array2<f64> {
    debug_assert!(size > 0);
    if size == 1 {
        return plane.clone();
    }

    let (h, w) = plane.dim();
    let left = (size / 2) as isize;
    let inv = 1.0 / size as f64;

    // Along columns within each row.
    let mut horizontal = Array2::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            let mut acc = 0.0;
            for j in 0..size {
                let idx = c as isize - left + j as isize;
                acc += plane[[r, reflect(idx, w)]];
            }
            horizontal[[r, c]] = acc * inv;
        }
    }

    // Along rows within each column.
    let mut out = Array2::zeros((h, w));
    for c in 0..w {
        for r in 0..h {
            let mut acc = 0.0;
            for j in 0..size {
                let idx = r as isize - left + j as isize;
                acc += horizontal[[reflect(idx, h), c]];
            }
            out[[r, c]] = acc * inv;
        }
    }

    out
}
