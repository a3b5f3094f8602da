use std::fmt;

use ndarray::{Array3, ArrayView3, s};
use rand::Rng;

use crate::data::model::HyperCube;

// ---------------------------------------------------------------------------
// Mixing strategies
// ---------------------------------------------------------------------------

/// Which strategy produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixKind {
    /// Pixel-wise convex blend of two crops.
    MixUp,
    /// A box from the second crop pasted over the first.
    CutMix,
}

impl fmt::Display for MixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixKind::MixUp => write!(f, "mixup"),
            MixKind::CutMix => write!(f, "cutmix"),
        }
    }
}

/// Take a random `size`×`size` spatial window covering all bands.
///
/// The caller guarantees `size` fits inside the cube.
pub fn random_crop<'a, R: Rng>(cube: &'a HyperCube, size: usize, rng: &mut R) -> ArrayView3<'a, f64> {
    let top = rng.random_range(0..=cube.height() - size);
    let left = rng.random_range(0..=cube.width() - size);
    cube.data().slice(s![top..top + size, left..left + size, ..])
}

/// `lambda * a + (1 - lambda) * b`.
pub fn mixup(a: ArrayView3<f64>, b: ArrayView3<f64>, lambda: f64) -> Array3<f64> {
    let mut out = a.to_owned() * lambda;
    out.scaled_add(1.0 - lambda, &b);
    out
}

/// Spatial box replaced during CutMix, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutBox {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CutBox {
    pub fn area(&self) -> usize {
        (self.bottom - self.top) * (self.right - self.left)
    }
}

/// Box covering roughly `1 - lambda` of a `size`×`size` window, centred at a
/// random pixel and clipped to the window.
pub fn cut_box<R: Rng>(size: usize, lambda: f64, rng: &mut R) -> CutBox {
    let ratio = (1.0 - lambda).clamp(0.0, 1.0).sqrt();
    let half = ((size as f64 * ratio) as usize) / 2;
    let cy = rng.random_range(0..size);
    let cx = rng.random_range(0..size);
    CutBox {
        top: cy.saturating_sub(half),
        left: cx.saturating_sub(half),
        bottom: (cy + half).min(size),
        right: (cx + half).min(size),
    }
}

/// Paste a box of `b` into `a`. Returns the sample and the area-corrected
/// lambda (fraction of pixels still coming from `a`).
pub fn cutmix<R: Rng>(
    a: ArrayView3<f64>,
    b: ArrayView3<f64>,
    lambda: f64,
    rng: &mut R,
) -> (Array3<f64>, f64) {
    let size = a.dim().0;
    let bx = cut_box(size, lambda, rng);

    let mut out = a.to_owned();
    out.slice_mut(s![bx.top..bx.bottom, bx.left..bx.right, ..])
        .assign(&b.slice(s![bx.top..bx.bottom, bx.left..bx.right, ..]));

    let lambda = 1.0 - bx.area() as f64 / (size * size) as f64;
    (out, lambda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mixup_is_a_convex_blend() {
        let a = Array3::from_elem((2, 2, 3), 10.0);
        let b = Array3::from_elem((2, 2, 3), 20.0);
        let out = mixup(a.view(), b.view(), 0.25);
        assert!(out.iter().all(|&v| (v - 17.5).abs() < 1e-12));
    }

    #[test]
    fn cutmix_lambda_matches_pasted_area() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = Array3::zeros((16, 16, 2));
        let b = Array3::ones((16, 16, 2));
        let (out, lambda) = cutmix(a.view(), b.view(), 0.5, &mut rng);

        let pasted = out.iter().filter(|&&v| v == 1.0).count() as f64 / 2.0;
        assert!((lambda - (1.0 - pasted / 256.0)).abs() < 1e-12);
    }

    #[test]
    fn cut_box_stays_inside_window() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let lambda: f64 = rng.random();
            let bx = cut_box(32, lambda, &mut rng);
            assert!(bx.top <= bx.bottom && bx.bottom <= 32);
            assert!(bx.left <= bx.right && bx.right <= 32);
        }
    }

    #[test]
    fn crops_have_requested_size() {
        let cube = HyperCube::new("c", Array3::zeros((20, 9, 4))).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(random_crop(&cube, 9, &mut rng).dim(), (9, 9, 4));
        }
    }
}
