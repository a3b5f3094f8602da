use std::fmt;

use anyhow::{Result, bail};
use ndarray::Array3;

// ---------------------------------------------------------------------------
// HyperCube – one labelled cube from a multi-object source file
// ---------------------------------------------------------------------------

/// A hyperspectral cube laid out as (height, width, bands).
///
/// Immutable once loaded; the augmentation stage only ever reads from it.
#[derive(Debug, Clone)]
pub struct HyperCube {
    /// Name of the object the cube was read from (e.g. `paviaU`).
    label: String,
    data: Array3<f64>,
}

impl HyperCube {
    /// Wrap a loaded array. Rejects cubes with an empty extent.
    pub fn new(label: impl Into<String>, data: Array3<f64>) -> Result<Self> {
        let (h, w, b) = data.dim();
        if h == 0 || w == 0 || b == 0 {
            bail!("cube has an empty extent: {h}x{w}x{b}");
        }
        Ok(HyperCube {
            label: label.into(),
            data: data.as_standard_layout().into_owned(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Number of spectral bands.
    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }
}

impl fmt::Display for HyperCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, w, b) = self.shape();
        write!(f, "{} ({h}x{w}, {b} bands)", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_extent() {
        assert!(HyperCube::new("empty", Array3::zeros((4, 0, 3))).is_err());
    }

    #[test]
    fn reports_dimensions() {
        let cube = HyperCube::new("paviaU", Array3::zeros((6, 5, 4))).unwrap();
        assert_eq!(cube.shape(), (6, 5, 4));
        assert_eq!(cube.bands(), 4);
        assert_eq!(cube.to_string(), "paviaU (6x5, 4 bands)");
    }

    #[test]
    fn normalizes_memory_layout() {
        use ndarray::ShapeBuilder;

        let fortran = Array3::from_shape_vec((2, 2, 2).f(), (0..8).map(f64::from).collect()).unwrap();
        let expected = fortran.clone();
        let cube = HyperCube::new("f", fortran).unwrap();
        assert!(cube.data().is_standard_layout());
        assert_eq!(cube.data(), &expected);
    }
}
