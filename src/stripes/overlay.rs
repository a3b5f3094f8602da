use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewMut2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use super::config::{NoiseKind, Orientation, StripeSpec, StripingConfig};

// ---------------------------------------------------------------------------
// Overlay seam
// ---------------------------------------------------------------------------

/// Corrupts a (N, height, width, bands) buffer. Implementations must return
/// an array of the input's shape; the caller enforces it.
pub trait Overlay {
    fn apply(&self, images: Array4<f32>, config: &StripingConfig) -> Result<Array4<f32>>;
}

/// Per-line sensor striping, one pass per configuration entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorStripes;

impl Overlay for SensorStripes {
    fn apply(&self, mut images: Array4<f32>, config: &StripingConfig) -> Result<Array4<f32>> {
        for (name, spec) in config.entries() {
            apply_spec(&mut images, spec).with_context(|| format!("stripe entry '{name}'"))?;
            log::debug!("Applied stripe entry '{name}': {spec:?}");
        }
        Ok(images)
    }
}

fn apply_spec(images: &mut Array4<f32>, spec: &StripeSpec) -> Result<()> {
    let normal = Normal::new(0.0f32, spec.intensity).context("invalid stripe intensity")?;
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let period = spec.period.max(1);

    let bands = images.len_of(Axis(3));
    let selected: Vec<usize> = match &spec.bands {
        Some(list) => list.iter().copied().filter(|&b| b < bands).collect(),
        None => (0..bands).collect(),
    };

    for mut sample in images.outer_iter_mut() {
        for &band in &selected {
            let plane = sample.index_axis_mut(Axis(2), band);
            stripe_plane(plane, spec, period, &normal, &mut rng);
        }
    }
    Ok(())
}

/// Stripe one (height, width) band plane in place.
fn stripe_plane(
    mut plane: ArrayViewMut2<f32>,
    spec: &StripeSpec,
    period: usize,
    normal: &Normal<f32>,
    rng: &mut StdRng,
) {
    let mean = plane.mean().unwrap_or(0.0);
    let line_axis = match spec.orientation {
        Orientation::Vertical => Axis(1),
        Orientation::Horizontal => Axis(0),
    };

    for (j, mut line) in plane.axis_iter_mut(line_axis).enumerate() {
        if j % period != 0 {
            continue;
        }
        let n = normal.sample(rng);
        match spec.noise {
            NoiseKind::Multiplicative => line.mapv_inplace(|v| v * (1.0 + n)),
            NoiseKind::Additive => line.mapv_inplace(|v| v + n * mean),
        }
    }
}
