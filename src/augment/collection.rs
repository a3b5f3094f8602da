use std::path::Path;

use anyhow::anyhow;
use ndarray::{Array4, ArrayView3, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};

use super::mixing::{self, MixKind};
use crate::data::model::HyperCube;
use crate::error::{PipelineError, Result};
use crate::render::{self, RenderOptions};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Construction parameters. Counts and size are signed so that invalid
/// values coming from the command line reach validation instead of being
/// rejected by the argument parser.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentSettings {
    /// Blending strength; both strategies draw lambda from Beta(alpha, alpha).
    pub alpha: f64,
    /// Spatial edge length of every sample.
    pub size: i64,
    pub mixup_images: i64,
    pub cutmix_images: i64,
    pub seed: u64,
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            size: 128,
            mixup_images: 15,
            cutmix_images: 15,
            seed: 0,
        }
    }
}

struct Validated {
    size: usize,
    mixup: usize,
    cutmix: usize,
}

impl AugmentSettings {
    fn validate(&self, cube: &HyperCube) -> Result<Validated> {
        let invalid = |msg: String| -> Result<Validated> { Err(PipelineError::Augmentation(msg)) };

        if self.mixup_images < 0 {
            return invalid(format!("mixup_images must be >= 0, got {}", self.mixup_images));
        }
        if self.cutmix_images < 0 {
            return invalid(format!("cutmix_images must be >= 0, got {}", self.cutmix_images));
        }
        if self.size <= 0 {
            return invalid(format!("size must be positive, got {}", self.size));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return invalid(format!("alpha must be a positive number, got {}", self.alpha));
        }

        if self.mixup_images.checked_add(self.cutmix_images).is_none() {
            return invalid(format!(
                "mixup_images + cutmix_images overflows ({} + {})",
                self.mixup_images, self.cutmix_images
            ));
        }

        // Checked even for an empty collection: the buffer shape still uses `size`.
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        if size > cube.height() || size > cube.width() {
            return invalid(format!(
                "size {size} does not fit inside a {}x{} cube",
                cube.height(),
                cube.width()
            ));
        }

        Ok(Validated {
            size,
            mixup: self.mixup_images as usize,
            cutmix: self.cutmix_images as usize,
        })
    }
}

// ---------------------------------------------------------------------------
// AugmentedCollection
// ---------------------------------------------------------------------------

/// How a single sample was produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleInfo {
    pub kind: MixKind,
    /// Fraction of the sample contributed by the first crop.
    pub lambda: f64,
}

/// Fixed-size, indexable set of augmented samples backed by one contiguous
/// buffer of shape (N, size, size, bands).
///
/// The length is fixed at construction; replacing the buffer keeps it.
#[derive(Debug)]
pub struct AugmentedCollection {
    images: Array4<f64>,
    infos: Vec<SampleInfo>,
}

impl AugmentedCollection {
    /// Generate `mixup_images` MixUp samples followed by `cutmix_images`
    /// CutMix samples. Identical cube and settings give identical samples.
    pub fn new(cube: &HyperCube, settings: &AugmentSettings) -> Result<Self> {
        let Validated { size, mixup, cutmix } = settings.validate(cube)?;
        let total = mixup + cutmix;

        let beta = Beta::new(settings.alpha, settings.alpha)
            .map_err(|e| PipelineError::Augmentation(format!("alpha {}: {e}", settings.alpha)))?;
        let mut rng = StdRng::seed_from_u64(settings.seed);

        let mut images = Array4::zeros((total, size, size, cube.bands()));
        let mut infos = Vec::with_capacity(total);

        for (i, mut slot) in images.outer_iter_mut().enumerate() {
            let kind = if i < mixup { MixKind::MixUp } else { MixKind::CutMix };
            let a = mixing::random_crop(cube, size, &mut rng);
            let b = mixing::random_crop(cube, size, &mut rng);
            let lambda = beta.sample(&mut rng);

            let (sample, lambda) = match kind {
                MixKind::MixUp => (mixing::mixup(a, b, lambda), lambda),
                MixKind::CutMix => mixing::cutmix(a, b, lambda, &mut rng),
            };
            slot.assign(&sample);
            log::debug!("Sample {i}: {kind}, lambda {lambda:.3}");
            infos.push(SampleInfo { kind, lambda });
        }

        log::debug!(
            "Generated {total} augmented samples ({mixup} mixup, {cutmix} cutmix) of {size}x{size} from {cube}"
        );
        Ok(AugmentedCollection { images, infos })
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Shape of one sample: (size, size, bands).
    pub fn sample_shape(&self) -> (usize, usize, usize) {
        let (_, h, w, b) = self.images.dim();
        (h, w, b)
    }

    #[cfg(test)]
    pub fn images(&self) -> &Array4<f64> {
        &self.images
    }

    /// Single-precision copy of the whole buffer.
    pub fn images_f32(&self) -> Array4<f32> {
        self.images.mapv(|v| v as f32)
    }

    pub fn sample(&self, index: usize) -> Result<ArrayView3<'_, f64>> {
        self.check_index(index)?;
        Ok(self.images.index_axis(Axis(0), index))
    }

    pub fn info(&self, index: usize) -> Result<SampleInfo> {
        self.check_index(index)?;
        Ok(self.infos[index])
    }

    /// Fully independent copy: no buffer is shared with `self`, so mutating
    /// the snapshot can never reach the original samples.
    pub fn snapshot(&self) -> Self {
        AugmentedCollection {
            images: self.images.to_owned(),
            infos: self.infos.clone(),
        }
    }

    /// Swap in a new buffer, position for position. The replacement must have
    /// exactly the current shape.
    pub fn with_images(self, images: Array4<f32>) -> Result<Self> {
        if images.dim() != self.images.dim() {
            return Err(PipelineError::Overlay(anyhow!(
                "overlay returned shape {:?}, expected {:?}",
                images.dim(),
                self.images.dim()
            )));
        }
        Ok(AugmentedCollection {
            images: images.mapv(f64::from),
            infos: self.infos,
        })
    }

    /// Render sample `index` to an image file at `path`.
    pub fn plot(&self, index: usize, path: &Path, options: &RenderOptions) -> Result<()> {
        let sample = self.sample(index)?;
        render::save_sample(sample, path, options).map_err(|e| PipelineError::io(path, e))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }
}
