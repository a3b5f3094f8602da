use std::path::PathBuf;

use clap::Parser;

use crate::augment::collection::AugmentSettings;
use crate::pipeline::{DEFAULT_EXPORT_COUNT, PipelineConfig};
use crate::render::{RenderMode, RenderOptions};

/// Generate and save augmented images from a hypercube.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct Args {
    /// Path to the hypercube file (.mat, .npz or .json).
    #[arg(long = "hypercube_path")]
    pub hypercube_path: PathBuf,

    /// The label of the hyperspectral cube inside the file.
    #[arg(long = "hyperspectral_label", default_value = "paviaU")]
    pub hyperspectral_label: String,

    /// Blending strength for both mixing strategies.
    #[arg(long = "alpha", default_value_t = 0.5)]
    pub alpha: f64,

    /// Spatial size of each sample.
    #[arg(long = "size", default_value_t = 128, allow_negative_numbers = true)]
    pub size: i64,

    /// Number of mixup samples.
    #[arg(long = "mixup_images", default_value_t = 15, allow_negative_numbers = true)]
    pub mixup_images: i64,

    /// Number of cutmix samples.
    #[arg(long = "cutmix_images", default_value_t = 15, allow_negative_numbers = true)]
    pub cutmix_images: i64,

    /// Directory to save rendered pairs to. Removed and recreated on every run.
    #[arg(long = "output_directory", default_value = "output_images")]
    pub output_directory: PathBuf,

    /// Striping configuration (JSON). Defaults are used if the file is missing.
    #[arg(long = "striping_configs")]
    pub striping_configs: Option<PathBuf>,

    /// Number of clean/striped pairs to render.
    #[arg(long = "export_count", default_value_t = DEFAULT_EXPORT_COUNT)]
    pub export_count: usize,

    /// Seed for the augmentation random generator.
    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,

    /// How each sample is drawn.
    #[arg(long = "render", value_enum, default_value_t = RenderMode::Rgb)]
    pub render: RenderMode,

    /// Bands shown as red, green and blue in rgb mode.
    #[arg(long = "rgb_bands", num_args = 3, value_names = ["R", "G", "B"])]
    pub rgb_bands: Option<Vec<usize>>,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        PipelineConfig {
            hypercube_path: args.hypercube_path,
            hyperspectral_label: args.hyperspectral_label,
            augment: AugmentSettings {
                alpha: args.alpha,
                size: args.size,
                mixup_images: args.mixup_images,
                cutmix_images: args.cutmix_images,
                seed: args.seed,
            },
            output_directory: args.output_directory,
            striping_configs: args.striping_configs,
            export_count: args.export_count,
            render: RenderOptions {
                mode: args.render,
                rgb_bands: args
                    .rgb_bands
                    .and_then(|bands| <[usize; 3]>::try_from(bands.as_slice()).ok()),
            },
        }
    }
}
