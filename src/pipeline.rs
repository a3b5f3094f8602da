use std::path::PathBuf;

use anyhow::anyhow;

use crate::augment::collection::{AugmentSettings, AugmentedCollection};
use crate::data::loader::load_cube;
use crate::error::{PipelineError, Result};
use crate::output::OutputDir;
use crate::render::RenderOptions;
use crate::stripes::{self, Overlay, SensorStripes, StripingConfig};

/// Pairs exported when nothing else is asked for.
pub const DEFAULT_EXPORT_COUNT: usize = 2;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a run needs, independent of how it was parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub hypercube_path: PathBuf,
    /// Object name inside the cube file.
    pub hyperspectral_label: String,
    pub augment: AugmentSettings,
    /// Destroyed and recreated on every run.
    pub output_directory: PathBuf,
    pub striping_configs: Option<PathBuf>,
    /// Number of clean/striped pairs rendered, starting at index 0.
    pub export_count: usize,
    pub render: RenderOptions,
}

impl PipelineConfig {
    pub fn new(hypercube_path: impl Into<PathBuf>) -> Self {
        Self {
            hypercube_path: hypercube_path.into(),
            hyperspectral_label: "paviaU".to_string(),
            augment: AugmentSettings::default(),
            output_directory: PathBuf::from("output_images"),
            striping_configs: None,
            export_count: DEFAULT_EXPORT_COUNT,
            render: RenderOptions::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Linear progression of a run. Any fatal error ends it at the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Loaded,
    Augmented,
    Copied,
    ConfigResolved,
    Striped,
    DirectoryReset,
    Exported,
    Done,
}

#[derive(Debug)]
pub struct RunSummary {
    pub clean_len: usize,
    pub striped_len: usize,
    pub output_directory: PathBuf,
    /// Files in the order they were written.
    pub written: Vec<PathBuf>,
    /// Every stage the run passed through, `Init` to `Done`.
    pub stages: Vec<Stage>,
}

/// Run the pipeline with the built-in sensor striping.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    run_with_overlay(config, &SensorStripes)
}

pub fn run_with_overlay(config: &PipelineConfig, overlay: &dyn Overlay) -> Result<RunSummary> {
    let mut stages = vec![Stage::Init];
    let result = run_stages(config, overlay, &mut stages);
    if let (Err(_), Some(stage)) = (&result, stages.last()) {
        log::error!("Run aborted after stage {stage:?}");
    }
    result
}

fn run_stages(
    config: &PipelineConfig,
    overlay: &dyn Overlay,
    stages: &mut Vec<Stage>,
) -> Result<RunSummary> {
    let cube = load_cube(&config.hypercube_path, &config.hyperspectral_label)?;
    config
        .render
        .check_bands(cube.bands())
        .map_err(PipelineError::Render)?;
    advance(stages, Stage::Loaded);

    let clean = AugmentedCollection::new(&cube, &config.augment)?;
    advance(stages, Stage::Augmented);

    let basis = clean.snapshot();
    advance(stages, Stage::Copied);

    let striping = stripes::resolve(config.striping_configs.as_deref())?;
    advance(stages, Stage::ConfigResolved);

    let striped = stripe_collection(basis, &striping, overlay)?;
    advance(stages, Stage::Striped);
    log::debug!(
        "Striped {} samples of shape {:?}",
        striped.len(),
        striped.sample_shape()
    );

    let out = OutputDir::reset(&config.output_directory)?;
    advance(stages, Stage::DirectoryReset);

    if clean.is_empty() && config.export_count > 0 {
        log::warn!("Augmented collection is empty, nothing can be exported");
    }

    let written = export_pairs(&clean, &striped, &out, config.export_count, &config.render)?;
    advance(stages, Stage::Exported);
    advance(stages, Stage::Done);

    Ok(RunSummary {
        clean_len: clean.len(),
        striped_len: striped.len(),
        output_directory: out.path().to_path_buf(),
        written,
        stages: std::mem::take(stages),
    })
}

fn advance(stages: &mut Vec<Stage>, next: Stage) {
    if let Some(current) = stages.last() {
        log::debug!("{current:?} -> {next:?}");
    }
    stages.push(next);
}

/// Run `basis` through the overlay and swap the result in as its buffer.
fn stripe_collection(
    basis: AugmentedCollection,
    config: &StripingConfig,
    overlay: &dyn Overlay,
) -> Result<AugmentedCollection> {
    let corrupted = overlay
        .apply(basis.images_f32(), config)
        .map_err(PipelineError::Overlay)?;
    basis.with_images(corrupted)
}

/// Render pairs `{n}.png` / `{n}s.png` for n in 1..=count from indices
/// n - 1 of the clean and striped collections.
pub fn export_pairs(
    clean: &AugmentedCollection,
    striped: &AugmentedCollection,
    out: &OutputDir,
    count: usize,
    render: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    if !out.is_empty()? {
        return Err(PipelineError::io(
            out.path(),
            anyhow!("output directory is not empty before export"),
        ));
    }

    let mut written = Vec::with_capacity(count * 2);
    for n in 1..=count {
        written.push(export_one(clean, n - 1, out.clean_path(n), render)?);
        written.push(export_one(striped, n - 1, out.striped_path(n), render)?);
    }
    log::debug!("Exported {count} sample pairs to {}", out.path().display());
    Ok(written)
}

fn export_one(
    collection: &AugmentedCollection,
    index: usize,
    path: PathBuf,
    render: &RenderOptions,
) -> Result<PathBuf> {
    collection.plot(index, &path, render)?;
    let info = collection.info(index)?;
    log::debug!("Wrote {} ({}, lambda {:.3})", path.display(), info.kind, info.lambda);
    Ok(path)
}
