use std::path::Path;

use anyhow::{Context, Result, bail};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderMode {
    /// False-colour composite of three bands.
    #[default]
    Rgb,
    /// Band-mean intensity through a blue → red hue ramp.
    Heatmap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub mode: RenderMode,
    /// Bands shown as red, green, blue. `None` picks them from the band count.
    pub rgb_bands: Option<[usize; 3]>,
}

impl RenderOptions {
    /// Fail if an explicit rgb band does not exist in a `bands`-band cube.
    /// Heatmap mode uses every band and never fails.
    pub fn check_bands(&self, bands: usize) -> Result<()> {
        if self.mode != RenderMode::Rgb {
            return Ok(());
        }
        let picked = self.rgb_bands.unwrap_or_else(|| default_rgb_bands(bands));
        if let Some(&bad) = picked.iter().find(|&&b| b >= bands) {
            bail!("band {bad} out of range for a {bands}-band sample");
        }
        Ok(())
    }
}

/// Bands at roughly ¾, ½ and ¼ of the spectral range.
pub fn default_rgb_bands(bands: usize) -> [usize; 3] {
    let last = bands.saturating_sub(1);
    [last * 3 / 4, last / 2, last / 4]
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one (height, width, bands) sample to an 8-bit RGB image.
pub fn render_sample(sample: ArrayView3<f64>, options: &RenderOptions) -> Result<RgbImage> {
    let (height, width, bands) = sample.dim();
    if height == 0 || width == 0 || bands == 0 {
        bail!("cannot render an empty sample ({height}x{width}x{bands})");
    }

    options.check_bands(bands)?;

    let pixels: Array2<[u8; 3]> = match options.mode {
        RenderMode::Rgb => {
            let picked = options.rgb_bands.unwrap_or_else(|| default_rgb_bands(bands));
            let [r, g, b] = picked.map(|band| stretch(sample.index_axis(Axis(2), band)));
            Array2::from_shape_fn((height, width), |ij| [r[ij], g[ij], b[ij]])
        }
        RenderMode::Heatmap => {
            let mean = sample
                .mean_axis(Axis(2))
                .context("computing band mean")?;
            let (lo, span) = finite_range(mean.view());
            mean.mapv(|v| normalize(v, lo, span).map_or([0, 0, 0], heat_color))
        }
    };

    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb(pixels[[y as usize, x as usize]])
    }))
}

/// Render and write a PNG.
pub fn save_sample(sample: ArrayView3<f64>, path: &Path, options: &RenderOptions) -> Result<()> {
    let img = render_sample(sample, options)?;
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

// -- Helpers --

/// Lowest finite value and the finite span of a plane.
fn finite_range(plane: ArrayView2<f64>) -> (f64, f64) {
    let (lo, hi) = plane
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    (lo, hi - lo)
}

/// Map into [0, 1]; `None` for non-finite values or a degenerate range.
fn normalize(v: f64, lo: f64, span: f64) -> Option<f64> {
    if v.is_finite() && span.is_finite() && span > 0.0 {
        Some(((v - lo) / span).clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Min–max stretch of one band to 8 bits.
fn stretch(plane: ArrayView2<f64>) -> Array2<u8> {
    let (lo, span) = finite_range(plane);
    plane.mapv(|v| normalize(v, lo, span).map_or(0, |t| (t * 255.0).round() as u8))
}

fn heat_color(t: f64) -> [u8; 3] {
    let hue = (1.0 - t as f32) * 240.0;
    let hsl = Hsl::new(hue, 0.85, 0.5);
    let rgb: Srgb = hsl.into_color();
    [
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    ]
}
