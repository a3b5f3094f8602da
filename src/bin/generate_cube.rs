use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array3;
use ndarray_npy::NpzWriter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Write a synthetic hyperspectral cube to an .npz archive.
#[derive(Debug, Parser)]
struct Opts {
    #[arg(long, default_value = "synthetic_cube.npz")]
    output: PathBuf,
    #[arg(long, default_value = "paviaU")]
    label: String,
    #[arg(long, default_value_t = 256)]
    height: usize,
    #[arg(long, default_value_t = 192)]
    width: usize,
    #[arg(long, default_value_t = 103)]
    bands: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Reflectance of one material: a sum of peaks over the normalized band axis.
fn spectrum(peaks: &[(f64, f64, f64)], bands: usize) -> Vec<f64> {
    (0..bands)
        .map(|k| {
            let x = k as f64 / bands.max(1) as f64;
            0.05 + peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(x, mu, sigma, amp))
                .sum::<f64>()
        })
        .collect()
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let noise = Normal::new(0.0, 0.01).context("noise distribution")?;

    // Vegetation, soil, water, asphalt.
    let materials: Vec<Vec<f64>> = [
        vec![(0.55, 0.05, 0.15), (0.85, 0.12, 0.6)],
        vec![(0.6, 0.3, 0.35)],
        vec![(0.2, 0.1, 0.1)],
        vec![(0.5, 0.5, 0.2), (0.9, 0.05, 0.05)],
    ]
    .iter()
    .map(|peaks| spectrum(peaks, opts.bands))
    .collect();

    // Material regions are diagonal bands across the scene.
    let cube = Array3::from_shape_fn((opts.height, opts.width, opts.bands), |(i, j, k)| {
        let region = ((i + 2 * j) / 48) % materials.len();
        materials[region][k]
    });
    let cube = cube.mapv(|v| (v + noise.sample(&mut rng)).max(0.0) as f32);

    let file = File::create(&opts.output)
        .with_context(|| format!("creating {}", opts.output.display()))?;
    let mut npz = NpzWriter::new(file);
    npz.add_array(format!("{}.npy", opts.label), &cube)
        .context("writing cube array")?;
    npz.finish().context("finishing archive")?;

    println!(
        "Wrote cube '{}' ({}x{}x{}) to {}",
        opts.label,
        opts.height,
        opts.width,
        opts.bands,
        opts.output.display()
    );
    Ok(())
}
