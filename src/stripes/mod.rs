//! Synthetic sensor striping: configuration lookup and the overlay itself.

pub mod config;
pub mod overlay;

pub use config::{StripingConfig, resolve};
pub use overlay::{Overlay, SensorStripes};
