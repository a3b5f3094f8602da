/// Data layer: the hyperspectral cube and how it is read from disk.
///
/// Architecture:
/// ```text
///  .mat / .npz / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  find labelled object → Array3<f64>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ HyperCube │  (height, width, bands), immutable
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
