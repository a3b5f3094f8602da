use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use matfile::{MatFile, NumericData};
use ndarray::{Array3, Ix3, OwnedRepr, ShapeBuilder};
use ndarray_npy::NpzReader;
use serde_json::Value as JsonValue;

use super::model::HyperCube;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the cube stored under `label` in a multi-object file. Dispatch by
/// extension.
///
/// Supported formats:
/// * `.mat`  – MATLAB v5/v7 file, `label` names a 3-D numeric variable
/// * `.npz`  – NumPy archive (`np.savez`), `label` names the array
/// * `.json` – `{ "<label>": [[[b0, b1, ...], ...], ...] }` in (H, W, B) order
pub fn load_cube(path: &Path, label: &str) -> Result<HyperCube, PipelineError> {
    read_cube(path, label).map_err(|source| PipelineError::CubeLoad {
        path: path.to_path_buf(),
        label: label.to_string(),
        source,
    })
}

fn read_cube(path: &Path, label: &str) -> Result<HyperCube> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let data = match ext.as_str() {
        "mat" => load_mat(path, label)?,
        "npz" => load_npz(path, label)?,
        "json" => load_json(path, label)?,
        other => bail!("Unsupported cube file extension: .{other}"),
    };

    let cube = HyperCube::new(label, data)?;
    log::debug!(
        "Loaded cube '{}' {:?} from {}",
        cube.label(),
        cube.shape(),
        path.display()
    );
    Ok(cube)
}

// ---------------------------------------------------------------------------
// MAT loader
// ---------------------------------------------------------------------------

/// Collect the real part of any numeric class as `f64`. Complex data is not a
/// reflectance cube and is rejected.
macro_rules! real_values {
    ($data:expr, $($variant:ident),+) => {
        match $data {
            $(
                NumericData::$variant { real, imag } => {
                    if imag.is_some() {
                        bail!("complex-valued variable is not a reflectance cube");
                    }
                    real.iter().map(|&v| v as f64).collect::<Vec<f64>>()
                }
            )+
            #[allow(unreachable_patterns)]
            _ => bail!("unsupported MAT numeric class"),
        }
    };
}

fn load_mat(path: &Path, label: &str) -> Result<Array3<f64>> {
    let file = File::open(path).context("opening MAT file")?;
    let mat = MatFile::parse(BufReader::new(file)).map_err(|e| anyhow!("parsing MAT file: {e:?}"))?;

    let array = mat
        .find_by_name(label)
        .with_context(|| format!("MAT file has no variable named '{label}'"))?;

    let size = array.size();
    if size.len() != 3 {
        bail!("variable '{label}' has {} dimensions, expected 3", size.len());
    }

    let values = real_values!(
        array.data(),
        Int8, UInt8, Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double
    );

    // MATLAB stores arrays column-major.
    Array3::from_shape_vec((size[0], size[1], size[2]).f(), values)
        .context("variable data does not match its declared size")
}

// ---------------------------------------------------------------------------
// NPZ loader
// ---------------------------------------------------------------------------

/// Try each supported element type in turn; the archive only tells us the
/// dtype once we attempt a read.
macro_rules! read_npz_as_f64 {
    ($npz:expr, $name:expr, $($elem:ty),+) => {{
        let mut found = None;
        $(
            if found.is_none() {
                if let Ok(arr) = $npz.by_name::<OwnedRepr<$elem>, Ix3>($name) {
                    found = Some(arr.mapv(|v| v as f64));
                }
            }
        )+
        found
    }};
}

fn load_npz(path: &Path, label: &str) -> Result<Array3<f64>> {
    let file = File::open(path).context("opening NPZ file")?;
    let mut npz = NpzReader::new(file).context("reading NPZ archive")?;

    let names = npz.names().context("listing NPZ arrays")?;
    let name = names
        .iter()
        .find(|n| n.as_str() == label || n.strip_suffix(".npy") == Some(label))
        .cloned()
        .with_context(|| format!("NPZ archive has no array named '{label}'"))?;

    read_npz_as_f64!(npz, &name, f64, f32, u16, i16, u8, i32, i64).with_context(|| {
        format!("array '{label}' is not a 3-D array of a supported numeric type")
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema, one entry per cube:
///
/// ```json
/// {
///   "paviaU": [ [ [0.12, 0.14, ...], ... ], ... ]
/// }
/// ```
fn load_json(path: &Path, label: &str) -> Result<Array3<f64>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let entry = root
        .as_object()
        .context("Expected top-level JSON object")?
        .get(label)
        .with_context(|| format!("JSON file has no entry named '{label}'"))?;

    let rows: Vec<Vec<Vec<f64>>> = serde_json::from_value(entry.clone())
        .with_context(|| format!("entry '{label}' is not a 3-D array of numbers"))?;

    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    let bands = rows
        .first()
        .and_then(|r| r.first())
        .map_or(0, Vec::len);

    let mut values = Vec::with_capacity(height * width * bands);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            bail!("Row {i}: has {} pixels, expected {width}", row.len());
        }
        for (j, pixel) in row.iter().enumerate() {
            if pixel.len() != bands {
                bail!("Pixel ({i}, {j}): has {} bands, expected {bands}", pixel.len());
            }
            values.extend_from_slice(pixel);
        }
    }

    Ok(Array3::from_shape_vec((height, width, bands), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::NpzWriter;

    fn ramp(h: usize, w: usize, b: usize) -> Array3<f64> {
        Array3::from_shape_fn((h, w, b), |(i, j, k)| (i * 100 + j * 10 + k) as f64)
    }

    #[test]
    fn loads_json_cube_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.json");
        std::fs::write(
            &path,
            r#"{ "other": 1, "paviaU": [[[1, 2], [3, 4], [5, 6]], [[7, 8], [9, 10], [11, 12]]] }"#,
        )
        .unwrap();

        let cube = load_cube(&path, "paviaU").unwrap();
        assert_eq!(cube.shape(), (2, 3, 2));
        assert_eq!(cube.data()[[1, 2, 1]], 12.0);
        assert_eq!(cube.label(), "paviaU");
    }

    #[test]
    fn loads_npz_cube_with_integer_dtype() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.npz");
        let expected = ramp(3, 4, 5);
        {
            let mut npz = NpzWriter::new(File::create(&path).unwrap());
            npz.add_array("paviaU.npy", &expected.mapv(|v| v as u16)).unwrap();
            npz.finish().unwrap();
        }

        let cube = load_cube(&path, "paviaU").unwrap();
        assert_eq!(cube.data(), &expected);
    }

    #[test]
    fn missing_label_is_cube_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.json");
        std::fs::write(&path, r#"{ "salinas": [[[1.0]]] }"#).unwrap();

        let err = load_cube(&path, "paviaU").unwrap_err();
        assert!(matches!(err, PipelineError::CubeLoad { ref label, .. } if label == "paviaU"));
    }

    #[test]
    fn missing_file_is_cube_load_error() {
        let err = load_cube(Path::new("/definitely/not/here.mat"), "paviaU").unwrap_err();
        assert!(matches!(err, PipelineError::CubeLoad { .. }));
    }

    #[test]
    fn ragged_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.json");
        std::fs::write(&path, r#"{ "paviaU": [[[1, 2], [3]]] }"#).unwrap();

        assert!(load_cube(&path, "paviaU").is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_cube(Path::new("cube.tiff"), "paviaU").unwrap_err();
        assert!(format!("{:#}", anyhow::Error::from(err)).contains("Unsupported"));
    }
}
