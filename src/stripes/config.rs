use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Stripe parameters
// ---------------------------------------------------------------------------

/// Direction of the striped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Column-wise stripes (push-broom detector non-uniformity).
    #[default]
    Vertical,
    /// Row-wise stripes.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Per-line gain error: `v * (1 + n)`.
    #[default]
    Multiplicative,
    /// Per-line offset scaled by the band mean: `v + n * mean`.
    Additive,
}

/// One striping pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripeSpec {
    pub orientation: Orientation,
    pub noise: NoiseKind,
    /// Standard deviation of the per-line noise.
    pub intensity: f32,
    /// Every `period`-th line is striped.
    pub period: usize,
    /// Bands to corrupt; `None` means all of them.
    pub bands: Option<Vec<usize>>,
    pub seed: u64,
}

impl Default for StripeSpec {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            noise: NoiseKind::Multiplicative,
            intensity: 0.1,
            period: 1,
            bands: None,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// StripingConfig – named passes applied in name order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StripingConfig {
    entries: BTreeMap<String, StripeSpec>,
}

impl StripingConfig {
    /// Configuration used when none is supplied: a single vertical gain
    /// pattern over every band with a fixed seed.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("default".to_string(), StripeSpec::default());
        StripingConfig { entries }
    }

    #[cfg(test)]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StripeSpec)>) -> Self {
        StripingConfig {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &StripeSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse(text: &str) -> anyhow::Result<Self> {
        let config: StripingConfig = serde_json::from_str(text).context("parsing JSON")?;
        for (name, spec) in config.entries() {
            if spec.period == 0 {
                bail!("entry '{name}': period must be at least 1");
            }
            if !(spec.intensity.is_finite() && spec.intensity >= 0.0) {
                bail!("entry '{name}': intensity must be a non-negative number");
            }
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Lookup with default fallback
// ---------------------------------------------------------------------------

/// Outcome of looking for a configuration file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLookup {
    Found(StripingConfig),
    /// No path given, or nothing at the path.
    Absent,
}

/// Read and parse the file at `path`. A missing file is `Absent`; any other
/// read or parse failure is a `Config` error.
pub fn lookup(path: Option<&Path>) -> Result<ConfigLookup> {
    let Some(path) = path else {
        return Ok(ConfigLookup::Absent);
    };

    let config_error = |source: anyhow::Error| PipelineError::Config {
        path: path.to_path_buf(),
        source,
    };

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ConfigLookup::Absent),
        Err(e) => return Err(config_error(e.into())),
    };

    StripingConfig::parse(&text)
        .map(ConfigLookup::Found)
        .map_err(config_error)
}

/// Resolve the configuration to use, falling back to
/// [`StripingConfig::builtin`] when the file is absent or empty.
pub fn resolve(path: Option<&Path>) -> Result<StripingConfig> {
    let found = lookup(path)?;
    if let Some(notice) = fallback_notice(&found) {
        log::info!("{notice}");
    }
    Ok(match found {
        ConfigLookup::Found(config) if !config.is_empty() => config,
        _ => StripingConfig::builtin(),
    })
}

/// The single line logged when the built-in configuration replaces the
/// looked-up one, or `None` when the file is used as is.
fn fallback_notice(found: &ConfigLookup) -> Option<&'static str> {
    match found {
        ConfigLookup::Found(config) if !config.is_empty() => None,
        ConfigLookup::Found(_) => Some("Striping configs are empty. Setting default configs"),
        ConfigLookup::Absent => Some("Striping configs not found. Setting default configs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert_eq!(lookup(Some(path.as_path())).unwrap(), ConfigLookup::Absent);
        assert_eq!(resolve(Some(path.as_path())).unwrap(), StripingConfig::builtin());
        assert_eq!(resolve(None).unwrap(), StripingConfig::builtin());
    }

    #[test]
    fn fallback_notice_only_when_builtin_is_used() {
        assert_eq!(
            fallback_notice(&ConfigLookup::Absent),
            Some("Striping configs not found. Setting default configs")
        );
        assert!(fallback_notice(&ConfigLookup::Found(StripingConfig::default()))
            .is_some_and(|notice| notice.contains("empty")));
        assert_eq!(fallback_notice(&ConfigLookup::Found(StripingConfig::builtin())), None);
    }

    #[test]
    fn parses_partial_entries_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.json");
        std::fs::write(
            &path,
            r#"{
                "rows": { "orientation": "horizontal", "noise": "additive", "intensity": 0.3, "bands": [0, 2] },
                "cols": { "period": 4, "seed": 7 }
            }"#,
        )
        .unwrap();

        let config = resolve(Some(path.as_path())).unwrap();
        let entries: Vec<_> = config.entries().collect();
        assert_eq!(entries.len(), 2);

        let (name, cols) = entries[0];
        assert_eq!(name, "cols");
        assert_eq!(cols.period, 4);
        assert_eq!(cols.orientation, Orientation::Vertical);
        assert_eq!(cols.intensity, 0.1);

        let (_, rows) = entries[1];
        assert_eq!(rows.noise, NoiseKind::Additive);
        assert_eq!(rows.bands.as_deref(), Some(&[0, 2][..]));
    }

    #[test]
    fn bundled_example_parses() {
        let config = StripingConfig::parse(include_str!("../../configs/striping_configs.json")).unwrap();
        let names: Vec<_> = config.entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["detector_gain", "readout_offset", "scan_banding"]);
    }

    #[test]
    fn empty_mapping_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(resolve(Some(path.as_path())).unwrap(), StripingConfig::builtin());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"a\": { \"period\": ").unwrap();
        assert!(matches!(resolve(Some(path.as_path())), Err(PipelineError::Config { .. })));

        std::fs::write(&path, r#"{ "a": { "period": 0 } }"#).unwrap();
        assert!(matches!(resolve(Some(path.as_path())), Err(PipelineError::Config { .. })));
    }

    #[test]
    fn directory_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve(Some(dir.path())),
            Err(PipelineError::Config { .. })
        ));
    }
}
