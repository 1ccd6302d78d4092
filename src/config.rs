//! Run configuration.
//!
//! Loaded once from `testsift.config.json` (or an explicit `--config` path)
//! and passed by reference everywhere. Every field has a default, so an
//! absent file is equivalent to `{}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::graph::DEFAULT_MAX_DEPTH;

pub const CONFIG_FILE: &str = "testsift.config.json";

const MAX_DEPTH_RANGE: (i64, i64) = (1, 50);
const WEIGHT_RANGE: (f64, f64) = (0.0, 10.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Globs (project-relative) excluded from source discovery.
    pub ignore_patterns: Vec<String>,
    /// When non-empty, replaces the built-in test file detection.
    pub test_patterns: Vec<String>,
    /// Per-signal weight overrides, keyed by signal name.
    pub risk_weights: BTreeMap<String, f64>,
    pub high_risk_files: Vec<String>,
    pub low_risk_files: Vec<String>,
    pub max_depth: i64,
    /// Location of a Bruno API collection. Accepted, not read.
    pub bruno_path: Option<String>,
    /// Folder name -> risk tier (`high`, `medium`, `low`), checked before
    /// the built-in folder word lists.
    pub folder_mappings: BTreeMap<String, String>,
    /// Overrides `<root>/.cache/testsift`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    #[allow(clippy::cast_possible_wrap)]
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            test_patterns: Vec::new(),
            risk_weights: BTreeMap::new(),
            high_risk_files: Vec::new(),
            low_risk_files: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH as i64,
            bruno_path: None,
            folder_mappings: BTreeMap::new(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load the config for `root`.
    ///
    /// An explicit path must exist. Without one, `<root>/testsift.config.json`
    /// is used if present, defaults otherwise.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, Error> {
        let path = match explicit {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => root.join(p),
            None => {
                let default = root.join(CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path).map_err(|e| Error::ConfigRead(path.clone(), e))?;
        Self::from_json(&content).map_err(|e| Error::ConfigParse(path, e))
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Advisory warnings for out-of-range values. Never fails.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let (lo, hi) = MAX_DEPTH_RANGE;
        if self.max_depth < lo || self.max_depth > hi {
            warnings.push(format!(
                "maxDepth {} is outside [{lo}, {hi}]; using {}",
                self.max_depth,
                self.effective_max_depth()
            ));
        }
        let (wlo, whi) = WEIGHT_RANGE;
        for (signal, weight) in &self.risk_weights {
            if !(wlo..=whi).contains(weight) {
                warnings.push(format!("riskWeights.{signal} = {weight} is outside [{wlo}, {whi}]"));
            }
        }
        for (folder, tier) in &self.folder_mappings {
            if !matches!(tier.as_str(), "high" | "medium" | "low") {
                warnings.push(format!(
                    "folderMappings.{folder} = '{tier}' is not one of high, medium, low"
                ));
            }
        }
        warnings
    }

    /// `max_depth` clamped into its supported range.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.clamp(MAX_DEPTH_RANGE.0, MAX_DEPTH_RANGE.1) as usize
    }

    /// Weight for `signal`, or `default` when not overridden.
    pub fn weight(&self, signal: &str, default: f64) -> f64 {
        self.risk_weights.get(signal).copied().unwrap_or(default)
    }

    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        match &self.cache_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => crate::cache::default_cache_dir(root),
        }
    }
}
