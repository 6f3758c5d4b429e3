//! `fieldmap.toml` configuration.
//!
//! Looked up at `--config PATH` when given, otherwise `fieldmap.toml` in the
//! working directory. A missing default file means defaults; a missing
//! explicit file is an error.
//!
//! ```toml
//! store_dir = "rules"
//!
//! [transform]
//! default_date_format = "%d/%m/%Y"
//!
//! [transform.number]
//! group_separator = "."
//! decimal_separator = ","
//!
//! [transform.expr]
//! max_steps = 5000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fieldmap_transform::TransformOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "fieldmap.toml";

/// Store directory used when neither the flag nor the config sets one.
pub const DEFAULT_STORE_DIR: &str = ".fieldmap/rules";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldmapConfig {
    /// Directory of the rule store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    /// Step evaluation options.
    pub transform: TransformOptions,
}

impl FieldmapConfig {
    /// Parse a config file. Relative `store_dir` values resolve against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let (Some(dir), Some(base)) = (&config.store_dir, path.parent())
            && dir.is_relative()
        {
            config.store_dir = Some(base.join(dir));
        }
        Ok(config)
    }

    /// Load from `explicit`, or from `fieldmap.toml` in `cwd` if present.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = cwd.join(CONFIG_FILENAME);
        if default_path.is_file() {
            tracing::debug!(path = %default_path.display(), "using config file");
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// The store directory: flag, then config, then [`DEFAULT_STORE_DIR`].
    pub fn store_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }
}
