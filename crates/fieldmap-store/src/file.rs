//! Directory-backed rule store.
//!
//! Each rule is one JSON document named `<endpoint id>.json`, where
//! characters outside `[A-Za-z0-9_-]` are hex-escaped so distinct endpoint
//! ids never share a file. Writes go to a temporary file in the same
//! directory which is then renamed over the target, so a reader sees either
//! the old document or the new one, never a partial write.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use fieldmap_model::TransformationRule;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::document::StoredRule;
use crate::error::{Result, StoreError};
use crate::{RuleStore, RuleSummary};

/// Rule store keeping one JSON document per endpoint in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| StoreError::io(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the document for an endpoint, whether or not it exists.
    pub fn rule_path(&self, endpoint_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_id(endpoint_id)))
    }

    /// Load the document for an endpoint, metadata included.
    pub fn load_stored(&self, endpoint_id: &str) -> Result<StoredRule> {
        let path = self.rule_path(endpoint_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    endpoint_id: endpoint_id.to_string(),
                });
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let stored = StoredRule::from_json(&path, &contents)?;
        // Case-insensitive filesystems can map two ids onto one file.
        if stored.rule.endpoint_id != endpoint_id {
            return Err(StoreError::NotFound {
                endpoint_id: endpoint_id.to_string(),
            });
        }
        Ok(stored)
    }

    fn documents(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| StoreError::io(&self.base_dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.base_dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read_document(path: &Path) -> Result<StoredRule> {
        let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        StoredRule::from_json(path, &contents)
    }
}

impl RuleStore for JsonFileStore {
    fn load(&self, endpoint_id: &str) -> Result<TransformationRule> {
        let path = self.rule_path(endpoint_id);
        self.load_stored(endpoint_id)?
            .into_rule()
            .map_err(|e| match e {
                StoreError::Invalid(model) => StoreError::corrupt(path, model),
                other => other,
            })
    }

    fn save(&self, rule: &TransformationRule) -> Result<()> {
        let stored = StoredRule::new(rule)?;
        let path = self.rule_path(&rule.endpoint_id);
        write_atomic(&path, stored.to_json()?.as_bytes())?;
        debug!(endpoint = %rule.endpoint_id, path = %path.display(), "rule saved");
        Ok(())
    }

    fn delete(&self, endpoint_id: &str) -> Result<bool> {
        let path = self.rule_path(endpoint_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(endpoint = endpoint_id, "rule deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Persist { path, source: e }),
        }
    }

    /// Summaries of every readable document. Unreadable files are skipped
    /// with a warning so one bad document does not hide the rest.
    fn list(&self) -> Result<Vec<RuleSummary>> {
        let mut summaries = Vec::new();
        for path in self.documents()? {
            match Self::read_document(&path) {
                Ok(stored) => summaries.push(RuleSummary::from_stored(&stored, Some(path))),
                Err(error) => warn!(path = %path.display(), %error, "skipping unreadable rule"),
            }
        }
        summaries.sort_by(|a, b| a.endpoint_id.cmp(&b.endpoint_id));
        Ok(summaries)
    }

    fn load_all(&self) -> Result<Vec<TransformationRule>> {
        let mut rules = Vec::new();
        for path in self.documents()? {
            let rule = Self::read_document(&path)?
                .into_rule()
                .map_err(|e| match e {
                    StoreError::Invalid(model) => StoreError::corrupt(&path, model),
                    other => other,
                })?;
            rules.push(rule);
        }
        rules.sort_by(|a, b| a.endpoint_id.cmp(&b.endpoint_id));
        Ok(rules)
    }
}

/// Replace `path` with `contents` in one rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let persist_err = |source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    temp.write_all(contents).map_err(persist_err)?;
    temp.as_file().sync_all().map_err(persist_err)?;
    temp.persist(path).map_err(|e| persist_err(e.error))?;
    Ok(())
}

/// File stem for an endpoint id.
///
/// ASCII letters, digits, `-` and `_` are kept; every other byte becomes
/// `~XX`. The mapping is injective.
fn normalize_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "~{byte:02X}");
        }
    }
    out
}
