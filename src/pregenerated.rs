//! Pre-generated view modules
//!
//! An upstream generation phase may supply finished source for some views.
//! It arrives either as a directory of `<view-id>.tsx` / `<view-id>.jsx` files
//! or as a JSON object mapping view ids to source text.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{CompileError, Result};

const EXTENSIONS: &[&str] = &["tsx", "jsx"];

/// view id -> module source
#[derive(Debug, Clone, Default)]
pub struct PregeneratedSources {
    sources: BTreeMap<String, String>,
}

impl PregeneratedSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a directory or a JSON map file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_directory(path)
        } else {
            let content = std::fs::read_to_string(path)?;
            Self::from_json(&content)
        }
    }

    /// Walk a directory for module files; the file stem is the view id
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut sources = BTreeMap::new();

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| EXTENSIONS.contains(&e));
            if !supported {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(path)?;
            if sources.insert(id.to_string(), source).is_some() {
                tracing::warn!(view = id, path = %path.display(), "duplicate pre-generated module; last one wins");
            }
        }

        tracing::info!(count = sources.len(), dir = %dir.display(), "loaded pre-generated modules");
        Ok(Self { sources })
    }

    /// Parse a JSON object of view id -> source
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut sources = BTreeMap::new();
        for (id, value) in raw {
            match value {
                serde_json::Value::String(source) => {
                    sources.insert(id, source);
                }
                other => {
                    return Err(CompileError::InvalidPregenerated(format!(
                        "source for view '{}' is not a string: {}",
                        id, other
                    )))
                }
            }
        }
        Ok(Self { sources })
    }

    pub fn get(&self, view_id: &str) -> Option<&str> {
        self.sources
            .get(view_id)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<(String, String)> for PregeneratedSources {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}
