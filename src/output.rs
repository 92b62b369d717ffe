//! Artifact output
//!
//! Compilation is pure; writing happens here. An [`ArtifactSink`] takes
//! output-relative paths, so the same run can target a directory or memory.
//!
//! ```text
//! <root>/
//! ├── app/page.tsx, app/<slug>/page.tsx
//! ├── components/generated/<identity>.tsx
//! ├── components/site/SiteMenu.tsx
//! ├── lib/site-links.ts
//! ├── schema/<dialect>/base.sql
//! ├── schema/<dialect>/migrations/NNNN_<ts>.sql
//! └── manifest.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::checksum::Checksum;
use crate::codegen::SiteOutput;
use crate::config::SchemaConfig;
use crate::error::{CompileError, Result};
use crate::graph::Diagnostics;
use crate::sql::{emit_base_schema, emit_migration_delta, migration_file_name, migration_script, Dialect};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One emitted file, addressed relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::of_str(&self.contents)
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for artifacts
pub trait ArtifactSink {
    fn exists(&self, path: &str) -> bool;

    fn write(&mut self, artifact: &Artifact) -> Result<()>;

    /// File names directly inside an output-relative directory, sorted
    fn list(&self, dir: &str) -> Result<Vec<String>>;
}

/// In-memory sink for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of write calls, including overwrites
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ArtifactSink for MemorySink {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        validate_relative(&artifact.path)?;
        self.files.insert(artifact.path.clone(), artifact.contents.clone());
        self.writes += 1;
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}

/// Sink rooted at an output directory
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_relative(path)?;
        Ok(self.root.join(path))
    }
}

impl ArtifactSink for DirSink {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        let target = self.resolve(&artifact.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &artifact.contents)?;
        tracing::debug!(path = %target.display(), bytes = artifact.contents.len(), "wrote artifact");
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let target = self.resolve(dir)?;
        if !target.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&target)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Reject absolute paths and parent-directory components
fn validate_relative(path: &str) -> Result<()> {
    let escapes = path.trim().is_empty()
        || Path::new(path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(CompileError::InvalidArtifactPath(path.to_string()));
    }
    Ok(())
}

// =============================================================================
// Manifest
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub checksum: Checksum,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStats {
    pub total_artifacts: usize,
    pub ui_modules: usize,
    pub schema_scripts: usize,
}

/// Record of one run's artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<ManifestEntry>,
    /// view id -> identity
    pub identities: BTreeMap<String, String>,
    /// Checksum over every artifact checksum, in order
    pub manifest_checksum: Checksum,
    pub stats: ManifestStats,
}

impl Manifest {
    pub fn new(artifacts: &[Artifact], identities: BTreeMap<String, String>) -> Self {
        let entries: Vec<ManifestEntry> = artifacts
            .iter()
            .map(|a| ManifestEntry {
                path: a.path.clone(),
                checksum: a.checksum(),
                bytes: a.contents.len(),
            })
            .collect();

        let combined = entries
            .iter()
            .map(|e| e.checksum.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let schema_scripts = entries.iter().filter(|e| e.path.ends_with(".sql")).count();
        let stats = ManifestStats {
            total_artifacts: entries.len(),
            ui_modules: entries.iter().filter(|e| e.path.ends_with(".tsx")).count(),
            schema_scripts,
        };

        Self {
            generated_at: Utc::now(),
            manifest_checksum: Checksum::of_str(&combined),
            artifacts: entries,
            identities,
            stats,
        }
    }

    /// Entries whose checksum no longer matches the given contents
    pub fn stale<'a>(&'a self, artifacts: &[Artifact]) -> Vec<&'a str> {
        self.artifacts
            .iter()
            .filter(|entry| {
                artifacts
                    .iter()
                    .find(|a| a.path == entry.path)
                    .map_or(true, |a| !entry.checksum.verify(&a.contents))
            })
            .map(|entry| entry.path.as_str())
            .collect()
    }

    pub fn to_artifact(&self) -> Result<Artifact> {
        Ok(Artifact::new(MANIFEST_FILE, serde_json::to_string_pretty(self)?))
    }
}

// =============================================================================
// Writers
// =============================================================================

/// Write every UI artifact of a compiled site
pub fn write_site(site: &SiteOutput, sink: &mut dyn ArtifactSink) -> Result<usize> {
    for artifact in &site.artifacts {
        sink.write(artifact)?;
    }
    tracing::info!(count = site.artifacts.len(), "site artifacts written");
    Ok(site.artifacts.len())
}

/// Writes schema scripts under `<schema_dir>/<dialect>/`
pub struct SchemaWriter<'a> {
    sink: &'a mut dyn ArtifactSink,
    schema_dir: String,
}

impl<'a> SchemaWriter<'a> {
    pub fn new(sink: &'a mut dyn ArtifactSink, schema_dir: impl Into<String>) -> Self {
        Self {
            sink,
            schema_dir: schema_dir.into().trim_matches('/').to_string(),
        }
    }

    fn dialect_dir(&self, dialect: Dialect) -> String {
        if self.schema_dir.is_empty() {
            dialect.as_str().to_string()
        } else {
            format!("{}/{}", self.schema_dir, dialect)
        }
    }

    pub fn base_path(&self, dialect: Dialect) -> String {
        format!("{}/base.sql", self.dialect_dir(dialect))
    }

    pub fn migrations_dir(&self, dialect: Dialect) -> String {
        format!("{}/migrations", self.dialect_dir(dialect))
    }

    /// Write the base script once. Returns `None` when one already exists.
    pub fn write_base(
        &mut self,
        blueprint: &Blueprint,
        dialect: Dialect,
        config: &SchemaConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Artifact>> {
        let path = self.base_path(dialect);
        if self.sink.exists(&path) {
            tracing::info!(%dialect, path = %path, "base schema already present; skipping");
            return Ok(None);
        }

        let strategy = dialect.strategy();
        let script = emit_base_schema(&blueprint.models, strategy, config, diagnostics);
        let artifact = Artifact::new(path, script.render(strategy));
        self.sink.write(&artifact)?;
        Ok(Some(artifact))
    }

    /// Next migration sequence number for a dialect
    pub fn next_sequence(&self, dialect: Dialect) -> Result<u32> {
        let highest = self
            .sink
            .list(&self.migrations_dir(dialect))?
            .iter()
            .filter(|name| name.ends_with(".sql"))
            .filter_map(|name| name.split('_').next()?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    /// Append one migration script built from the journal. Returns `None`
    /// when the journal yields no statements.
    pub fn write_migration(
        &mut self,
        blueprint: &Blueprint,
        dialect: Dialect,
        config: &SchemaConfig,
        now: NaiveDateTime,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Artifact>> {
        let strategy = dialect.strategy();
        let statements = emit_migration_delta(blueprint, strategy, config, diagnostics);

        let file_name = migration_file_name(self.next_sequence(dialect)?, now);
        let Some(script) = migration_script(statements, &file_name, strategy) else {
            tracing::info!(%dialect, "journal is empty; no migration written");
            return Ok(None);
        };

        let artifact = Artifact::new(
            format!("{}/{}", self.migrations_dir(dialect), file_name),
            script.render(strategy),
        );
        self.sink.write(&artifact)?;
        tracing::info!(%dialect, path = %artifact.path, "migration written");
        Ok(Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_dir_sink_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirSink::new(dir.path());
        for bad in ["../x.tsx", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                sink.write(&Artifact::new(bad, "x")),
                Err(CompileError::InvalidArtifactPath(_))
            ));
        }

        sink.write(&Artifact::new("app/about/page.tsx", "ok")).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("app/about/page.tsx")).unwrap(), "ok");
        assert!(sink.exists("app/about/page.tsx"));
        assert_eq!(sink.list("app/about").unwrap(), ["page.tsx"]);
        assert!(sink.list("missing").unwrap().is_empty());
    }

    #[test]
    fn test_base_schema_is_written_once() {
        let blueprint = Blueprint::default();
        let mut sink = MemorySink::new();
        let config = SchemaConfig::default();

        let mut writer = SchemaWriter::new(&mut sink, "schema");
        let first = writer
            .write_base(&blueprint, Dialect::Postgres, &config, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(first.unwrap().path, "schema/postgres/base.sql");
        let second = writer
            .write_base(&blueprint, Dialect::Postgres, &config, &mut Diagnostics::new())
            .unwrap();
        assert!(second.is_none());
        assert_eq!(sink.writes(), 1);
    }

    #[test]
    fn test_migrations_are_numbered_per_dialect() {
        let blueprint: Blueprint = serde_json::from_value(json!({
            "migrations": [{"model": "Post", "action": "delete"}]
        }))
        .unwrap();
        let config = SchemaConfig::default();
        let mut sink = MemorySink::new();
        let mut writer = SchemaWriter::new(&mut sink, "schema");

        let a = writer
            .write_migration(&blueprint, Dialect::Sqlite, &config, now(), &mut Diagnostics::new())
            .unwrap()
            .unwrap();
        let b = writer
            .write_migration(&blueprint, Dialect::Sqlite, &config, now(), &mut Diagnostics::new())
            .unwrap()
            .unwrap();
        let c = writer
            .write_migration(&blueprint, Dialect::MySql, &config, now(), &mut Diagnostics::new())
            .unwrap()
            .unwrap();

        assert_eq!(a.path, "schema/sqlite/migrations/0001_20250102030405.sql");
        assert_eq!(b.path, "schema/sqlite/migrations/0002_20250102030405.sql");
        assert_eq!(c.path, "schema/mysql/migrations/0001_20250102030405.sql");
        assert!(b.contents.contains("VALUES ('0002_20250102030405.sql');"));

        let empty = writer
            .write_migration(&Blueprint::default(), Dialect::Sqlite, &config, now(), &mut Diagnostics::new())
            .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_manifest_checksums() {
        let artifacts = vec![
            Artifact::new("components/generated/hero.tsx", "a"),
            Artifact::new("schema/postgres/base.sql", "b"),
        ];
        let manifest = Manifest::new(&artifacts, BTreeMap::from([("v1".to_string(), "hero".to_string())]));
        assert_eq!(manifest.stats.ui_modules, 1);
        assert_eq!(manifest.stats.schema_scripts, 1);
        assert!(manifest.stale(&artifacts).is_empty());

        let changed = vec![Artifact::new("components/generated/hero.tsx", "z")];
        assert_eq!(
            manifest.stale(&changed),
            ["components/generated/hero.tsx", "schema/postgres/base.sql"]
        );
        assert_eq!(manifest.to_artifact().unwrap().path, MANIFEST_FILE);
    }
}
