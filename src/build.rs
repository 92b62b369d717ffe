//! Build orchestration
//!
//! One `build` run: compile the site, write its modules, write the base
//! schema of every configured dialect (once), then the manifest.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::blueprint::Blueprint;
use crate::codegen::compile_site;
use crate::config::CompilerConfig;
use crate::error::Result;
use crate::graph::Diagnostics;
use crate::output::{write_site, Artifact, ArtifactSink, Manifest, SchemaWriter};
use crate::pregenerated::PregeneratedSources;
use crate::sql::Dialect;

/// Outcome of a build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Paths written this run, manifest excluded
    pub written: Vec<String>,
    /// Dialects whose base schema already existed
    pub skipped_base: Vec<Dialect>,
    pub diagnostics: Diagnostics,
}

/// Compile and write a blueprint
pub fn build(
    blueprint: &Blueprint,
    config: &CompilerConfig,
    pregenerated: &PregeneratedSources,
    sink: &mut dyn ArtifactSink,
) -> Result<BuildReport> {
    let site = compile_site(blueprint, config, pregenerated);
    write_site(&site, sink)?;

    let mut diagnostics = site.diagnostics.clone();
    let mut artifacts: Vec<Artifact> = site.artifacts.clone();
    let mut skipped_base = Vec::new();
    {
        let mut writer = SchemaWriter::new(sink, config.output.schema_dir.clone());
        for dialect in &config.schema.dialects {
            match writer.write_base(blueprint, *dialect, &config.schema, &mut diagnostics)? {
                Some(artifact) => artifacts.push(artifact),
                None => skipped_base.push(*dialect),
            }
        }
    }

    if config.output.manifest {
        let manifest = Manifest::new(&artifacts, site.identities.clone());
        sink.write(&manifest.to_artifact()?)?;
    }

    tracing::info!(
        artifacts = artifacts.len(),
        skipped_base = skipped_base.len(),
        errors = diagnostics.error_count(),
        "build finished"
    );

    Ok(BuildReport {
        written: artifacts.into_iter().map(|a| a.path).collect(),
        skipped_base,
        diagnostics,
    })
}

/// Append one migration per dialect from the blueprint's journal
pub fn migrate(
    blueprint: &Blueprint,
    config: &CompilerConfig,
    dialects: &[Dialect],
    now: NaiveDateTime,
    sink: &mut dyn ArtifactSink,
) -> Result<(Vec<Artifact>, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let mut written = Vec::new();
    let mut writer = SchemaWriter::new(sink, config.output.schema_dir.clone());

    for dialect in dialects {
        if let Some(artifact) = writer.write_migration(blueprint, *dialect, &config.schema, now, &mut diagnostics)? {
            written.push(artifact);
        }
    }
    Ok((written, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{MemorySink, MANIFEST_FILE};
    use chrono::NaiveDate;
    use serde_json::json;

    fn blueprint() -> Blueprint {
        serde_json::from_value(json!({
            "pages": [{"id": "p", "name": "Home", "home": true, "views": [{"id": "v", "rowpos": 0}]}],
            "views": [{"id": "v", "name": "Intro", "type": "text", "content": "Hello"}],
            "models": [{"name": "Note", "fields": [{"name": "body", "datatype": "TEXT"}]}],
            "migrations": [{"model": "Note", "action": "update", "changes": [
                {"type": "field", "operation": "add", "field": {"name": "pinned", "datatype": "BOOLEAN"}}
            ]}]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_writes_site_schema_and_manifest() {
        let mut config = CompilerConfig::default();
        config.schema.dialects = vec![Dialect::Postgres, Dialect::Sqlite];
        let mut sink = MemorySink::new();

        let report = build(&blueprint(), &config, &PregeneratedSources::default(), &mut sink).unwrap();
        assert!(report.written.contains(&"app/page.tsx".to_string()));
        assert!(sink.get("schema/postgres/base.sql").is_some());
        assert!(sink.get("schema/sqlite/base.sql").is_some());
        assert!(report.skipped_base.is_empty());

        let manifest: serde_json::Value = serde_json::from_str(sink.get(MANIFEST_FILE).unwrap()).unwrap();
        assert_eq!(manifest["identities"]["v"], "intro");
        assert_eq!(manifest["stats"]["schema_scripts"], 2);

        let again = build(&blueprint(), &config, &PregeneratedSources::default(), &mut sink).unwrap();
        assert_eq!(again.skipped_base, vec![Dialect::Postgres, Dialect::Sqlite]);
    }

    #[test]
    fn test_migrate_appends_per_dialect() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut sink = MemorySink::new();
        let (written, diags) = migrate(
            &blueprint(),
            &CompilerConfig::default(),
            &[Dialect::Postgres, Dialect::MySql],
            now,
            &mut sink,
        )
        .unwrap();
        assert_eq!(written.len(), 2);
        assert!(diags.is_empty());
        assert!(sink
            .get("schema/mysql/migrations/0001_20250601000000.sql")
            .unwrap()
            .contains("ALTER TABLE `note` ADD COLUMN `pinned` BOOLEAN;"));
    }
}
