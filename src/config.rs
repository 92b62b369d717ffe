//! Configuration management for the blueprint compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (compiler.toml)
//! - Environment variables (BLUEPRINT__*)
//!
//! ## Example config file (compiler.toml):
//! ```toml
//! [output]
//! root = "./site"
//! components_dir = "components/generated"
//!
//! [library]
//! import_base = "@/components/library"
//!
//! [library.components]
//! gallery = "MasonryGallery"
//!
//! [layout]
//! menu_collapse_width = 768
//!
//! [schema]
//! dialects = ["postgres", "sqlite"]
//!
//! [graph]
//! cycle_detection = "full"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Main configuration for the compiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Pre-built presentation components
    #[serde(default)]
    pub library: LibraryConfig,

    /// Layout and link conventions baked into generated modules
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Schema emission settings
    #[serde(default)]
    pub schema: SchemaConfig,

    /// View graph settings
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Output layout, relative to `root`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Route modules
    #[serde(default = "default_app_dir")]
    pub app_dir: String,

    /// One module per view
    #[serde(default = "default_components_dir")]
    pub components_dir: String,

    /// Shared runtime modules (menu view)
    #[serde(default = "default_support_dir")]
    pub support_dir: String,

    /// Shared runtime helpers (link resolution)
    #[serde(default = "default_lib_dir")]
    pub lib_dir: String,

    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,

    /// Write manifest.json with checksums
    #[serde(default = "default_true")]
    pub manifest: bool,
}

/// Pre-built component library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Import base for library components
    #[serde(default = "default_import_base")]
    pub import_base: String,

    /// Component name overrides, keyed by view kind tag (e.g. `social_links`)
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

/// Layout conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width in pixels below which menus collapse to an overlay
    #[serde(default = "default_collapse_width")]
    pub menu_collapse_width: u32,

    /// URL prefix for file links in menus
    #[serde(default = "default_file_base_path")]
    pub file_base_path: String,

    /// Well-known logo asset
    #[serde(default = "default_logo_path")]
    pub logo_path: String,

    #[serde(default = "default_logo_size")]
    pub logo_size: u32,
}

/// Schema emission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Dialects emitted by `build` and `migrate`
    #[serde(default = "default_dialects")]
    pub dialects: Vec<Dialect>,

    /// Length used for VARCHAR fields without a size
    #[serde(default = "default_varchar_size")]
    pub default_varchar_size: u32,
}

/// View graph settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub cycle_detection: CycleDetection,
}

/// How container cycles are caught
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDetection {
    /// Depth-first back-edge detection over the whole view graph
    #[default]
    Full,
    /// Only guard subviews resolving to the container's own identity
    Identity,
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_app_dir() -> String {
    "app".to_string()
}

fn default_components_dir() -> String {
    "components/generated".to_string()
}

fn default_support_dir() -> String {
    "components/site".to_string()
}

fn default_lib_dir() -> String {
    "lib".to_string()
}

fn default_schema_dir() -> String {
    "schema".to_string()
}

fn default_true() -> bool {
    true
}

fn default_import_base() -> String {
    "@/components/library".to_string()
}

fn default_collapse_width() -> u32 {
    768
}

fn default_file_base_path() -> String {
    "/files".to_string()
}

fn default_logo_path() -> String {
    "/logo.png".to_string()
}

fn default_logo_size() -> u32 {
    48
}

fn default_dialects() -> Vec<Dialect> {
    vec![Dialect::Postgres]
}

fn default_varchar_size() -> u32 {
    255
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            app_dir: default_app_dir(),
            components_dir: default_components_dir(),
            support_dir: default_support_dir(),
            lib_dir: default_lib_dir(),
            schema_dir: default_schema_dir(),
            manifest: true,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            import_base: default_import_base(),
            components: BTreeMap::new(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            menu_collapse_width: default_collapse_width(),
            file_base_path: default_file_base_path(),
            logo_path: default_logo_path(),
            logo_size: default_logo_size(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dialects: default_dialects(),
            default_varchar_size: default_varchar_size(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["compiler.toml", ".compiler.toml", "config/compiler.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "blueprint", "compiler") {
            let xdg_config = config_dir.config_dir().join("compiler.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // BLUEPRINT__OUTPUT__ROOT=./site
        builder = builder.add_source(
            Environment::with_prefix("BLUEPRINT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Output root (resolves relative paths)
    pub fn output_root(&self) -> PathBuf {
        if self.output.root.is_absolute() {
            self.output.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.root)
        }
    }

    /// Sanity checks beyond what deserialization enforces
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let dirs = [
            ("output.app_dir", &self.output.app_dir),
            ("output.components_dir", &self.output.components_dir),
            ("output.support_dir", &self.output.support_dir),
            ("output.lib_dir", &self.output.lib_dir),
            ("output.schema_dir", &self.output.schema_dir),
        ];
        for (key, dir) in dirs {
            if Path::new(dir).is_absolute() || dir.split('/').any(|part| part == "..") {
                problems.push(format!("{} must be a relative path inside the output root: {}", key, dir));
            }
        }

        if self.schema.dialects.is_empty() {
            problems.push("schema.dialects is empty; no schema will be emitted".to_string());
        }
        if self.schema.default_varchar_size == 0 {
            problems.push("schema.default_varchar_size must be positive".to_string());
        }
        if !self.layout.file_base_path.starts_with('/') {
            problems.push(format!(
                "layout.file_base_path should be site-absolute: {}",
                self.layout.file_base_path
            ));
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.output.components_dir, "components/generated");
        assert_eq!(config.layout.menu_collapse_width, 768);
        assert_eq!(config.schema.dialects, vec![Dialect::Postgres]);
        assert_eq!(config.graph.cycle_detection, CycleDetection::Full);
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[schema]"));
        assert!(toml_str.contains("cycle_detection = \"full\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CompilerConfig = toml::from_str(
            r#"
            [schema]
            dialects = ["mysql", "sqlite"]

            [graph]
            cycle_detection = "identity"
            "#,
        )
        .unwrap();
        assert_eq!(config.schema.dialects, vec![Dialect::MySql, Dialect::Sqlite]);
        assert_eq!(config.graph.cycle_detection, CycleDetection::Identity);
        assert_eq!(config.output.app_dir, "app");
    }

    #[test]
    fn test_problems_flag_escaping_dirs() {
        let mut config = CompilerConfig::default();
        config.output.app_dir = "../app".to_string();
        config.schema.dialects.clear();
        assert_eq!(config.problems().len(), 2);
    }
}
