//! Configuration management.
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (flowdocs.toml)
//! - Environment variables (FLOWDOCS_*)
//!
//! ## Example config file (flowdocs.toml):
//! ```toml
//! [scan]
//! root = "."
//! skip_prefixes = ["target/", "vendor/"]
//! use_gitignore = true
//!
//! [repos]
//! billing = "../billing-service"
//! identity = "../identity-service"
//!
//! [export]
//! format = "dot"
//! ```
//!
//! The `[repos]` table names the external repositories that cross-repository
//! references (`billing@INV-1`) may point at. Graph construction consumes
//! only the names; the paths are for tooling that opens the other workspace.

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::error::Result;
use crate::scan::ScanConfig;

/// Main configuration for flowdocs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Scan settings
    #[serde(default)]
    pub scan: ScanSection,

    /// External repositories recognized in cross-repository references
    #[serde(default)]
    pub repos: BTreeMap<String, PathBuf>,

    /// Export settings
    #[serde(default)]
    pub export: ExportSection,
}

/// Scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    /// Workspace root to scan
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Skip paths with these prefixes
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// When non-empty, only scan paths with these prefixes
    #[serde(default)]
    pub include_prefixes: Vec<String>,

    /// Honor .gitignore files while walking
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Output format (dot or svg)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_skip_prefixes() -> Vec<String> {
    ScanConfig::default().skip_prefixes
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "dot".to_string()
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
            use_gitignore: true,
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl FlowConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["flowdocs.toml", ".flowdocs.toml", "config/flowdocs.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "flowdocs", "flowdocs") {
            let xdg_config = config_dir.config_dir().join("flowdocs.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (FLOWDOCS_*)
        builder = builder.add_source(
            Environment::with_prefix("FLOWDOCS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The workspace root (resolves relative paths against the current dir)
    pub fn scan_root(&self) -> PathBuf {
        if self.scan.root.is_absolute() {
            self.scan.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.scan.root)
        }
    }

    /// Names that cross-repository references may use
    pub fn external_names(&self) -> HashSet<String> {
        self.repos.keys().cloned().collect()
    }

    /// The walk filters for [`crate::scan::scan_workspace`]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            skip_prefixes: self.scan.skip_prefixes.clone(),
            include_prefixes: self.scan.include_prefixes.clone(),
            use_gitignore: self.scan.use_gitignore,
        }
    }
}
