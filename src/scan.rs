//! Workspace scanning.
//!
//! Walks a source tree, runs the tag parser over every readable text file and
//! aggregates records, parse errors and a content fingerprint. Scanning is
//! synchronous and sequential; it is the only I/O in front of the pure graph
//! build.

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::model::{NodeRecord, ParseError};
use crate::parser::parse_source;

/// Filters applied while walking the workspace.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Skip paths with these prefixes (relative to the scan root).
    pub skip_prefixes: Vec<String>,
    /// When non-empty, only paths with these prefixes are scanned.
    pub include_prefixes: Vec<String>,
    /// Honor .gitignore / .ignore files while walking.
    pub use_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
                "dist/".to_string(),
            ],
            include_prefixes: Vec::new(),
            use_gitignore: true,
        }
    }
}

/// Aggregated scan result for one workspace.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub records: Vec<NodeRecord>,
    pub errors: Vec<ParseError>,
    pub files_scanned: usize,
    /// SHA-256 over scanned contents in path order. A caching layer compares
    /// this across scans to decide whether graphs need rebuilding.
    pub source_hash: String,
}

impl ScanOutput {
    /// Distinct topics across records and topic-carrying errors, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: BTreeSet<&str> = self.records.iter().map(|r| r.topic.as_str()).collect();
        topics.extend(self.errors.iter().filter_map(|e| e.topic.as_deref()));
        topics.into_iter().map(str::to_string).collect()
    }
}

/// Scan a workspace for tagged comments.
///
/// Unreadable and non-UTF-8 files are skipped, not errors; record locations
/// are relative to `root`.
pub fn scan_workspace(root: &Path, config: &ScanConfig) -> Result<ScanOutput> {
    let root = root.canonicalize()?;
    let mut files = collect_files(&root, config);
    files.sort_unstable();

    let mut out = ScanOutput::default();
    let mut hasher = Sha256::new();

    for path in files {
        let relative = path.strip_prefix(&root)?.to_path_buf();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(file = %relative.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        hasher.update(content.as_bytes());

        let parsed = parse_source(&relative, &content);
        if !parsed.records.is_empty() || !parsed.errors.is_empty() {
            debug!(
                file = %relative.display(),
                records = parsed.records.len(),
                errors = parsed.errors.len(),
                "parsed tagged comments"
            );
        }
        out.records.extend(parsed.records);
        out.errors.extend(parsed.errors);
        out.files_scanned += 1;
    }

    out.source_hash = format!("{:x}", hasher.finalize());
    info!(
        files = out.files_scanned,
        records = out.records.len(),
        errors = out.errors.len(),
        "workspace scan complete"
    );
    Ok(out)
}

fn collect_files(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if config.use_gitignore {
        for entry in WalkBuilder::new(root).build().filter_map(|e| e.ok()) {
            if entry.file_type().map_or(false, |t| t.is_file()) {
                files.push(entry.into_path());
            }
        }
    } else {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }

    files.retain(|path| {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        let relative = relative.to_string_lossy();
        if !config.include_prefixes.is_empty()
            && !config
                .include_prefixes
                .iter()
                .any(|p| relative.starts_with(p.as_str()))
        {
            return false;
        }
        !config
            .skip_prefixes
            .iter()
            .any(|p| relative.starts_with(p.as_str()))
    });

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_skips_build_directories() {
        let config = ScanConfig::default();
        assert!(config.skip_prefixes.iter().any(|p| p == "target/"));
        assert!(config.use_gitignore);
    }

    #[test]
    fn topics_deduplicate_and_sort() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("a.rs"),
            "// @flow zeta\n// @node Z-1\n// @step z\n\
             // @flow alpha\n// @node A-1\n// @step a\n",
        )
        .expect("write");
        fs::write(
            dir.path().join("b.rs"),
            "// @flow alpha\n// @node A-2\n// @step a\n",
        )
        .expect("write");

        let out = scan_workspace(dir.path(), &ScanConfig::default()).expect("scan");
        assert_eq!(out.topics(), ["alpha", "zeta"]);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.files_scanned, 2);
        assert!(!out.source_hash.is_empty());
    }

    #[test]
    fn skip_prefixes_filter_the_walk() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("vendor")).expect("mkdir");
        fs::write(
            dir.path().join("vendor/skip.rs"),
            "// @flow hidden\n// @node H-1\n// @step h\n",
        )
        .expect("write");
        fs::write(
            dir.path().join("keep.rs"),
            "// @flow kept\n// @node K-1\n// @step k\n",
        )
        .expect("write");

        let config = ScanConfig {
            skip_prefixes: vec!["vendor/".to_string()],
            ..ScanConfig::default()
        };
        let out = scan_workspace(dir.path(), &config).expect("scan");
        assert_eq!(out.topics(), ["kept"]);
    }
}
