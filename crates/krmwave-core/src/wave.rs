//! Wave discovery
//!
//! A cluster's manifest root is deployed in one of two ways:
//!
//! - If the root contains a `kustomization.yaml`, the whole directory is
//!   applied at once and no hooks are evaluated.
//! - Otherwise every subdirectory whose name starts with `wave` is a wave.
//!   Waves run in lexicographic order of their directory names, so name them
//!   with zero-padded suffixes (`wave00`, `wave01`, ...) when there are more
//!   than ten.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::manifest::WaveManifest;

/// Marker file that switches a cluster root to single-directory mode
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// Directory name prefix identifying wave directories
pub const WAVE_DIR_PREFIX: &str = "wave";

/// One deployable increment of a cluster's manifests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wave {
    /// Position in execution order
    pub index: usize,
    /// Directory name
    pub name: String,
    /// Directory path
    pub path: PathBuf,
}

impl Wave {
    /// Load this wave's `wave.yaml`, empty if there is none
    pub fn load_manifest(&self) -> Result<WaveManifest> {
        WaveManifest::load(&self.path)
    }
}

/// How a cluster root is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ApplyPlan {
    /// Apply the whole root in one call, without hooks
    Single { path: PathBuf },
    /// Apply each wave in order, with hooks
    Waves { waves: Vec<Wave> },
}

impl ApplyPlan {
    /// Number of apply calls this plan makes
    pub fn apply_count(&self) -> usize {
        match self {
            ApplyPlan::Single { .. } => 1,
            ApplyPlan::Waves { waves } => waves.len(),
        }
    }

    /// Short strategy name for display
    pub fn strategy(&self) -> &'static str {
        match self {
            ApplyPlan::Single { .. } => "single",
            ApplyPlan::Waves { .. } => "waves",
        }
    }
}

/// Determine the apply strategy for a cluster manifest root
pub fn discover(root: &Path) -> Result<ApplyPlan> {
    if !root.is_dir() {
        return Err(CoreError::ClusterRootNotFound {
            path: root.to_path_buf(),
        });
    }

    if root.join(KUSTOMIZATION_FILE).is_file() {
        return Ok(ApplyPlan::Single {
            path: root.to_path_buf(),
        });
    }

    let mut dirs: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        // Follows symlinks so linked wave directories are picked up
        if !entry.path().is_dir() {
            continue;
        }

        // Non UTF-8 names cannot match the prefix
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };

        if name.starts_with(WAVE_DIR_PREFIX) {
            dirs.push((name, entry.path()));
        }
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    let waves = dirs
        .into_iter()
        .enumerate()
        .map(|(index, (name, path))| Wave { index, name, path })
        .collect();

    Ok(ApplyPlan::Waves { waves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn wave_names(plan: &ApplyPlan) -> Vec<&str> {
        match plan {
            ApplyPlan::Waves { waves } => waves.iter().map(|w| w.name.as_str()).collect(),
            ApplyPlan::Single { .. } => panic!("expected waves"),
        }
    }

    #[test]
    fn test_waves_sorted_lexicographically() {
        let dir = TempDir::new().unwrap();
        for name in ["wave10", "wave02", "wave1", "wave00", "wave-b", "wave-a"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let plan = discover(dir.path()).unwrap();
        let mut expected = vec!["wave10", "wave02", "wave1", "wave00", "wave-b", "wave-a"];
        expected.sort();

        assert_eq!(wave_names(&plan), expected);
        assert_eq!(plan.strategy(), "waves");
    }

    #[test]
    fn test_wave_indices_follow_order() {
        let dir = TempDir::new().unwrap();
        for name in ["wave1", "wave0"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let ApplyPlan::Waves { waves } = discover(dir.path()).unwrap() else {
            panic!("expected waves");
        };
        assert_eq!(waves[0].index, 0);
        assert_eq!(waves[0].name, "wave0");
        assert_eq!(waves[0].path, dir.path().join("wave0"));
        assert_eq!(waves[1].index, 1);
    }

    #[test]
    fn test_non_wave_entries_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("wave0")).unwrap();
        fs::create_dir(dir.path().join("base")).unwrap();
        fs::create_dir(dir.path().join("Wave1")).unwrap();
        fs::write(dir.path().join("wave2"), "not a directory").unwrap();
        fs::write(dir.path().join("wave.yaml"), "").unwrap();

        let plan = discover(dir.path()).unwrap();
        assert_eq!(wave_names(&plan), vec!["wave0"]);
    }

    #[test]
    fn test_kustomization_selects_single_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(KUSTOMIZATION_FILE), "resources: []\n").unwrap();
        fs::create_dir(dir.path().join("wave0")).unwrap();

        let plan = discover(dir.path()).unwrap();
        assert_eq!(
            plan,
            ApplyPlan::Single {
                path: dir.path().to_path_buf()
            }
        );
        assert_eq!(plan.apply_count(), 1);
    }

    #[test]
    fn test_no_waves_is_empty_plan() {
        let dir = TempDir::new().unwrap();
        let plan = discover(dir.path()).unwrap();
        assert_eq!(plan, ApplyPlan::Waves { waves: vec![] });
        assert_eq!(plan.apply_count(), 0);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = discover(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CoreError::ClusterRootNotFound { .. }));
    }

    #[test]
    fn test_wave_load_manifest() {
        let dir = TempDir::new().unwrap();
        let wave_dir = dir.path().join("wave0");
        fs::create_dir(&wave_dir).unwrap();

        let wave = Wave {
            index: 0,
            name: "wave0".to_string(),
            path: wave_dir.clone(),
        };
        assert!(wave.load_manifest().unwrap().is_empty());

        fs::write(wave_dir.join("wave.yaml"), "hooks:\n  postApply:\n    waitForCRDs: [x.io]\n")
            .unwrap();
        assert!(!wave.load_manifest().unwrap().is_empty());
    }
}
