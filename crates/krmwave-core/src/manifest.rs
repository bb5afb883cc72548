//! Wave manifest (`wave.yaml`) parsing
//!
//! Each wave directory may carry a `wave.yaml` declaring conditions to wait on
//! before and after the wave's manifests are applied:
//!
//! ```yaml
//! hooks:
//!   preApply:
//!     waitForCRDs:
//!       - certificates.cert-manager.io
//!   postApply:
//!     waitForRollouts:
//!       - cert-manager/cert-manager-webhook
//! ```
//!
//! The `hooks` record may also be nested under `spec`, for documents written
//! as `apiVersion`/`kind`/`spec` objects. A hook type may also be given as a
//! list of single-condition entries:
//!
//! ```yaml
//! spec:
//!   hooks:
//!     preApply:
//!       - waitForCRD:
//!           name: certificates.cert-manager.io
//!       - waitForRollout:
//!           name: cert-manager/cert-manager-webhook
//! ```
//!
//! Every level is optional; a missing file, hook type or wait list all mean
//! "nothing to wait for".

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// File name of the wave manifest inside a wave directory
pub const WAVE_MANIFEST_FILE: &str = "wave.yaml";

static EMPTY_HOOK_SET: HookSet = HookSet {
    wait_for_crds: None,
    wait_for_rollouts: None,
};

/// When a set of hooks runs relative to applying the wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookType {
    /// Before the wave's manifests are applied
    PreApply,
    /// After the wave's manifests are applied
    PostApply,
}

impl HookType {
    /// All hook types, in execution order
    pub fn all() -> &'static [HookType] {
        &[HookType::PreApply, HookType::PostApply]
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookType::PreApply => "preApply",
            HookType::PostApply => "postApply",
        };
        write!(f, "{}", s)
    }
}

/// Conditions declared for one hook type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HookSet {
    /// CRD names that must exist and be Established
    #[serde(rename = "waitForCRDs", default, skip_serializing_if = "Option::is_none")]
    pub wait_for_crds: Option<Vec<String>>,

    /// `<namespace>/<deployment>` identifiers whose rollout must complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_rollouts: Option<Vec<String>>,
}

impl HookSet {
    /// CRD names to wait for, in declaration order
    pub fn crds(&self) -> &[String] {
        self.wait_for_crds.as_deref().unwrap_or(&[])
    }

    /// Rollout identifiers to wait for, in declaration order
    pub fn rollouts(&self) -> &[String] {
        self.wait_for_rollouts.as_deref().unwrap_or(&[])
    }

    /// Total number of wait conditions
    pub fn len(&self) -> usize {
        self.crds().len() + self.rollouts().len()
    }

    /// Whether there is nothing to wait for
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every rollout identifier is well formed
    pub fn validate(&self) -> Result<()> {
        for rollout in self.rollouts() {
            RolloutRef::parse(rollout)?;
        }
        Ok(())
    }
}

/// One entry of the list form of a hook type
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct HookEntry {
    #[serde(rename = "waitForCRD", default)]
    wait_for_crd: Option<NamedTarget>,
    #[serde(default)]
    wait_for_rollout: Option<NamedTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamedTarget {
    name: String,
}

/// Accept a hook type either as a `HookSet` record or as a list of entries
fn record_or_list<'de, D>(deserializer: D) -> std::result::Result<Option<HookSet>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let entries = match value {
        serde_yaml::Value::Sequence(entries) => entries,
        record => {
            return serde_yaml::from_value(record)
                .map(Some)
                .map_err(D::Error::custom);
        }
    };

    let mut set = HookSet::default();
    for entry in entries {
        let entry: HookEntry = serde_yaml::from_value(entry).map_err(D::Error::custom)?;
        match (entry.wait_for_crd, entry.wait_for_rollout) {
            (Some(crd), None) => set.wait_for_crds.get_or_insert_with(Vec::new).push(crd.name),
            (None, Some(rollout)) => set
                .wait_for_rollouts
                .get_or_insert_with(Vec::new)
                .push(rollout.name),
            _ => {
                return Err(D::Error::custom(
                    "each hook entry needs exactly one of waitForCRD, waitForRollout",
                ));
            }
        }
    }
    Ok(Some(set))
}

/// Hook sets keyed by hook type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WaveHooks {
    #[serde(
        default,
        deserialize_with = "record_or_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_apply: Option<HookSet>,

    #[serde(
        default,
        deserialize_with = "record_or_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_apply: Option<HookSet>,
}

impl WaveHooks {
    pub fn get(&self, hook_type: HookType) -> Option<&HookSet> {
        match hook_type {
            HookType::PreApply => self.pre_apply.as_ref(),
            HookType::PostApply => self.post_apply.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct WaveSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hooks: Option<WaveHooks>,
}

/// Parsed `wave.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hooks: Option<WaveHooks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    spec: Option<WaveSpec>,
}

impl WaveManifest {
    /// Parse manifest content; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidWaveManifest {
            path: path.to_path_buf(),
            message,
        };

        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?;

        // Empty or comment-only document
        if value.is_null() {
            return Ok(Self::default());
        }

        let manifest: Self = serde_yaml::from_value(value).map_err(|e| invalid(e.to_string()))?;

        let nested = manifest.spec.as_ref().and_then(|s| s.hooks.as_ref());
        if manifest.hooks.is_some() && nested.is_some() {
            return Err(invalid(
                "hooks declared both at top level and under spec".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Load the manifest of a wave directory, `None` if the directory has none
    pub fn load_optional(wave_dir: &Path) -> Result<Option<Self>> {
        let path = wave_dir.join(WAVE_MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, &path).map(Some)
    }

    /// Load the manifest of a wave directory, treating a missing file as empty
    pub fn load(wave_dir: &Path) -> Result<Self> {
        Ok(Self::load_optional(wave_dir)?.unwrap_or_default())
    }

    /// The declared hooks, wherever they were placed in the document
    pub fn hooks(&self) -> Option<&WaveHooks> {
        self.hooks
            .as_ref()
            .or_else(|| self.spec.as_ref().and_then(|s| s.hooks.as_ref()))
    }

    /// Hook set for a hook type; empty when any level is missing
    pub fn hook_set(&self, hook_type: HookType) -> &HookSet {
        self.hooks()
            .and_then(|h| h.get(hook_type))
            .unwrap_or(&EMPTY_HOOK_SET)
    }

    /// Whether no hook type declares any condition
    pub fn is_empty(&self) -> bool {
        HookType::all()
            .iter()
            .all(|t| self.hook_set(*t).is_empty())
    }
}

/// A `<namespace>/<deployment>` rollout identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RolloutRef {
    pub namespace: String,
    pub name: String,
}

impl RolloutRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `<namespace>/<deployment>`
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || CoreError::MalformedHook {
            message: format!(
                "invalid rollout '{}', expected '<namespace>/<deployment>'",
                s
            ),
        };

        let (namespace, name) = s.split_once('/').ok_or_else(malformed)?;
        let (namespace, name) = (namespace.trim(), name.trim());

        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(malformed());
        }

        Ok(Self::new(namespace, name))
    }
}

impl FromStr for RolloutRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RolloutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> Result<WaveManifest> {
        WaveManifest::parse(yaml, Path::new("wave0/wave.yaml"))
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(
            r#"
hooks:
  preApply:
    waitForCRDs:
      - certificates.cert-manager.io
      - issuers.cert-manager.io
  postApply:
    waitForRollouts:
      - cert-manager/cert-manager-webhook
"#,
        )
        .unwrap();

        let pre = manifest.hook_set(HookType::PreApply);
        assert_eq!(
            pre.crds(),
            ["certificates.cert-manager.io", "issuers.cert-manager.io"]
        );
        assert!(pre.rollouts().is_empty());

        let post = manifest.hook_set(HookType::PostApply);
        assert!(post.crds().is_empty());
        assert_eq!(post.rollouts(), ["cert-manager/cert-manager-webhook"]);
        assert!(!manifest.is_empty());
    }

    #[test]
    fn test_missing_levels_default_to_empty() {
        let manifest = parse("hooks:\n  preApply: {}\n").unwrap();
        assert!(manifest.hook_set(HookType::PreApply).is_empty());
        assert!(manifest.hook_set(HookType::PostApply).is_empty());

        let manifest = parse("hooks: {}\n").unwrap();
        assert!(manifest.is_empty());

        let manifest = parse("apiVersion: krmwave/v1\nkind: Wave\n").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_null_lists_default_to_empty() {
        let manifest = parse("hooks:\n  postApply:\n    waitForCRDs:\n").unwrap();
        assert!(manifest.hook_set(HookType::PostApply).crds().is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# nothing to wait for\n").unwrap().is_empty());
    }

    #[test]
    fn test_hooks_under_spec() {
        let manifest = parse(
            r#"
apiVersion: krmwave/v1
kind: Wave
spec:
  hooks:
    postApply:
      waitForCRDs: [widgets.example.com]
"#,
        )
        .unwrap();

        assert_eq!(
            manifest.hook_set(HookType::PostApply).crds(),
            ["widgets.example.com"]
        );
    }

    #[test]
    fn test_list_form_under_spec() {
        let manifest = parse(
            r#"
spec:
  hooks:
    preApply:
      - waitForCRD:
          name: certificates.cert-manager.io
      - waitForRollout:
          name: cert-manager/cert-manager-webhook
      - waitForCRD:
          name: issuers.cert-manager.io
"#,
        )
        .unwrap();

        let pre = manifest.hook_set(HookType::PreApply);
        assert_eq!(
            pre.crds(),
            ["certificates.cert-manager.io", "issuers.cert-manager.io"]
        );
        assert_eq!(pre.rollouts(), ["cert-manager/cert-manager-webhook"]);
        assert!(manifest.hook_set(HookType::PostApply).is_empty());
    }

    #[test]
    fn test_list_form_rejects_unknown_entries() {
        let err = parse("spec:
  hooks:
    preApply:
      - waitForJob:
          name: x
")
            .unwrap_err();
        match err {
            CoreError::InvalidWaveManifest { message, .. } => {
                assert!(message.contains("waitForJob"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse(
            "hooks:
  postApply:
    - waitForCRD: {name: a}
      waitForRollout: {name: ns/b}
",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidWaveManifest { .. }));
    }

    #[test]
    fn test_hook_set_validate() {
        let manifest =
            parse("hooks:
  postApply:
    waitForRollouts: [ns/ok, missing-namespace]
")
                .unwrap();
        assert!(manifest.hook_set(HookType::PreApply).validate().is_ok());
        assert!(matches!(
            manifest.hook_set(HookType::PostApply).validate(),
            Err(CoreError::MalformedHook { .. })
        ));
    }

    #[test]
    fn test_hooks_declared_twice() {
        let err = parse(
            r#"
hooks:
  preApply:
    waitForCRDs: [a.example.com]
spec:
  hooks:
    preApply:
      waitForCRDs: [b.example.com]
"#,
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::InvalidWaveManifest { .. }));
    }

    #[test]
    fn test_unknown_hook_key_rejected() {
        let err = parse("hooks:\n  preApply:\n    waitForCRD: foo\n").unwrap_err();
        match err {
            CoreError::InvalidWaveManifest { path, message } => {
                assert_eq!(path, Path::new("wave0/wave.yaml"));
                assert!(message.contains("waitForCRD"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_hook_type_rejected() {
        let err = parse("hooks:\n  preapply:\n    waitForCRDs: [foo]\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidWaveManifest { .. }));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let err = parse("hooks:\n  preApply:\n    waitForCRDs: foo\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidWaveManifest { .. }));

        let err = parse("hooks: [1, 2\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidWaveManifest { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(WaveManifest::load_optional(dir.path()).unwrap().is_none());
        assert!(WaveManifest::load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(WAVE_MANIFEST_FILE),
            "hooks:\n  preApply:\n    waitForRollouts: [ns/dep]\n",
        )
        .unwrap();

        let manifest = WaveManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.hook_set(HookType::PreApply).rollouts(), ["ns/dep"]);
    }

    #[test]
    fn test_rollout_ref_parse() {
        let r = RolloutRef::parse("ns/dep").unwrap();
        assert_eq!(r.namespace, "ns");
        assert_eq!(r.name, "dep");
        assert_eq!(r.to_string(), "ns/dep");

        let r: RolloutRef = "kube-system/coredns".parse().unwrap();
        assert_eq!(r, RolloutRef::new("kube-system", "coredns"));
    }

    #[test]
    fn test_rollout_ref_malformed() {
        for input in ["dep", "", "/dep", "ns/", "a/b/c", " / "] {
            let err = RolloutRef::parse(input).unwrap_err();
            assert!(
                matches!(err, CoreError::MalformedHook { .. }),
                "expected malformed hook for {input:?}"
            );
        }
    }

    #[test]
    fn test_hook_type_display() {
        assert_eq!(HookType::PreApply.to_string(), "preApply");
        assert_eq!(HookType::PostApply.to_string(), "postApply");
    }
}
