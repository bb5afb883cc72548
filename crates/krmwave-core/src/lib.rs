//! krmwave Core - Core types for wave-based manifest deployment
//!
//! This crate provides the foundational types used throughout krmwave:
//! - `WaveManifest`: The per-wave `wave.yaml` document and its hooks
//! - `Wave` / `ApplyPlan`: Wave directories discovered under a cluster root
//! - `Config`: Invocation parameters resolved once at startup

pub mod config;
pub mod error;
pub mod manifest;
pub mod wave;

pub use config::{ClusterTarget, Config, RegistryConfig};
pub use error::{CoreError, Result};
pub use manifest::{HookSet, HookType, RolloutRef, WAVE_MANIFEST_FILE, WaveHooks, WaveManifest};
pub use wave::{ApplyPlan, KUSTOMIZATION_FILE, WAVE_DIR_PREFIX, Wave, discover};
