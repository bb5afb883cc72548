//! CLI commands

pub mod apply;
pub mod cluster;
pub mod plan;
pub mod registry;

use krmwave_kube::ProgressReporter;

use crate::settings::GlobalArgs;

/// Progress reporter honoring `--quiet`
pub(crate) fn progress(global: &GlobalArgs) -> ProgressReporter {
    if global.quiet {
        ProgressReporter::quiet()
    } else {
        ProgressReporter::new()
    }
}
