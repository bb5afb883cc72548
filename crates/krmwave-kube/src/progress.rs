//! Progress reporting for wave orchestration
//!
//! Provides visual feedback on stderr while a cluster is being deployed:
//! - Plan header (strategy and wave count)
//! - Wave start / apply results
//! - Hook wait start and outcome with timing
//! - Final summary

use std::io::{self, Write};
use std::time::Duration;

use console::style;
use krmwave_core::{HookType, Wave};

/// Progress reporter for orchestration runs
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    /// Suppress all output
    quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Create a reporter that prints nothing
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn line(&self, text: std::fmt::Arguments<'_>) {
        if !self.quiet {
            let _ = writeln!(io::stderr(), "{}", text);
        }
    }

    /// Print the plan header for a cluster
    pub fn plan_header(&self, cluster: &str, strategy: &str, waves: usize) {
        self.line(format_args!(
            "{} Deploying cluster {} ({} strategy, {} wave{})",
            style("→").blue().bold(),
            style(cluster).cyan(),
            strategy,
            waves,
            if waves == 1 { "" } else { "s" }
        ));
    }

    /// Print wave header
    pub fn wave_start(&self, wave: &Wave, total: usize) {
        self.line(format_args!(
            "\n{} Wave {}/{}: {}",
            style("▶").cyan().bold(),
            wave.index + 1,
            total,
            style(wave.path.display()).bold()
        ));
    }

    /// Print apply result for a directory
    pub fn applied(&self, target: &str, duration: Duration) {
        self.line(format_args!(
            "  {} Applied {} ({:.1}s)",
            style("✓").green(),
            target,
            duration.as_secs_f64()
        ));
    }

    /// Print hook wait start
    pub fn wait_start(&self, hook_type: HookType, kind: &str, target: &str) {
        self.line(format_args!(
            "  {} Hook [{}] waiting for {} {}",
            style("⟳").cyan(),
            hook_type,
            kind,
            style(target).cyan()
        ));
    }

    /// Print hook wait result
    pub fn wait_result(&self, target: &str, success: bool, duration: Duration) {
        let symbol = if success {
            style("✓").green()
        } else {
            style("✗").red()
        };

        self.line(format_args!(
            "  {} {} ({:.1}s)",
            symbol,
            target,
            duration.as_secs_f64()
        ));
    }

    /// Print overall summary for a run that took `elapsed`
    pub fn print_summary(
        &self,
        cluster: &str,
        waves_applied: usize,
        success: bool,
        elapsed: Duration,
    ) {
        let elapsed = elapsed.as_secs_f64();
        if success {
            self.line(format_args!(
                "\n{} Cluster {} deployed ({} apply call{}, {:.1}s)",
                style("✓").green().bold(),
                cluster,
                waves_applied,
                if waves_applied == 1 { "" } else { "s" },
                elapsed
            ));
        } else {
            self.line(format_args!(
                "\n{} Cluster {} failed after {} wave{} ({:.1}s)",
                style("✗").red().bold(),
                cluster,
                waves_applied,
                if waves_applied == 1 { "" } else { "s" },
                elapsed
            ));
        }
    }

    /// Print an info message
    pub fn info(&self, msg: &str) {
        self.line(format_args!("  {} {}", style("ℹ").blue(), msg));
    }

    /// Print success message
    pub fn success(&self, msg: &str) {
        self.line(format_args!("  {} {}", style("✓").green(), msg));
    }
}
