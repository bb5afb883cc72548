//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - missing cluster name, bad config file or flag
pub const CONFIG_ERROR: i32 = 2;

/// Manifest error - invalid wave.yaml, malformed hook, missing cluster root
pub const MANIFEST_ERROR: i32 = 3;

/// Tool error - kubectl or k3d failed or could not be run
pub const TOOL_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Timeout - a hook condition did not hold within the wait budget
pub const TIMEOUT: i32 = 6;

/// Usage error - invalid command-line arguments (EX_USAGE)
pub const USAGE_ERROR: i32 = 64;
