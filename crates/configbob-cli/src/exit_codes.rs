//! Standard exit codes for CLI operations

/// General error - invalid command line
pub const ERROR: i32 = 1;

/// Configuration error - bad data file, no source folder, secret backend setup
pub const CONFIG_ERROR: i32 = 2;

/// Template error - template rendering failed
pub const TEMPLATE_ERROR: i32 = 3;

/// IO error - unreadable source tree, unwritable output
pub const IO_ERROR: i32 = 5;
