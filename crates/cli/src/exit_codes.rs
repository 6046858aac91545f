//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 40-49   | run / validate   | Reconciliation run codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use diffh_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing subcommand.
/// clap exits with the same code on parse failure.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (40-49)
// =============================================================================

/// Config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 40;

/// Unreadable or malformed dataset, zone mismatch, output write failure.
pub const EXIT_RUNTIME: u8 = 41;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Parse { .. }
        | ReconError::ZoneMismatch { .. }
        | ReconError::Reprojection { .. }
        | ReconError::Io(_) => EXIT_RUNTIME,
    }
}
