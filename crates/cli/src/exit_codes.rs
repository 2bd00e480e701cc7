//! CLI Exit Code Registry
//!
//! The single list of exit codes `pgrid` can return. Scripts rely on
//! them, so codes are never renumbered.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unreadable input file)        |
//! | 3    | Battle config failed to parse or validate            |
//! | 4    | Extraction payload or catalog is malformed           |
//! | 5    | Output could not be generated or written             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map the error onto it in `CliError`

use pricegrid_io::IoError;
use pricegrid_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input file.
pub const EXIT_USAGE: u8 = 2;

/// The battle config does not parse, or fails validation.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// An extraction payload (or the reference catalog) is not an accepted shape.
pub const EXIT_PAYLOAD_INVALID: u8 = 4;

/// The workbook or JSON output could not be produced or written.
pub const EXIT_WRITE_FAILED: u8 = 5;

/// Map an IO-layer error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } => EXIT_USAGE,
        IoError::Payload { .. } => EXIT_PAYLOAD_INVALID,
        IoError::Write { .. } | IoError::Xlsx(_) | IoError::Json(_) => EXIT_WRITE_FAILED,
    }
}

/// Map a reconciliation error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::DuplicateSource(_)
        | ReconError::InvalidColor { .. }
        | ReconError::NoSources => EXIT_CONFIG_INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONFIG_INVALID,
            EXIT_PAYLOAD_INVALID,
            EXIT_WRITE_FAILED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn io_errors_map_by_domain() {
        let read = IoError::Read { path: "a".into(), message: "gone".into() };
        let payload = IoError::Payload { source: "a".into(), message: "bad".into() };
        assert_eq!(io_exit_code(&read), EXIT_USAGE);
        assert_eq!(io_exit_code(&payload), EXIT_PAYLOAD_INVALID);
        assert_eq!(io_exit_code(&IoError::Xlsx("x".into())), EXIT_WRITE_FAILED);
    }

    #[test]
    fn recon_errors_are_config_errors() {
        assert_eq!(recon_exit_code(&ReconError::DuplicateSource("A".into())), EXIT_CONFIG_INVALID);
        assert_eq!(recon_exit_code(&ReconError::NoSources), EXIT_CONFIG_INVALID);
    }
}
