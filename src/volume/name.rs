//! Mount point name canonicalization
//!
//! Every requested name goes through [`sanitize`] before it is joined onto
//! the mount base directory, so a name can never escape the base or collide
//! with path separators.

use crate::error::{MountError, Result};

/// Character substituted for anything outside ASCII letters and digits.
pub const FILLER: char = '_';

/// Turn a requested name into a filesystem-safe mount point token.
///
/// ASCII alphanumerics are kept, every other character becomes [`FILLER`].
/// Runs of filler are not collapsed. A name that is empty, or that contains
/// no letter or digit at all, is rejected.
pub fn sanitize(raw: &str) -> Result<String> {
    let token: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { FILLER })
        .collect();

    if token.chars().all(|c| c == FILLER) {
        return Err(MountError::InvalidName(raw.to_string()));
    }

    Ok(token)
}
