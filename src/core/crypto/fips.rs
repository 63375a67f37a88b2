//! Process-wide FIPS mode switch.
//!
//! The flag is captured on first observation and stable afterwards;
//! enabling it after any crypto call has happened is a no-op.

use std::sync::OnceLock;

use crate::error::CryptoError;

static FIPS_MODE: OnceLock<bool> = OnceLock::new();

/// Enable FIPS mode. Must be called before any crypto operation.
pub fn enable() {
    let _ = FIPS_MODE.set(true);
}

/// Whether FIPS mode is active.
pub fn enabled() -> bool {
    *FIPS_MODE.get_or_init(|| false)
}

/// Refuse a non-FIPS algorithm when the mode is active.
pub fn guard(algorithm: &'static str) -> Result<(), CryptoError> {
    if enabled() {
        return Err(CryptoError::FipsRefused(algorithm));
    }
    Ok(())
}
