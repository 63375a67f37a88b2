//! Ordered secret reader chain.
//!
//! The `secret()` template function probes each configured reader in
//! order and takes the first non-erroring result.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, TemplateError};

/// Secret material returned by a reader.
pub type SecretData = BTreeMap<String, serde_json::Value>;

/// External lookup contract: path → key/value material.
///
/// Readers must tolerate serial reuse; the engine never calls a reader
/// concurrently within a single rendering.
pub trait SecretReader: Send + Sync {
    fn read(&self, path: &str) -> Result<SecretData>;
}

impl<F> SecretReader for F
where
    F: Fn(&str) -> Result<SecretData> + Send + Sync,
{
    fn read(&self, path: &str) -> Result<SecretData> {
        self(path)
    }
}

/// Probe `readers` in order, returning the first non-erroring result.
pub fn resolve(readers: &[Arc<dyn SecretReader>], path: &str) -> Result<SecretData> {
    for (index, reader) in readers.iter().enumerate() {
        match reader.read(path) {
            Ok(data) => {
                trace!(path, index, "secret resolved");
                return Ok(data);
            }
            Err(_) => continue,
        }
    }
    Err(TemplateError::SecretLookup(path.to_string()).into())
}
