//! Error types for bundle materialization.
//!
//! One top-level [`Error`] aggregates the domain sub-enums so callers can
//! match on the failure class without losing the underlying detail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// CSO path taxonomy failures.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("invalid path {path:?}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("unknown ring {0:?}")]
    UnknownRing(String),
}

impl PathError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        PathError::Invalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Template engine and visitor failures.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template rendering failed: {0}")]
    Render(String),

    #[error("selector is mandatory for {0} secrets")]
    MissingSelector(&'static str),

    #[error("selector value {0:?} rendered to an empty string")]
    EmptySelector(&'static str),

    #[error("invalid secret content: {0}")]
    Content(String),

    #[error("no value found for {0}")]
    SecretLookup(String),
}

/// Crypto toolkit failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("unsupported key kind {0:?}")]
    UnsupportedKey(String),

    #[error("{0} is disabled in FIPS mode")]
    FipsRefused(&'static str),

    #[error("pem passphrase must be at least 32 characters")]
    WeakPassphrase,

    #[error("key generation failed: {0}")]
    Generate(String),

    #[error("key encoding failed: {0}")]
    Encode(String),

    #[error("key decoding failed: {0}")]
    Decode(String),

    #[error("signing failed: {0}")]
    Sign(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Value merger and file bundle failures.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("unsupported value file format {0:?}")]
    UnsupportedFormat(String),

    #[error("parser error: {0}")]
    Parser(String),

    #[error("invalid set syntax: {0}")]
    SetSyntax(String),

    #[error("unsupported loader")]
    UnsupportedLoader,

    #[error("not a regular file: {0}")]
    NotRegularFile(String),
}
