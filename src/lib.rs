//! Smelter - materializes secret bundles from declarative templates.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── error            # Error taxonomy
//! └── core/            # Core library components
//!     ├── cso          # Cloud Secret Organization path taxonomy
//!     ├── values       # Layered value-source merger
//!     ├── files        # Read-only file bundle
//!     ├── resolver     # Ordered secret reader chain
//!     ├── engine       # Sandboxed template engine + function library
//!     ├── crypto       # Key generation, encoders, JWS/JWE
//!     └── bundle       # Template model, visitor, assembler
//! ```
//!
//! # Features
//!
//! - Rigid six-ring secret path taxonomy with bidirectional decomposition
//! - Deterministic, strict-mode template rendering with a frozen function set
//! - Password, diceware, symmetric and asymmetric key generation
//! - PEM/JWK/SSH/bech32 encoders, JWS signing, JWE passphrase encryption
//! - Concurrent producer/consumer bundle assembly
//!
//! The crate is a library: command-line dispatch, remote secret stores, and
//! bundle persistence are the concern of downstream collaborators.

pub mod core;
pub mod error;

pub use crate::core::bundle::{visit, Bundle, BundleTemplate, Package};
pub use crate::core::engine::EngineContext;
pub use crate::error::{Error, Result};
