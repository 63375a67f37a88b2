//! Core library components.
//!
//! Reusable business logic for path naming, value merging, template
//! rendering, key generation, and bundle assembly.

pub mod bundle;
pub mod crypto;
pub mod cso;
pub mod engine;
pub mod files;
pub mod resolver;
pub mod values;
