//! Bundle template model, traversal and output assembly.

pub mod package;
pub mod template;
pub mod visitor;

pub use package::{pack, type_name, unpack, Bundle, Kv, Package, SecretChain};
pub use template::{BundleTemplate, SecretSuffix, Selector};
pub use visitor::visit;
