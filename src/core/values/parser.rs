//! Value-file parser contract and built-in implementations.
//!
//! The merger only consumes the [`Parser`] trait; formats without a
//! built-in (XML, HOCON, HCL) are known names that surface `ParserError`
//! until an external parser is registered for them.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValueError;

/// Decodes raw value-file bytes into a JSON tree.
pub trait Parser: Send + Sync {
    fn unmarshal(&self, data: &[u8]) -> Result<Value, ValueError>;
}

pub struct YamlParser;

impl Parser for YamlParser {
    fn unmarshal(&self, data: &[u8]) -> Result<Value, ValueError> {
        serde_yaml::from_slice(data).map_err(|e| ValueError::Parser(e.to_string()))
    }
}

pub struct JsonParser;

impl Parser for JsonParser {
    fn unmarshal(&self, data: &[u8]) -> Result<Value, ValueError> {
        serde_json::from_slice(data).map_err(|e| ValueError::Parser(e.to_string()))
    }
}

pub struct TomlParser;

impl Parser for TomlParser {
    fn unmarshal(&self, data: &[u8]) -> Result<Value, ValueError> {
        let text = std::str::from_utf8(data).map_err(|e| ValueError::Parser(e.to_string()))?;
        toml::from_str(text).map_err(|e| ValueError::Parser(e.to_string()))
    }
}

/// Format names the merger recognizes but has no built-in parser for.
const EXTERNAL_FORMATS: &[&str] = &["xml", "hocon", "hcl", "hcl1", "hcl2", "tf", "tfvars"];

/// Type-hint dispatch table for value files.
pub struct ParserRegistry {
    parsers: BTreeMap<String, Box<dyn Parser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = ParserRegistry {
            parsers: BTreeMap::new(),
        };
        registry.register(&["yaml", "yml"], Box::new(YamlParser));
        registry.register(&["json"], Box::new(JsonParser));
        registry.register(&["toml"], Box::new(TomlParser));
        registry
    }
}

impl ParserRegistry {
    /// Register a parser for one or more type hints / extensions.
    pub fn register(&mut self, hints: &[&str], parser: Box<dyn Parser>) {
        let parser: std::sync::Arc<dyn Parser> = std::sync::Arc::from(parser);
        for hint in hints {
            self.parsers
                .insert(hint.to_string(), Box::new(SharedParser(parser.clone())));
        }
    }

    /// Look up the parser for a type hint.
    pub fn get(&self, hint: &str) -> Result<&dyn Parser, ValueError> {
        if let Some(parser) = self.parsers.get(hint) {
            return Ok(parser.as_ref());
        }
        if EXTERNAL_FORMATS.contains(&hint) {
            return Err(ValueError::Parser(format!(
                "no parser registered for {hint:?}"
            )));
        }
        Err(ValueError::UnsupportedFormat(hint.to_string()))
    }
}

impl std::fmt::Debug for dyn Parser + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Parser")
    }
}

struct SharedParser(std::sync::Arc<dyn Parser>);

impl Parser for SharedParser {
    fn unmarshal(&self, data: &[u8]) -> Result<Value, ValueError> {
        self.0.unmarshal(data)
    }
}
