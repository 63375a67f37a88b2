//! Bundle output model and the KV value codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};

/// The result of one materialization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bundle {
    pub packages: Vec<Package>,
}

/// One CSO path with its secret chain and user metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    pub secrets: SecretChain,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Versioned envelope carrying the KV set of a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretChain {
    pub version: u32,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub data: Vec<Kv>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kv {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Vec<u8>,
}

/// Serialize a value into a self-describing byte string: a big-endian
/// length prefix followed by canonical JSON.
pub fn pack(value: &serde_json::Value) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(value).map_err(|e| TemplateError::Content(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| TemplateError::Content("packed value exceeds 4 GiB".to_string()))?;
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Inverse of [`pack`].
pub fn unpack(bytes: &[u8]) -> Result<serde_json::Value> {
    if bytes.len() < 4 {
        return Err(TemplateError::Content("packed value is truncated".to_string()).into());
    }
    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let body = &bytes[4..];
    if body.len() != len {
        return Err(TemplateError::Content("packed value length mismatch".to_string()).into());
    }
    serde_json::from_slice(body).map_err(|e| TemplateError::Content(e.to_string()).into())
}

/// Runtime type name recorded next to each KV value.
pub fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
