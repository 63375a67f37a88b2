//! String and serialization filters for the template function library.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use minijinja::value::Value;
use minijinja::{Error, ErrorKind};

fn invalid(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::InvalidOperation, e.to_string())
}

pub fn indent(text: String, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn nindent(text: String, width: usize) -> String {
    format!("\n{}", indent(text, width))
}

pub fn quote(value: String) -> String {
    // serde_json escaping matches what a JSON/YAML consumer expects.
    serde_json::to_string(&value).unwrap_or_default()
}

pub fn unquote(value: String) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return serde_json::from_str(trimmed).map_err(invalid);
    }
    Ok(value)
}

pub fn json_escape(value: String) -> String {
    let quoted = quote(value);
    quoted[1..quoted.len() - 1].to_string()
}

pub fn json_unescape(value: String) -> Result<String, Error> {
    serde_json::from_str(&format!("\"{value}\"")).map_err(invalid)
}

pub fn b64enc(value: Value) -> Result<String, Error> {
    Ok(BASE64.encode(raw_bytes(&value)?))
}

pub fn b64dec(value: String) -> Result<String, Error> {
    let bytes = BASE64.decode(value.as_bytes()).map_err(invalid)?;
    String::from_utf8(bytes).map_err(invalid)
}

pub fn to_yaml(value: Value) -> Result<String, Error> {
    let text = serde_yaml::to_string(&value).map_err(invalid)?;
    Ok(text.trim_end_matches('\n').to_string())
}

pub fn from_yaml(value: String) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_yaml::from_str(&value).map_err(invalid)?;
    if !parsed.is_object() {
        return Err(invalid("expected a yaml mapping"));
    }
    Ok(Value::from_serialize(&parsed))
}

pub fn from_yaml_array(value: String) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_yaml::from_str(&value).map_err(invalid)?;
    if !parsed.is_array() {
        return Err(invalid("expected a yaml sequence"));
    }
    Ok(Value::from_serialize(&parsed))
}

pub fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(invalid)
}

pub fn from_json(value: String) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_json::from_str(&value).map_err(invalid)?;
    if !parsed.is_object() {
        return Err(invalid("expected a json object"));
    }
    Ok(Value::from_serialize(&parsed))
}

pub fn from_json_array(value: String) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_json::from_str(&value).map_err(invalid)?;
    if !parsed.is_array() {
        return Err(invalid("expected a json array"));
    }
    Ok(Value::from_serialize(&parsed))
}

pub fn to_toml(value: Value) -> Result<String, Error> {
    let json: serde_json::Value = serde_json::to_value(&value).map_err(invalid)?;
    toml::to_string(&json).map_err(invalid)
}

/// Deep-merge `overlay` into `base`; the overlay wins on conflicts.
pub fn merge(base: Value, overlay: Value) -> Result<Value, Error> {
    let mut merged: serde_json::Value = serde_json::to_value(&base).map_err(invalid)?;
    let overlay: serde_json::Value = serde_json::to_value(&overlay).map_err(invalid)?;
    crate::core::values::deep_merge(&mut merged, overlay);
    Ok(Value::from_serialize(&merged))
}

pub fn bech32enc(hrp: String, value: Value) -> Result<String, Error> {
    let hrp = bech32::Hrp::parse(&hrp).map_err(invalid)?;
    bech32::encode::<bech32::Bech32>(hrp, &raw_bytes(&value)?).map_err(invalid)
}

/// Decodes to `[hrp, data]`, data as a UTF-8 string.
pub fn bech32dec(value: String) -> Result<Value, Error> {
    let (hrp, data) = bech32::decode(&value).map_err(invalid)?;
    let data = String::from_utf8(data).map_err(invalid)?;
    Ok(Value::from(vec![hrp.to_string(), data]))
}

fn raw_bytes(value: &Value) -> Result<Vec<u8>, Error> {
    if let Some(bytes) = value.as_bytes() {
        return Ok(bytes.to_vec());
    }
    if let Some(text) = value.as_str() {
        return Ok(text.as_bytes().to_vec());
    }
    Err(invalid("expected a string or bytes"))
}
