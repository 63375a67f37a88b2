//! Layered value-source merger.
//!
//! Folds value files and inline assignments into one nested mapping with
//! last-wins deep-merge semantics. Application order: files in listing
//! order, then `set`, then `set_string`, then `set_file`.

mod parser;
mod set;

pub use parser::{Parser, ParserRegistry};

use std::io::Read;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ValueError};

/// Inputs to a merge call.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Value file entries, `path[:type[:prefix]]`. `-` reads stdin as YAML.
    pub value_files: Vec<String>,
    /// `--set` expressions, scalar coercion applied.
    pub set_values: Vec<String>,
    /// `--set-string` expressions, values stay strings.
    pub set_string_values: Vec<String>,
    /// `--set-file` expressions, `key=path`, value is the file's contents.
    pub set_file_values: Vec<String>,
}

/// Merge all configured sources with the default parser registry.
pub fn merge(options: &MergeOptions) -> Result<Value> {
    merge_with(&ParserRegistry::default(), options)
}

/// Merge all configured sources using an explicit parser registry.
pub fn merge_with(registry: &ParserRegistry, options: &MergeOptions) -> Result<Value> {
    let mut accumulator = Value::Object(Map::new());

    for entry in &options.value_files {
        let parsed = load_value_file(registry, entry)?;
        debug!(entry, "merged value file");
        deep_merge(&mut accumulator, parsed);
    }

    let root = accumulator
        .as_object_mut()
        .expect("accumulator is always an object");

    for expr in &options.set_values {
        set::apply(root, expr, true)?;
    }
    for expr in &options.set_string_values {
        set::apply(root, expr, false)?;
    }
    for expr in &options.set_file_values {
        let (key, path) = expr
            .split_once('=')
            .ok_or_else(|| ValueError::SetSyntax(format!("missing '=' in {expr:?}")))?;
        let contents = std::fs::read_to_string(expand_home(path))?;
        set::apply_value(root, key, Value::String(contents))?;
    }

    Ok(accumulator)
}

/// Deep merge `src` into `dst`. Maps merge recursively; everything else
/// is replaced by `src`.
pub fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, src_value) in src_map {
                match dst_map.get_mut(&key) {
                    Some(dst_value) => deep_merge(dst_value, src_value),
                    None => {
                        dst_map.insert(key, src_value);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

fn load_value_file(registry: &ParserRegistry, entry: &str) -> Result<Value> {
    let (path, type_hint, prefix) = split_entry(entry);

    let (data, hint) = if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        (buf, type_hint.unwrap_or("yaml".to_string()))
    } else {
        let resolved = expand_home(&path);
        let metadata = std::fs::metadata(&resolved)?;
        if !metadata.is_file() {
            return Err(ValueError::NotRegularFile(path.clone()).into());
        }
        let hint = type_hint.unwrap_or_else(|| {
            resolved
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("yaml")
                .to_string()
        });
        (std::fs::read(&resolved)?, hint)
    };

    let parsed = registry.get(&hint)?.unmarshal(&data)?;

    match prefix {
        Some(prefix) => {
            let mut wrapped = Map::new();
            wrapped.insert(prefix, parsed);
            Ok(Value::Object(wrapped))
        }
        None => Ok(parsed),
    }
}

/// Split `path[:type[:prefix]]`.
fn split_entry(entry: &str) -> (String, Option<String>, Option<String>) {
    let mut parts = entry.splitn(3, ':');
    let path = parts.next().unwrap_or_default().to_string();
    let type_hint = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let prefix = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    (path, type_hint, prefix)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn deep_merge_recurses_and_overrides() {
        let mut dst = serde_json::json!({"a": {"b": 1, "keep": true}, "s": "old"});
        deep_merge(
            &mut dst,
            serde_json::json!({"a": {"b": 2}, "s": "new", "extra": [1]}),
        );
        assert_eq!(dst["a"]["b"], 2);
        assert_eq!(dst["a"]["keep"], true);
        assert_eq!(dst["s"], "new");
        assert_eq!(dst["extra"][0], 1);
    }

    #[test]
    fn scalar_collision_is_last_wins() {
        let mut dst = serde_json::json!({"a": {"b": 1}});
        deep_merge(&mut dst, serde_json::json!({"a": "flat"}));
        assert_eq!(dst["a"], "flat");
    }

    #[test]
    fn entry_splitting() {
        assert_eq!(
            split_entry("values.yaml"),
            ("values.yaml".into(), None, None)
        );
        assert_eq!(
            split_entry("data.cfg:toml:app"),
            ("data.cfg".into(), Some("toml".into()), Some("app".into()))
        );
    }

    #[test]
    fn merge_files_then_sets() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        std::fs::write(&base, "db:\n  host: localhost\n  port: 5432\n").unwrap();
        let over = dir.path().join("override.json");
        std::fs::write(&over, r#"{"db": {"port": 6432}}"#).unwrap();

        let options = MergeOptions {
            value_files: vec![
                base.to_string_lossy().into_owned(),
                over.to_string_lossy().into_owned(),
            ],
            set_values: vec!["db.user=admin".into()],
            set_string_values: vec!["db.port_label=6432".into()],
            ..Default::default()
        };
        let merged = merge(&options).unwrap();
        assert_eq!(merged["db"]["host"], "localhost");
        assert_eq!(merged["db"]["port"], 6432);
        assert_eq!(merged["db"]["user"], "admin");
        assert_eq!(merged["db"]["port_label"], "6432");
    }

    #[test]
    fn merge_with_prefix_and_type_hint() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("conf.data");
        std::fs::write(&file, "[server]\nport = 80\n").unwrap();

        let entry = format!("{}:toml:app", file.to_string_lossy());
        let merged = merge(&MergeOptions {
            value_files: vec![entry],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(merged["app"]["server"]["port"], 80);
    }

    #[test]
    fn set_file_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cert.pem");
        let mut f = std::fs::File::create(&file).unwrap();
        writeln!(f, "PEM BODY").unwrap();

        let merged = merge(&MergeOptions {
            set_file_values: vec![format!("tls.cert={}", file.to_string_lossy())],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(merged["tls"]["cert"], "PEM BODY\n");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = merge(&MergeOptions {
            value_files: vec!["/definitely/not/here.yaml".into()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
