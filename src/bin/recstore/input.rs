// src/bin/recstore/input.rs
use anyhow::{anyhow, Context, Result};
use bson::{Bson, Document};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Resolves a document argument: inline JSON, or `@path` to a JSON or YAML file.
pub fn load_document(arg: &str, extended_json: bool) -> Result<Document> {
    let value = match arg.strip_prefix('@') {
        Some(path) => read_file(Path::new(path))?,
        None => serde_json::from_str(arg).context("argument is not valid JSON")?,
    };
    to_document(value, extended_json)
}

fn read_file(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("{} is not valid YAML", path.display())),
        _ => serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display())),
    }
}

fn to_document(value: Value, extended_json: bool) -> Result<Document> {
    if extended_json {
        match Bson::try_from(value)? {
            Bson::Document(doc) => Ok(doc),
            other => Err(anyhow!("expected a document, got {:?}", other.element_type())),
        }
    } else {
        match plain_bson(value) {
            Bson::Document(doc) => Ok(doc),
            other => Err(anyhow!("expected a document, got {:?}", other.element_type())),
        }
    }
}

/// Converts plain JSON without interpreting `$`-prefixed wrappers: object keys
/// are kept literally.
fn plain_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map(Bson::Int32).unwrap_or(Bson::Int64(i))
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(plain_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(key, value)| (key, plain_bson(value)))
                .collect(),
        ),
    }
}

/// Renders a document as relaxed Extended JSON on one line.
pub fn render(doc: Document) -> String {
    Bson::Document(doc).into_relaxed_extjson().to_string()
}
