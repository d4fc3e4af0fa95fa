//! Template context: the YAML document every template is rendered against.

use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::{fs, path::Path};

/// A decoded YAML value.
///
/// Mappings keep document order; keys are always strings.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Look up `key` if this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
        }
    }
}

/// Immutable, loaded-once mapping from top-level keys to values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    entries: Vec<(String, Value)>,
}

impl Context {
    /// Read and decode the YAML file at `path`.
    ///
    /// An empty document yields an empty context. Anything other than a
    /// mapping at the top level is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let doc: serde_yaml::Value = serde_yaml::from_str(&src).map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let shape_err = |reason: String| Error::Shape {
            path: path.to_path_buf(),
            reason,
        };

        let entries = match untag(doc) {
            serde_yaml::Value::Null => Vec::new(),
            serde_yaml::Value::Mapping(map) => convert_mapping(map).map_err(shape_err)?,
            other => {
                return Err(shape_err(format!(
                    "top-level value must be a mapping, found {}",
                    yaml_kind(&other)
                )));
            }
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "loaded context");
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Resolve a dotted path such as `db.primary.host`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.get(segments.next()?)?;
        segments.try_fold(first, |value, seg| value.get(seg))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// YAML conversion
fn untag(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn convert(value: serde_yaml::Value) -> std::result::Result<Value, String> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            // u64 beyond i64::MAX, or a real float.
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::List(seq.into_iter().map(convert).collect::<std::result::Result<_, _>>()?)
        }
        serde_yaml::Value::Mapping(map) => Value::Map(convert_mapping(map)?),
        serde_yaml::Value::Tagged(tagged) => convert(tagged.value)?,
    })
}

/// Keys that stringify to the same text collapse; the later value wins
/// and keeps the earlier position.
fn convert_mapping(map: serde_yaml::Mapping) -> std::result::Result<Vec<(String, Value)>, String> {
    let mut entries: Vec<(String, Value)> = Vec::with_capacity(map.len());
    for (k, v) in map {
        let key = key_string(k)?;
        let value = convert(v)?;
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }
    Ok(entries)
}

/// Scalar keys become strings; collection keys have no string form.
fn key_string(key: serde_yaml::Value) -> std::result::Result<String, String> {
    match untag(key) {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_owned()),
        other => Err(format!(
            "mapping keys must be scalars, found {}",
            yaml_kind(&other)
        )),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

// Serialization
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => serialize_entries(entries, serializer),
        }
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_entries(&self.entries, serializer)
    }
}

fn serialize_entries<S: Serializer>(
    entries: &[(String, Value)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (k, v) in entries {
        map.serialize_entry(k, v)?;
    }
    map.end()
}
