//! Data shaping: validate a client field list and project records down to it.
//!
//! Records are serialized with serde and projected on the JSON tree, so the output keys
//! are the external (serialized) names. Nested paths such as `target.value` produce a
//! nested sub-record, never a flattened key.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{split_tokens, Error, LinkDto};

/// Ordered, name-keyed projection of one record.
pub type ShapedRecord = Map<String, Value>;

/// Reserved key holding a shaped record's own links.
pub const LINKS_KEY: &str = "links";

/// Declared projectable fields of one resource representation.
///
/// Dotted paths declare nested fields; their parents are declared implicitly so a client
/// may request either the whole sub-record (`frequency`) or a leaf (`frequency.type`).
#[derive(Clone, Debug, Default)]
pub struct FieldDescriptor {
    paths: Vec<String>,
}

impl FieldDescriptor {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let mut prefix = String::new();
            for segment in path.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                if !out.iter().any(|p| p == &prefix) {
                    out.push(prefix.clone());
                }
            }
        }
        Self { paths: out }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Case-insensitive match of a client name to its declared spelling.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.paths
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Parse `fields` into a selection. Absent or blank means every declared field.
    pub fn parse(&self, fields: Option<&str>) -> Result<FieldSelection, Error> {
        let Some(raw) = fields.filter(|s| !s.trim().is_empty()) else {
            return Ok(FieldSelection::All);
        };

        let mut selected: Vec<String> = Vec::new();
        for token in split_tokens(raw) {
            let canonical = self
                .resolve(token)
                .ok_or_else(|| Error::invalid_field(token, raw))?;
            if !selected.iter().any(|s| s == canonical) {
                selected.push(canonical.to_owned());
            }
        }
        Ok(FieldSelection::Only(selected))
    }

    pub fn validate(&self, fields: Option<&str>) -> Result<(), Error> {
        self.parse(fields).map(|_| ())
    }
}

/// Parsed `fields` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    /// Canonical paths, deduplicated, in request order.
    Only(Vec<String>),
}

impl FieldSelection {
    pub fn is_all(&self) -> bool {
        matches!(self, FieldSelection::All)
    }
}

/// A representation that can be shaped.
pub trait Shape: Serialize {
    fn descriptor() -> &'static FieldDescriptor;

    /// Identity used to build this record's own links, present even when not requested.
    fn identity(&self) -> String;
}

pub fn validate_fields<T: Shape>(fields: Option<&str>) -> Result<(), Error> {
    T::descriptor().validate(fields)
}

pub fn shape_one<T: Shape>(record: &T, fields: Option<&str>) -> Result<ShapedRecord, Error> {
    let selection = T::descriptor().parse(fields)?;
    project(record, &selection)
}

/// Shape a record that may be absent; absence propagates as `None`.
pub fn shape_optional<T: Shape>(
    record: Option<&T>,
    fields: Option<&str>,
) -> Result<Option<ShapedRecord>, Error> {
    record.map(|r| shape_one(r, fields)).transpose()
}

pub fn shape_many<T: Shape>(records: &[T], fields: Option<&str>) -> Result<Vec<ShapedRecord>, Error> {
    let selection = T::descriptor().parse(fields)?;
    records.iter().map(|r| project(r, &selection)).collect()
}

/// Shape every record and attach the links produced for it under [`LINKS_KEY`].
///
/// `link_factory` receives the source record and the original `fields` string, so a
/// record's self link reproduces the same shaping.
pub fn shape_many_with_links<T, F>(
    records: &[T],
    fields: Option<&str>,
    link_factory: F,
) -> Result<Vec<ShapedRecord>, Error>
where
    T: Shape,
    F: Fn(&T, Option<&str>) -> Result<Vec<LinkDto>, Error>,
{
    let selection = T::descriptor().parse(fields)?;
    records
        .iter()
        .map(|r| {
            let mut shaped = project(r, &selection)?;
            attach_links(&mut shaped, link_factory(r, fields)?)?;
            Ok(shaped)
        })
        .collect()
}

/// Inject `links` after shaping.
pub fn attach_links(record: &mut ShapedRecord, links: Vec<LinkDto>) -> Result<(), Error> {
    let value = serde_json::to_value(links).map_err(|e| Error::Shaping(e.to_string()))?;
    record.insert(LINKS_KEY.to_owned(), value);
    Ok(())
}

fn project<T: Serialize>(record: &T, selection: &FieldSelection) -> Result<ShapedRecord, Error> {
    let source = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(Error::Shaping(format!(
                "expected an object representation, got {}",
                kind_of(&other)
            )))
        }
        Err(e) => return Err(Error::Shaping(e.to_string())),
    };

    let paths = match selection {
        FieldSelection::All => return Ok(source),
        FieldSelection::Only(paths) => paths,
    };

    let mut out = Map::new();
    for path in paths {
        let segments: Vec<&str> = path.split('.').collect();
        copy_path(&source, &segments, &mut out);
    }
    Ok(out)
}

fn copy_path(source: &Map<String, Value>, path: &[&str], out: &mut Map<String, Value>) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let value = source.get(*head).unwrap_or(&Value::Null);

    if rest.is_empty() {
        // A whole field replaces any partial sub-record but keeps its position.
        out.insert((*head).to_owned(), value.clone());
        return;
    }

    match value {
        Value::Object(child) => {
            let slot = out
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(slot) = slot {
                copy_path(child, rest, slot);
            }
        }
        // Nothing to descend into; keep the requested parent as-is (typically null).
        other => {
            out.entry((*head).to_owned()).or_insert_with(|| other.clone());
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
