//! In-process search backend.
//!
//! [`MemoryBackend`] keeps documents in a map per index and evaluates the
//! subset of the Query DSL the storage layer emits: `bool` (`must`, `filter`,
//! `must_not`), `term`, `terms`, `fuzzy`, `range` and `match_all`. Aliases are
//! taken from the `aliases` section of the index body passed to
//! [`create_index`](SearchBackend::create_index).
//!
//! Paths are resolved the way Elasticsearch flattens objects: `a.b.c` matches
//! nested objects as well as object keys that themselves contain dots (label
//! and annotation keys), and arrays are searched element by element.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::core::{BackendKind, SearchBackend, SearchHit, SearchHits};
use crate::error::BackendError;

const BACKEND_NAME: &str = "memory";
const DEFAULT_SEARCH_SIZE: usize = 10;

/// Number of requests served, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub search: u64,
    pub index_document: u64,
    pub delete_document: u64,
    pub delete_by_query: u64,
    pub index_exists: u64,
    pub create_index: u64,
}

impl RequestCounts {
    pub fn total(&self) -> u64 {
        self.search
            + self.index_document
            + self.delete_document
            + self.delete_by_query
            + self.index_exists
            + self.create_index
    }
}

#[derive(Debug, Default)]
struct MemoryIndex {
    aliases: BTreeSet<String>,
    mapping: Value,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct MemoryState {
    indices: BTreeMap<String, MemoryIndex>,
    counts: RequestCounts,
    unavailable: bool,
}

impl MemoryState {
    /// Resolves index names and aliases to concrete index names.
    fn resolve(&self, names: &[&str]) -> Vec<String> {
        let mut resolved = Vec::new();
        for name in names {
            if self.indices.contains_key(*name) {
                resolved.push((*name).to_string());
                continue;
            }
            for (index, state) in &self.indices {
                if state.aliases.contains(*name) {
                    resolved.push(index.clone());
                }
            }
        }
        resolved.sort();
        resolved.dedup();
        resolved
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: "backend marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Search backend holding all documents in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of requests served so far.
    pub fn request_counts(&self) -> RequestCounts {
        self.state.read().counts
    }

    /// Makes every following request fail with `BackendError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Returns the number of documents stored in `index`.
    pub fn document_count(&self, index: &str) -> usize {
        self.state
            .read()
            .indices
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    /// Returns a stored document.
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .read()
            .indices
            .get(index)
            .and_then(|i| i.documents.get(id))
            .cloned()
    }

    /// Returns the index body an index was created with.
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.state.read().indices.get(index).map(|i| i.mapping.clone())
    }

    /// Returns all index names.
    pub fn indices(&self) -> Vec<String> {
        self.state.read().indices.keys().cloned().collect()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn search(&self, indices: &[&str], query: Value) -> Result<SearchHits, BackendError> {
        let mut state = self.state.write();
        state.counts.search += 1;
        state.check_available()?;

        let from = usize_param(&query, "from", 0)?;
        let size = usize_param(&query, "size", DEFAULT_SEARCH_SIZE)?;
        let includes = source_includes(&query);

        let mut matched = Vec::new();
        for index in state.resolve(indices) {
            let Some(index_state) = state.indices.get(&index) else {
                continue;
            };
            for (id, document) in &index_state.documents {
                if matches_query(query.get("query"), document)? {
                    matched.push((id, document));
                }
            }
        }

        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, document)| SearchHit {
                id: id.clone(),
                source: match &includes {
                    Some(paths) => filter_source(document, paths),
                    None => document.clone(),
                },
            })
            .collect();

        Ok(SearchHits {
            total,
            total_is_exact: true,
            hits,
        })
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: Value,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.counts.index_document += 1;
        state.check_available()?;

        // Writing to an unknown index creates it without mapping or aliases.
        state
            .indices
            .entry(index.to_string())
            .or_default()
            .documents
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.counts.delete_document += 1;
        state.check_available()?;

        if let Some(index_state) = state.indices.get_mut(index) {
            index_state.documents.remove(id);
        }
        Ok(())
    }

    async fn delete_by_query(&self, indices: &[&str], query: Value) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.counts.delete_by_query += 1;
        state.check_available()?;

        for index in state.resolve(indices) {
            let Some(index_state) = state.indices.get_mut(&index) else {
                continue;
            };
            let mut doomed = Vec::new();
            for (id, document) in &index_state.documents {
                if matches_query(query.get("query"), document)? {
                    doomed.push(id.clone());
                }
            }
            for id in doomed {
                index_state.documents.remove(&id);
            }
        }
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let mut state = self.state.write();
        state.counts.index_exists += 1;
        state.check_available()?;
        Ok(!state.resolve(&[index]).is_empty())
    }

    async fn create_index(&self, index: &str, mapping: Value) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.counts.create_index += 1;
        state.check_available()?;

        if state.indices.contains_key(index) {
            tracing::debug!("Memory index '{}' already exists", index);
            return Ok(());
        }
        let aliases = mapping
            .get("aliases")
            .and_then(Value::as_object)
            .map(|a| a.keys().cloned().collect())
            .unwrap_or_default();
        state.indices.insert(
            index.to_string(),
            MemoryIndex {
                aliases,
                mapping,
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }
}

fn bad_request(message: String) -> BackendError {
    BackendError::Rejected {
        backend_name: BACKEND_NAME.to_string(),
        status: 400,
        body: message,
    }
}

fn usize_param(query: &Value, key: &str, default: usize) -> Result<usize, BackendError> {
    match query.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| bad_request(format!("[{key}] must be a non-negative integer, got {v}"))),
    }
}

fn source_includes(query: &Value) -> Option<Vec<String>> {
    match query.get("_source")? {
        Value::Array(paths) => Some(
            paths
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Value::String(path) => Some(vec![path.clone()]),
        _ => None,
    }
}

/// Keeps only the included dotted paths of a document.
fn filter_source(document: &Value, includes: &[String]) -> Value {
    let mut filtered = Map::new();
    for path in includes {
        let segments: Vec<&str> = path.split('.').collect();
        let found = segments
            .iter()
            .try_fold(document, |current, segment| current.get(*segment));
        if let Some(value) = found {
            insert_path(&mut filtered, &segments, value.clone());
        }
    }
    Value::Object(filtered)
}

fn insert_path(dst: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            dst.insert((*last).to_string(), value);
        }
        [first, rest @ ..] => {
            let child = dst
                .entry((*first).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(child) = child.as_object_mut() {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Collects every leaf value reachable through `path`.
fn resolve_path<'a>(value: &'a Value, path: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                resolve_path(item, path, out);
            }
        }
        _ if path.is_empty() => out.push(value),
        Value::Object(map) => {
            for (key, child) in map {
                if key == path {
                    resolve_path(child, "", out);
                } else if let Some(rest) = path
                    .strip_prefix(key.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    resolve_path(child, rest, out);
                }
            }
        }
        _ => {}
    }
}

fn field_values<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    resolve_path(document, path, &mut out);
    out
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_eq(left: &Value, right: &Value) -> bool {
    left == right
        || matches!((scalar_string(left), scalar_string(right)), (Some(l), Some(r)) if l == r)
}

/// Extracts the single `{field: spec}` pair of a leaf query.
fn single_field<'a>(kind: &str, body: &'a Value) -> Result<(&'a str, &'a Value), BackendError> {
    match body.as_object() {
        Some(map) if map.len() == 1 => {
            let (field, spec) = map.iter().next().ok_or_else(|| {
                bad_request(format!("[{kind}] query requires exactly one field"))
            })?;
            Ok((field.as_str(), spec))
        }
        _ => Err(bad_request(format!("[{kind}] query requires exactly one field"))),
    }
}

/// Unwraps the `{"value": v}` long form.
fn leaf_value(spec: &Value) -> &Value {
    spec.get("value").unwrap_or(spec)
}

fn clauses(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

fn matches_query(query: Option<&Value>, document: &Value) -> Result<bool, BackendError> {
    let Some(query) = query else {
        return Ok(true);
    };
    let Some(map) = query.as_object() else {
        return Err(bad_request(format!("query must be an object, got {query}")));
    };
    let Some((kind, body)) = map.iter().next() else {
        return Ok(true);
    };

    match kind.as_str() {
        "match_all" => Ok(true),
        "bool" => {
            for clause in clauses(body.get("must"))
                .into_iter()
                .chain(clauses(body.get("filter")))
            {
                if !matches_query(Some(clause), document)? {
                    return Ok(false);
                }
            }
            for clause in clauses(body.get("must_not")) {
                if matches_query(Some(clause), document)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        "term" => {
            let (field, spec) = single_field(kind, body)?;
            let expected = leaf_value(spec);
            Ok(field_values(document, field)
                .into_iter()
                .any(|v| scalar_eq(v, expected)))
        }
        "terms" => {
            let (field, spec) = single_field(kind, body)?;
            let Some(expected) = spec.as_array() else {
                return Err(bad_request(format!("[terms] query on {field} requires an array")));
            };
            Ok(field_values(document, field)
                .into_iter()
                .any(|v| expected.iter().any(|e| scalar_eq(v, e))))
        }
        "fuzzy" => {
            let (field, spec) = single_field(kind, body)?;
            let Some(expected) = scalar_string(leaf_value(spec)) else {
                return Err(bad_request(format!("[fuzzy] query on {field} requires a value")));
            };
            let max_edits = auto_fuzziness(expected.chars().count());
            Ok(field_values(document, field).into_iter().any(|v| {
                scalar_string(v).is_some_and(|s| edit_distance(&s, &expected) <= max_edits)
            }))
        }
        "range" => {
            let (field, spec) = single_field(kind, body)?;
            let gte = spec.get("gte").and_then(range_bound);
            let lte = spec.get("lte").and_then(range_bound);
            Ok(field_values(document, field).into_iter().any(|v| {
                epoch_seconds(v).is_some_and(|t| {
                    gte.is_none_or(|lower| t >= lower) && lte.is_none_or(|upper| t <= upper)
                })
            }))
        }
        other => Err(bad_request(format!("unknown query [{other}]"))),
    }
}

fn range_bound(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Interprets a document value as epoch seconds.
fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.timestamp()),
        _ => None,
    }
}

/// Maximum edit distance of `fuzziness: AUTO` for a term of `len` characters.
fn auto_fuzziness(len: usize) -> usize {
    match len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Levenshtein distance over characters.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut row = Vec::with_capacity(b.len() + 1);
        row.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            let insertion = row[j] + 1;
            let deletion = prev[j + 1] + 1;
            row.push(substitution.min(insertion).min(deletion));
        }
        prev = row;
    }
    prev[b.len()]
}
