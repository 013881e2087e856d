//! Canonical form and semantic equality for workflow documents.
//!
//! The server rewrites a handful of fields on every save or execution
//! (`versionCounter`, trigger poll state in `staticData`, the embedded
//! `project` of each sharing record). [`canonicalize`] strips them so that
//! stored files and comparisons only move when a user changed something.

use serde_json::{Map, Value};

use crate::types::WorkflowDocument;

/// Runtime bookkeeping keys written into `staticData` by polling triggers.
pub const VOLATILE_STATIC_KEYS: &[&str] = &["lastTimeChecked", "possibleDuplicates"];

/// Return a copy of `doc` without server-volatile fields.
pub fn canonicalize(doc: &WorkflowDocument) -> WorkflowDocument {
    let mut out = doc.clone();

    out.version_counter = None;

    if let Some(Value::Object(static_data)) = out.static_data.as_mut() {
        for node_state in static_data.values_mut() {
            let Value::Object(node_state) = node_state else {
                continue;
            };
            strip_volatile(node_state);
            // Some triggers (Gmail) keep their state one level deeper.
            for nested in node_state.values_mut() {
                if let Value::Object(nested) = nested {
                    strip_volatile(nested);
                }
            }
        }
    }

    if let Some(shared) = out.shared.as_mut() {
        for record in shared.iter_mut() {
            record.project = None;
        }
    }

    out
}

fn strip_volatile(map: &mut Map<String, Value>) {
    for key in VOLATILE_STATIC_KEYS {
        map.remove(*key);
    }
}

/// Semantic equality: `nodes` and `connections` match under canonical
/// serialization (sorted keys, positional arrays). Nothing else is compared.
pub fn equal(a: &WorkflowDocument, b: &WorkflowDocument) -> bool {
    nodes_json(a) == nodes_json(b) && connections_json(a) == connections_json(b)
}

fn nodes_json(doc: &WorkflowDocument) -> String {
    let mut out = String::from("[");
    for (i, node) in doc.nodes.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_canonical(node, &mut out);
    }
    out.push(']');
    out
}

fn connections_json(doc: &WorkflowDocument) -> String {
    let mut out = String::new();
    write_object(&doc.connections, &mut out);
    out
}

/// Serialize `value` into `out` with object keys sorted at every depth.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars serialize identically regardless of map ordering.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key.as_str()], out);
    }
    out.push('}');
}
