use super::{bump, CweCounts};
use serde_json::Value;

/// Extracts CWE counts from a Semgrep JSON report.
///
/// Each `results[]` item nests CWE data under `extra.metadata.cwe`, as a
/// string or list of strings of the form `"CWE-22: Improper Limitation of
/// a Pathname…"` — the identifier is the substring before the first colon.
pub fn parse(doc: &Value) -> CweCounts {
    let mut counts = CweCounts::new();
    let Some(results) = doc.get("results").and_then(Value::as_array) else {
        return counts;
    };

    for item in results {
        let Some(cwe_data) = item.pointer("/extra/metadata/cwe") else {
            continue;
        };
        match cwe_data {
            Value::Array(entries) => {
                for entry in entries {
                    if let Some(id) = entry.as_str().and_then(extract_id) {
                        bump(&mut counts, &id);
                    }
                }
            }
            Value::String(s) => {
                if let Some(id) = extract_id(s) {
                    bump(&mut counts, &id);
                }
            }
            _ => {}
        }
    }
    counts
}

/// `"CWE-22: Path Traversal"` → `CWE-22`. Entries that don't lead with the
/// `CWE-` prefix carry no usable identifier and are skipped.
fn extract_id(annotation: &str) -> Option<String> {
    let t = annotation.trim();
    if !t.starts_with("CWE-") {
        return None;
    }
    t.split(':').next().map(|id| id.trim().to_string())
}
