use super::{bump, cwe_value_to_string, CweCounts};
use serde_json::Value;

/// Extracts CWE counts from a Safety (dependency scanner) JSON report.
/// Each `vulnerabilities[]` record carries a single `cwe` field; records
/// with a missing or empty field are skipped.
pub fn parse(doc: &Value) -> CweCounts {
    let mut counts = CweCounts::new();
    let Some(vulns) = doc.get("vulnerabilities").and_then(Value::as_array) else {
        return counts;
    };

    for vuln in vulns {
        let Some(id) = vuln.get("cwe").and_then(cwe_value_to_string) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        bump(&mut counts, &id);
    }
    counts
}
