use super::{bump, cwe_value_to_string, CweCounts};
use serde_json::Value;

/// Extracts CWE counts from a Bandit JSON report.
///
/// Each `results[]` item carries an `issue_cwe` field whose shape varies by
/// Bandit version: a plain string, a number, an object with an `id`
/// sub-field, or a list of any of those. Every resolved CWE counts once.
pub fn parse(doc: &Value) -> CweCounts {
    let mut counts = CweCounts::new();
    let Some(results) = doc.get("results").and_then(Value::as_array) else {
        return counts;
    };

    for item in results {
        let Some(cwe) = item.get("issue_cwe") else {
            continue;
        };
        match cwe {
            Value::Array(entries) => {
                for entry in entries {
                    if let Some(id) = resolve(entry) {
                        bump(&mut counts, &id);
                    }
                }
            }
            single => {
                if let Some(id) = resolve(single) {
                    bump(&mut counts, &id);
                }
            }
        }
    }
    counts
}

/// One `issue_cwe` entry: either the id itself or `{ "id": …, "link": … }`.
fn resolve(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(map) => map.get("id").and_then(cwe_value_to_string),
        other => cwe_value_to_string(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_object_form() {
        let doc = json!({
            "results": [
                {"issue_cwe": {"id": 78, "link": "https://cwe.mitre.org/data/definitions/78.html"}},
                {"issue_cwe": {"id": 78}},
            ]
        });
        let counts = parse(&doc);
        assert_eq!(counts.get("CWE-78"), Some(&2), "numeric object ids count");
    }

    #[test]
    fn test_parses_string_and_list_forms() {
        let doc = json!({
            "results": [
                {"issue_cwe": "CWE-89"},
                {"issue_cwe": ["CWE-89", {"id": "22"}]},
            ]
        });
        let counts = parse(&doc);
        assert_eq!(counts.get("CWE-89"), Some(&2));
        assert_eq!(counts.get("CWE-22"), Some(&1), "bare numeric string normalizes");
    }

    #[test]
    fn test_skips_records_without_cwe() {
        let doc = json!({
            "results": [
                {"issue_severity": "HIGH"},
                {"issue_cwe": null},
                {"issue_cwe": "CWE-79"},
            ]
        });
        let counts = parse(&doc);
        assert_eq!(counts.len(), 1, "records lacking a usable CWE are skipped");
        assert_eq!(counts.get("CWE-79"), Some(&1));
    }

    #[test]
    fn test_empty_document_yields_empty_counts() {
        let counts = parse(&json!({"results": []}));
        assert!(counts.is_empty());
        let counts = parse(&json!({"errors": []}));
        assert!(counts.is_empty(), "missing results array is not an error");
    }
}
