use super::{bump, CweCounts};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Query-name → CWE lookup for CodeQL findings.
pub type QueryMap = BTreeMap<String, String>;

/// Built-in mappings for the Python query pack. Config can extend this list
/// for additional query packs without a rebuild.
pub static DEFAULT_QUERY_MAP: Lazy<QueryMap> = Lazy::new(|| {
    [
        ("Clear-text logging of sensitive information", "CWE-532"),
        ("Use of a broken or risky cryptographic algorithm", "CWE-327"),
        ("Use of hard-coded password", "CWE-259"),
        ("Missing authentication for critical function", "CWE-306"),
        ("Incomplete regular expression for hostnames", "CWE-20"),
        ("SQL query built from user-controlled sources", "CWE-89"),
        ("Code injection", "CWE-94"),
        ("Hard-coded credentials", "CWE-798"),
        ("Uncontrolled data used in path expression", "CWE-22"),
        ("Weak cryptographic algorithm", "CWE-327"),
        ("Information exposure through an error message", "CWE-209"),
        ("Use of externally-controlled input to select classes or code", "CWE-470"),
        ("Deserialization of untrusted data", "CWE-502"),
        ("Missing rate limiting", "CWE-770"),
        ("Unsafe shell command constructed from library input", "CWE-78"),
    ]
    .into_iter()
    .map(|(query, cwe)| (query.to_string(), cwe.to_string()))
    .collect()
});

/// Extracts CWE counts from a CodeQL CSV result file.
///
/// CodeQL CSV output has no header row; the layout is
/// `query_name, description, severity, message, file, start_line, start_col,
/// end_line, end_col`. Rows whose query name has no mapping are tallied
/// under the empty id — they stay visible in the consolidated table but are
/// excluded from every CWE-based statistic.
pub fn parse(text: &str, query_map: &QueryMap) -> CweCounts {
    let mut counts = CweCounts::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    for record in reader.records() {
        let Ok(row) = record else {
            continue;
        };
        if row.len() < 5 {
            continue;
        }
        let query = row.get(0).unwrap_or("").trim().trim_matches('"');
        match query_map.get(query) {
            Some(cwe) => bump(&mut counts, cwe),
            None => *counts.entry(String::new()).or_insert(0) += 1,
        }
    }
    counts
}
