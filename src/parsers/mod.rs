pub mod bandit;
pub mod codeql;
pub mod safety;
pub mod semgrep;

use crate::cwe::normalize_cwe;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-tool extraction result: normalized CWE id → occurrence count for one
/// (project, tool) pair. An empty-string key holds the diagnostic tally of
/// findings with no CWE mapping (CodeQL only).
pub type CweCounts = BTreeMap<String, u64>;

// ─── Tool dispatch ────────────────────────────────────────────────────────────

/// The closed set of supported scanner output formats. Parsing strategy is
/// selected here rather than by sniffing document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolKind {
    Bandit,
    Semgrep,
    Safety,
    Codeql,
}

impl ToolKind {
    /// Recognizes a scanner output file by name: `bandit.json`,
    /// `semgrep.json`, `safety.json`, `codeql.csv`.
    pub fn from_file_name(name: &str) -> Option<ToolKind> {
        match name {
            "bandit.json" => Some(ToolKind::Bandit),
            "semgrep.json" => Some(ToolKind::Semgrep),
            "safety.json" => Some(ToolKind::Safety),
            "codeql.csv" => Some(ToolKind::Codeql),
            _ => None,
        }
    }

    /// Recognizes a tool by its bare name, as used in `--tools` and config.
    pub fn from_name(name: &str) -> Option<ToolKind> {
        match name {
            "bandit" => Some(ToolKind::Bandit),
            "semgrep" => Some(ToolKind::Semgrep),
            "safety" => Some(ToolKind::Safety),
            "codeql" => Some(ToolKind::Codeql),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Bandit => "bandit",
            ToolKind::Semgrep => "semgrep",
            ToolKind::Safety => "safety",
            ToolKind::Codeql => "codeql",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─── Shared extraction helpers ────────────────────────────────────────────────

/// Adds one occurrence of `raw` to the counts, normalizing the id first so
/// `"22"` and `"CWE-22"` land in the same bucket. Empty ids are dropped —
/// parsers that carry empty ids on purpose insert them directly.
pub(crate) fn bump(counts: &mut CweCounts, raw: &str) {
    let id = normalize_cwe(raw);
    if id.is_empty() {
        return;
    }
    *counts.entry(id).or_insert(0) += 1;
}

/// Coerces a loosely typed JSON CWE value (string or number) to a string.
pub(crate) fn cwe_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ─── Input reading ────────────────────────────────────────────────────────────

/// Reads a scanner output file as text. Returns `Ok(None)` when the file is
/// absent or empty — both recover to an empty result set upstream. Invalid
/// UTF-8 is re-read once with replacement characters instead of failing.
pub fn read_lossy(path: &Path) -> Result<Option<String>, String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("Cannot read '{}': {e}", path.display())),
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(e) => Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned())),
    }
}

/// Parses one tool's output file into normalized CWE counts. Every failure
/// mode short of an unreadable filesystem degrades to an empty mapping with
/// a warning — a missing scanner run must not sink the whole report.
pub fn parse_tool_output(
    kind: ToolKind,
    path: &Path,
    query_map: &codeql::QueryMap,
) -> CweCounts {
    let text = match read_lossy(path) {
        Ok(Some(text)) => text,
        Ok(None) => {
            eprintln!("⚠ {}: no output at {} — treated as empty", kind, path.display());
            return CweCounts::new();
        }
        Err(e) => {
            eprintln!("⚠ {kind}: {e} — treated as empty");
            return CweCounts::new();
        }
    };

    match kind {
        ToolKind::Codeql => codeql::parse(&text, query_map),
        _ => {
            let doc: Value = match serde_json::from_str(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    eprintln!(
                        "⚠ {}: invalid JSON in {} ({e}) — treated as empty",
                        kind,
                        path.display()
                    );
                    return CweCounts::new();
                }
            };
            match kind {
                ToolKind::Bandit => bandit::parse(&doc),
                ToolKind::Semgrep => semgrep::parse(&doc),
                ToolKind::Safety => safety::parse(&doc),
                ToolKind::Codeql => unreachable!("handled above"),
            }
        }
    }
}
