use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// The CWE Top 25 reference list used as the coverage benchmark.
/// The upstream list carries 24 distinct identifiers but is benchmarked
/// against a width of 25 — both facts are preserved by [`CweCatalog::top25`].
static TOP_25_CWE: Lazy<BTreeSet<&'static str>> = Lazy::new(|| BTreeSet::from([
    "CWE-79", "CWE-89", "CWE-787", "CWE-20", "CWE-125", "CWE-78", "CWE-416",
    "CWE-22", "CWE-352", "CWE-434", "CWE-190", "CWE-476", "CWE-502", "CWE-306",
    "CWE-798", "CWE-862", "CWE-276", "CWE-94", "CWE-611", "CWE-863",
    "CWE-732", "CWE-829", "CWE-327", "CWE-200",
]));

const TOP_25_BENCHMARK: usize = 25;

/// Normalizes a raw CWE identifier to canonical `CWE-<digits>` form.
/// Idempotent: already-canonical input passes through unchanged. Empty
/// input stays empty (diagnostic rows keep their blank id).
pub fn normalize_cwe(raw: &str) -> String {
    let t = raw.trim();
    if t.is_empty() {
        return String::new();
    }
    if t.starts_with("CWE-") {
        t.to_string()
    } else {
        format!("CWE-{t}")
    }
}

/// Immutable reference set for Top-25 membership checks. Injected at
/// construction so tests and alternate benchmark years can swap the list
/// without touching any global state.
#[derive(Debug, Clone)]
pub struct CweCatalog {
    ids: BTreeSet<String>,
    benchmark: usize,
}

impl CweCatalog {
    /// The built-in Top-25 catalog.
    pub fn top25() -> Self {
        CweCatalog {
            ids: TOP_25_CWE.iter().map(|s| s.to_string()).collect(),
            benchmark: TOP_25_BENCHMARK,
        }
    }

    /// A catalog over a custom reference list. Entries are normalized on the
    /// way in; the benchmark width is the deduplicated list length.
    pub fn with_reference_set<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: BTreeSet<String> = ids
            .into_iter()
            .map(|s| normalize_cwe(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        let benchmark = ids.len();
        CweCatalog { ids, benchmark }
    }

    /// Membership test. The argument is normalized first, so both `"79"`
    /// and `"CWE-79"` match.
    pub fn is_top25(&self, cwe_id: &str) -> bool {
        let id = normalize_cwe(cwe_id);
        !id.is_empty() && self.ids.contains(&id)
    }

    /// Denominator for coverage percentages.
    pub fn benchmark(&self) -> usize {
        self.benchmark
    }

    #[allow(dead_code)]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_prefix() {
        assert_eq!(normalize_cwe("79"), "CWE-79");
        assert_eq!(normalize_cwe("787"), "CWE-787");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["79", "CWE-79", "  22 ", "CWE-862", ""] {
            let once = normalize_cwe(raw);
            assert_eq!(
                normalize_cwe(&once),
                once,
                "normalize(normalize({raw:?})) must equal normalize({raw:?})"
            );
        }
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_cwe(" CWE-22 "), "CWE-22");
        assert_eq!(normalize_cwe("  89"), "CWE-89");
    }

    #[test]
    fn test_normalize_keeps_empty_empty() {
        assert_eq!(normalize_cwe(""), "");
        assert_eq!(normalize_cwe("   "), "");
    }

    #[test]
    fn test_top25_accepts_both_forms() {
        let catalog = CweCatalog::top25();
        assert!(catalog.is_top25("CWE-79"), "canonical form must match");
        assert!(catalog.is_top25("79"), "bare numeric form must match");
        assert!(!catalog.is_top25("CWE-9999"), "unknown id must not match");
        assert!(!catalog.is_top25(""), "empty id must never match");
    }

    #[test]
    fn test_top25_benchmark_is_25() {
        let catalog = CweCatalog::top25();
        assert_eq!(catalog.benchmark(), 25, "built-in benchmark width is 25");
        assert_eq!(catalog.ids().len(), 24, "upstream list has 24 distinct ids");
    }

    #[test]
    fn test_custom_catalog_normalizes_and_sizes() {
        let catalog = CweCatalog::with_reference_set(["1", "CWE-2", "2"]);
        assert_eq!(catalog.benchmark(), 2, "duplicates collapse after normalization");
        assert!(catalog.is_top25("CWE-1"));
        assert!(catalog.is_top25("2"));
        assert!(!catalog.is_top25("CWE-79"), "built-in list must not leak in");
    }
}
