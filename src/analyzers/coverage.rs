use crate::cwe::CweCatalog;
use crate::types::{Finding, ToolCoverage};
use std::collections::{BTreeMap, BTreeSet};

/// Percentage with a zero-denominator guard: an empty result set reports
/// 0%, it never raises a division error.
pub fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

#[derive(Default)]
struct Tally {
    unique: BTreeSet<String>,
    top25: BTreeSet<String>,
    total_findings: u64,
    top25_findings: u64,
}

/// Folds the flat Finding list into per-tool coverage statistics.
///
/// Pure over its input: same findings in, identical (and identically
/// ordered) coverage out. Diagnostic rows with an empty CWE id take no part
/// in any statistic here — they only exist in the consolidated table.
pub fn analyze_coverage(findings: &[Finding], catalog: &CweCatalog) -> Vec<ToolCoverage> {
    let mut by_tool: BTreeMap<&str, Tally> = BTreeMap::new();

    for finding in findings {
        if !finding.has_cwe() {
            continue;
        }
        let tally = by_tool.entry(finding.tool.as_str()).or_default();
        tally.unique.insert(finding.cwe_id.clone());
        tally.total_findings += finding.count;
        if catalog.is_top25(&finding.cwe_id) {
            tally.top25.insert(finding.cwe_id.clone());
            tally.top25_findings += finding.count;
        }
    }

    by_tool
        .into_iter()
        .map(|(tool, tally)| ToolCoverage {
            tool: tool.to_string(),
            top25_coverage_percent: pct(tally.top25.len() as f64, catalog.benchmark() as f64),
            top25_findings_percent: pct(
                tally.top25_findings as f64,
                tally.total_findings as f64,
            ),
            unique_cwes: tally.unique,
            top25_detected: tally.top25,
            total_findings: tally.total_findings,
            top25_findings: tally.top25_findings,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(tool: &str, cwe: &str, count: u64, catalog: &CweCatalog) -> Finding {
        Finding {
            project: "demo".to_string(),
            tool: tool.to_string(),
            cwe_id: cwe.to_string(),
            count,
            is_top25: catalog.is_top25(cwe),
        }
    }

    #[test]
    fn test_pct_guards_zero_denominator() {
        assert_eq!(pct(5.0, 0.0), 0.0, "zero denominator must yield 0, not NaN");
        assert_eq!(pct(1.0, 4.0), 25.0);
    }

    #[test]
    fn test_counts_and_sets_per_tool() {
        let catalog = CweCatalog::top25();
        let findings = vec![
            finding("bandit", "CWE-79", 3, &catalog),
            finding("bandit", "CWE-89", 1, &catalog),
            finding("bandit", "CWE-532", 7, &catalog),
            finding("semgrep", "CWE-22", 2, &catalog),
        ];
        let coverage = analyze_coverage(&findings, &catalog);
        assert_eq!(coverage.len(), 2);

        let bandit = &coverage[0];
        assert_eq!(bandit.tool, "bandit", "tools come out sorted");
        assert_eq!(bandit.unique_cwes.len(), 3);
        assert_eq!(bandit.top25_detected.len(), 2, "CWE-532 is not in the Top 25");
        assert_eq!(bandit.total_findings, 11);
        assert_eq!(bandit.top25_findings, 4);
        assert!((bandit.top25_coverage_percent - 2.0 / 25.0 * 100.0).abs() < 1e-9);
        assert!((bandit.top25_findings_percent - 4.0 / 11.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_percent_in_bounds() {
        let catalog = CweCatalog::top25();
        let findings: Vec<Finding> = catalog
            .ids()
            .iter()
            .map(|id| finding("bandit", id, 1, &catalog))
            .collect();
        let coverage = analyze_coverage(&findings, &catalog);
        let percent = coverage[0].top25_coverage_percent;
        assert!(
            (0.0..=100.0).contains(&percent),
            "coverage percent {percent} out of [0, 100]"
        );
    }

    #[test]
    fn test_empty_input_yields_no_tools_and_no_panic() {
        let catalog = CweCatalog::top25();
        let coverage = analyze_coverage(&[], &catalog);
        assert!(coverage.is_empty(), "no findings means no tool rows");
    }

    #[test]
    fn test_diagnostic_only_tool_absent_from_coverage() {
        // A tool whose only rows are diagnostic (empty id) contributes nothing.
        let catalog = CweCatalog::top25();
        let findings = vec![Finding {
            project: "demo".to_string(),
            tool: "codeql".to_string(),
            cwe_id: String::new(),
            count: 9,
            is_top25: false,
        }];
        let coverage = analyze_coverage(&findings, &catalog);
        assert!(
            coverage.is_empty(),
            "diagnostic-only tools must not appear in coverage"
        );
    }

    #[test]
    fn test_aggregates_across_projects() {
        let catalog = CweCatalog::top25();
        let mut a = finding("bandit", "CWE-79", 2, &catalog);
        a.project = "alpha".to_string();
        let mut b = finding("bandit", "CWE-79", 5, &catalog);
        b.project = "beta".to_string();
        let coverage = analyze_coverage(&[a, b], &catalog);
        assert_eq!(coverage[0].unique_cwes.len(), 1, "same CWE across projects dedupes");
        assert_eq!(coverage[0].total_findings, 7, "counts sum across projects");
    }

    #[test]
    fn test_deterministic_over_input_order() {
        let catalog = CweCatalog::top25();
        let mut findings = vec![
            finding("semgrep", "CWE-22", 1, &catalog),
            finding("bandit", "CWE-89", 2, &catalog),
            finding("bandit", "CWE-79", 3, &catalog),
        ];
        let forward = analyze_coverage(&findings, &catalog);
        findings.reverse();
        let backward = analyze_coverage(&findings, &catalog);
        let fwd: Vec<_> = forward.iter().map(|c| (&c.tool, c.total_findings)).collect();
        let bwd: Vec<_> = backward.iter().map(|c| (&c.tool, c.total_findings)).collect();
        assert_eq!(fwd, bwd, "aggregation must not depend on input order");
    }
}
