use serde::Serialize;
use std::collections::BTreeSet;

// ─── Normalized Findings ──────────────────────────────────────────────────────

/// One (project, tool, CWE, count) observation extracted from a scanner's
/// raw output. `cwe_id` is either canonical `CWE-<digits>` or empty — empty
/// ids come from unmapped CodeQL queries and are kept only for diagnostic
/// visibility in the consolidated table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub project: String,
    pub tool: String,
    pub cwe_id: String,
    pub count: u64,
    pub is_top25: bool,
}

impl Finding {
    /// True for rows that participate in CWE statistics (non-empty id).
    pub fn has_cwe(&self) -> bool {
        !self.cwe_id.is_empty()
    }
}

// ─── Per-Tool Coverage ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ToolCoverage {
    pub tool: String,
    /// Distinct normalized CWE ids this tool reported, across all projects.
    pub unique_cwes: BTreeSet<String>,
    /// Subset of `unique_cwes` present in the reference catalog.
    pub top25_detected: BTreeSet<String>,
    pub top25_coverage_percent: f64,
    pub total_findings: u64,
    pub top25_findings: u64,
    pub top25_findings_percent: f64,
}

// ─── Tool Agreement ───────────────────────────────────────────────────────────

/// Jaccard comparison of one unordered tool pair. Member lists are sorted so
/// repeated runs export identical rows.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseAgreement {
    pub tool1: String,
    pub tool2: String,
    pub tool1_cwes: usize,
    pub tool2_cwes: usize,
    pub shared: Vec<String>,
    pub tool1_unique: Vec<String>,
    pub tool2_unique: Vec<String>,
    pub union_count: usize,
    pub jaccard: f64,
}

impl PairwiseAgreement {
    pub fn pair_label(&self) -> String {
        format!("{}-{}", self.tool1, self.tool2)
    }
}

/// Coverage contributed by one subset of tools.
#[derive(Debug, Clone, Serialize)]
pub struct CombinationCoverage {
    /// `bandit`, `bandit+semgrep`, … or `All_Tools` for the full set.
    pub label: String,
    pub tools: Vec<String>,
    pub cwes_covered: usize,
    /// Percentage of the global union across all tools.
    pub coverage_percent: f64,
    /// Singleton: own set size. Pair: CWEs in the second tool absent from
    /// the first. Larger subsets: 0.
    pub unique_contribution: usize,
    /// Pairs only; a set identity makes this always 0. A non-zero value
    /// indicates a set-construction bug, never meaningful signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synergy: Option<i64>,
    pub efficiency_per_tool: f64,
}

/// Aggregate statistics over all pairwise comparisons.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgreementStats {
    pub average_iou: f64,
    pub max_iou: f64,
    pub min_iou: f64,
    /// Size of the union of every tool's CWE set.
    pub total_unique_cwes: usize,
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub results_dir: String,
    pub project_count: usize,
    pub tool_count: usize,
    pub finding_rows: usize,
    /// Denominator of the Top-25 coverage percentages (25 for the built-in
    /// catalog, the list length for a custom reference set).
    pub top25_benchmark: usize,
    pub analyzed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub findings: Vec<Finding>,
    pub coverage: Vec<ToolCoverage>,
    pub pairwise: Vec<PairwiseAgreement>,
    pub combinations: Vec<CombinationCoverage>,
    pub stats: AgreementStats,
}
