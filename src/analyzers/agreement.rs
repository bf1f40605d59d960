use super::coverage::pct;
use crate::types::{AgreementStats, CombinationCoverage, PairwiseAgreement, ToolCoverage};
use std::collections::BTreeSet;

/// Jaccard index (intersection over union) of two CWE sets.
/// Two empty sets are considered identical: `J(∅, ∅) = 1.0`.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Compares every unordered pair of tools. `coverage` arrives sorted by
/// tool name, and pairs are enumerated first-index < second-index, so the
/// row order is canonical across runs.
pub fn analyze_pairwise(coverage: &[ToolCoverage]) -> Vec<PairwiseAgreement> {
    let mut pairs = Vec::new();
    for i in 0..coverage.len() {
        for j in (i + 1)..coverage.len() {
            let (a, b) = (&coverage[i], &coverage[j]);
            let shared: Vec<String> =
                a.unique_cwes.intersection(&b.unique_cwes).cloned().collect();
            let a_unique: Vec<String> =
                a.unique_cwes.difference(&b.unique_cwes).cloned().collect();
            let b_unique: Vec<String> =
                b.unique_cwes.difference(&a.unique_cwes).cloned().collect();
            pairs.push(PairwiseAgreement {
                tool1: a.tool.clone(),
                tool2: b.tool.clone(),
                tool1_cwes: a.unique_cwes.len(),
                tool2_cwes: b.unique_cwes.len(),
                union_count: a.unique_cwes.union(&b.unique_cwes).count(),
                jaccard: jaccard(&a.unique_cwes, &b.unique_cwes),
                shared,
                tool1_unique: a_unique,
                tool2_unique: b_unique,
            });
        }
    }
    pairs
}

/// Coverage contributed by every non-empty tool subset, smallest subsets
/// first, members in canonical order within each size. Percentages are
/// relative to the global union of all tools' CWE sets.
pub fn analyze_combinations(coverage: &[ToolCoverage]) -> Vec<CombinationCoverage> {
    let global_union = global_union(coverage);
    let total = global_union.len();
    let n = coverage.len();

    let mut combos = Vec::new();
    for size in 1..=n {
        for indices in index_combinations(n, size) {
            let members: Vec<&ToolCoverage> = indices.iter().map(|&i| &coverage[i]).collect();
            let mut union: BTreeSet<&String> = BTreeSet::new();
            for m in &members {
                union.extend(m.unique_cwes.iter());
            }

            let unique_contribution = match members.as_slice() {
                [only] => only.unique_cwes.len(),
                [first, second] => second.unique_cwes.difference(&first.unique_cwes).count(),
                _ => 0,
            };
            let synergy = match members.as_slice() {
                [a, b] => {
                    let inter = a.unique_cwes.intersection(&b.unique_cwes).count();
                    Some(
                        union.len() as i64
                            - a.unique_cwes.len() as i64
                            - b.unique_cwes.len() as i64
                            + inter as i64,
                    )
                }
                _ => None,
            };

            let tools: Vec<String> = members.iter().map(|m| m.tool.clone()).collect();
            let label = if size == n && n > 1 {
                "All_Tools".to_string()
            } else {
                tools.join("+")
            };
            let coverage_percent = pct(union.len() as f64, total as f64);
            combos.push(CombinationCoverage {
                label,
                cwes_covered: union.len(),
                coverage_percent,
                unique_contribution,
                synergy,
                efficiency_per_tool: coverage_percent / size as f64,
                tools,
            });
        }
    }
    combos
}

/// Aggregate IoU statistics across all pairs, plus the global union size.
pub fn summarize(pairwise: &[PairwiseAgreement], coverage: &[ToolCoverage]) -> AgreementStats {
    let total_unique_cwes = global_union(coverage).len();
    if pairwise.is_empty() {
        return AgreementStats {
            total_unique_cwes,
            ..AgreementStats::default()
        };
    }
    let sum: f64 = pairwise.iter().map(|p| p.jaccard).sum();
    AgreementStats {
        average_iou: sum / pairwise.len() as f64,
        max_iou: pairwise.iter().map(|p| p.jaccard).fold(f64::MIN, f64::max),
        min_iou: pairwise.iter().map(|p| p.jaccard).fold(f64::MAX, f64::min),
        total_unique_cwes,
    }
}

fn global_union(coverage: &[ToolCoverage]) -> BTreeSet<String> {
    let mut union = BTreeSet::new();
    for c in coverage {
        union.extend(c.unique_cwes.iter().cloned());
    }
    union
}

/// All k-element index subsets of `0..n`, in lexicographic order.
fn index_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        out.push(indices.clone());
        // advance the rightmost index that still has room
        let mut i = k;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }
        indices[i] += 1;
        for j in (i + 1)..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
