use crate::types::Report;
use std::path::{Path, PathBuf};

/// Writes the four CSV interchange tables into `out_dir` and returns the
/// paths written. These files are the contract with downstream reporting:
/// column names and rounding are fixed.
pub fn export_csv(report: &Report, out_dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Cannot create output dir '{}': {e}", out_dir.display()))?;

    let written = vec![
        write_consolidated(report, &out_dir.join("consolidated_findings.csv"))?,
        write_coverage(report, &out_dir.join("tool_coverage_summary.csv"))?,
        write_pairwise(report, &out_dir.join("pairwise_iou_analysis.csv"))?,
        write_combinations(report, &out_dir.join("tool_combination_analysis.csv"))?,
    ];
    Ok(written)
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, String> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| format!("Cannot open '{}' for writing: {e}", path.display()))
}

fn finish(mut wtr: csv::Writer<std::fs::File>, path: &Path) -> Result<PathBuf, String> {
    wtr.flush()
        .map_err(|e| format!("Failed to finalize '{}': {e}", path.display()))?;
    Ok(path.to_path_buf())
}

fn row_err(path: &Path, e: csv::Error) -> String {
    format!("Failed writing '{}': {e}", path.display())
}

// One row per (project, tool, CWE) observation, diagnostic rows included.
fn write_consolidated(report: &Report, path: &Path) -> Result<PathBuf, String> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "Project_name",
        "Tool_name",
        "CWE_ID",
        "Number_of_Findings",
        "Is_In_CWE_Top_25",
    ])
    .map_err(|e| row_err(path, e))?;
    for f in &report.findings {
        let count = f.count.to_string();
        wtr.write_record([
            f.project.as_str(),
            f.tool.as_str(),
            f.cwe_id.as_str(),
            count.as_str(),
            if f.is_top25 { "Yes" } else { "No" },
        ])
        .map_err(|e| row_err(path, e))?;
    }
    finish(wtr, path)
}

fn write_coverage(report: &Report, path: &Path) -> Result<PathBuf, String> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "Tool",
        "Total_Unique_CWEs",
        "Top25_CWEs_Detected",
        "Top25_Coverage_Percent",
        "Total_Findings",
        "Top25_Findings",
        "Top25_Findings_Percent",
        "Top25_CWEs_List",
    ])
    .map_err(|e| row_err(path, e))?;
    for c in &report.coverage {
        let top25_list: Vec<&str> = c.top25_detected.iter().map(|s| s.as_str()).collect();
        wtr.write_record([
            c.tool.clone(),
            c.unique_cwes.len().to_string(),
            c.top25_detected.len().to_string(),
            format!("{:.2}", c.top25_coverage_percent),
            c.total_findings.to_string(),
            c.top25_findings.to_string(),
            format!("{:.2}", c.top25_findings_percent),
            top25_list.join(", "),
        ])
        .map_err(|e| row_err(path, e))?;
    }
    finish(wtr, path)
}

fn write_pairwise(report: &Report, path: &Path) -> Result<PathBuf, String> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "Tool_Pair",
        "Tool1",
        "Tool2",
        "Tool1_CWEs",
        "Tool2_CWEs",
        "Shared_CWEs",
        "Tool1_Unique",
        "Tool2_Unique",
        "Union_CWEs",
        "IoU_Jaccard_Index",
        "Shared_CWE_List",
        "Tool1_Unique_List",
        "Tool2_Unique_List",
    ])
    .map_err(|e| row_err(path, e))?;
    for p in &report.pairwise {
        wtr.write_record([
            p.pair_label(),
            p.tool1.clone(),
            p.tool2.clone(),
            p.tool1_cwes.to_string(),
            p.tool2_cwes.to_string(),
            p.shared.len().to_string(),
            p.tool1_unique.len().to_string(),
            p.tool2_unique.len().to_string(),
            p.union_count.to_string(),
            format!("{:.4}", p.jaccard),
            p.shared.join(", "),
            p.tool1_unique.join(", "),
            p.tool2_unique.join(", "),
        ])
        .map_err(|e| row_err(path, e))?;
    }
    finish(wtr, path)
}

fn write_combinations(report: &Report, path: &Path) -> Result<PathBuf, String> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "Combination",
        "Tools",
        "Tool_Count",
        "CWEs_Covered",
        "Coverage_Percent",
        "Unique_Contribution",
        "Efficiency_Per_Tool",
    ])
    .map_err(|e| row_err(path, e))?;
    for c in &report.combinations {
        wtr.write_record([
            c.label.clone(),
            c.tools.join(" + "),
            c.tools.len().to_string(),
            c.cwes_covered.to_string(),
            format!("{:.2}", c.coverage_percent),
            c.unique_contribution.to_string(),
            format!("{:.2}", c.efficiency_per_tool),
        ])
        .map_err(|e| row_err(path, e))?;
    }
    finish(wtr, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{agreement, coverage};
    use crate::cwe::CweCatalog;
    use crate::types::{Finding, ReportMeta};

    fn sample_report() -> Report {
        let catalog = CweCatalog::top25();
        let findings = vec![
            Finding {
                project: "demo".to_string(),
                tool: "bandit".to_string(),
                cwe_id: "CWE-79".to_string(),
                count: 3,
                is_top25: true,
            },
            Finding {
                project: "demo".to_string(),
                tool: "codeql".to_string(),
                cwe_id: String::new(),
                count: 2,
                is_top25: false,
            },
            Finding {
                project: "demo".to_string(),
                tool: "codeql".to_string(),
                cwe_id: "CWE-89".to_string(),
                count: 1,
                is_top25: true,
            },
        ];
        let cov = coverage::analyze_coverage(&findings, &catalog);
        let pairwise = agreement::analyze_pairwise(&cov);
        let combinations = agreement::analyze_combinations(&cov);
        let stats = agreement::summarize(&pairwise, &cov);
        Report {
            meta: ReportMeta {
                results_dir: "results".to_string(),
                project_count: 1,
                tool_count: 2,
                finding_rows: findings.len(),
                top25_benchmark: 25,
                analyzed_at: "2025-01-01T00:00:00Z".to_string(),
            },
            findings,
            coverage: cov,
            pairwise,
            combinations,
            stats,
        }
    }

    fn temp_out(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scan-tally-csv-{name}"));
        std::fs::create_dir_all(&dir).expect("create temp out dir");
        dir
    }

    #[test]
    fn test_exports_all_four_tables() {
        let dir = temp_out("all");
        let written = export_csv(&sample_report(), &dir).expect("export should succeed");
        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists(), "{} should exist", path.display());
        }
    }

    #[test]
    fn test_consolidated_headers_and_diagnostic_row() {
        let dir = temp_out("consolidated");
        export_csv(&sample_report(), &dir).expect("export should succeed");
        let text = std::fs::read_to_string(dir.join("consolidated_findings.csv"))
            .expect("read consolidated csv");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Project_name,Tool_name,CWE_ID,Number_of_Findings,Is_In_CWE_Top_25"),
            "header row is fixed"
        );
        assert!(
            text.contains("demo,codeql,,2,No"),
            "diagnostic empty-id row must be carried through: {text}"
        );
        assert!(text.contains("demo,bandit,CWE-79,3,Yes"));
    }

    #[test]
    fn test_pairwise_headers_and_rounding() {
        let dir = temp_out("pairwise");
        export_csv(&sample_report(), &dir).expect("export should succeed");
        let text = std::fs::read_to_string(dir.join("pairwise_iou_analysis.csv"))
            .expect("read pairwise csv");
        assert!(text.starts_with(
            "Tool_Pair,Tool1,Tool2,Tool1_CWEs,Tool2_CWEs,Shared_CWEs,Tool1_Unique,\
             Tool2_Unique,Union_CWEs,IoU_Jaccard_Index,Shared_CWE_List,\
             Tool1_Unique_List,Tool2_Unique_List"
        ));
        assert!(
            text.contains("bandit-codeql,bandit,codeql,1,1,0,1,1,2,0.0000"),
            "disjoint pair rounds to four decimals: {text}"
        );
    }

    #[test]
    fn test_combination_table_includes_full_set() {
        let dir = temp_out("combos");
        export_csv(&sample_report(), &dir).expect("export should succeed");
        let text = std::fs::read_to_string(dir.join("tool_combination_analysis.csv"))
            .expect("read combination csv");
        // With two tools the full set is also a pair, so the pair's
        // unique-contribution rule applies (codeql adds CWE-89 over bandit).
        assert!(text.contains("All_Tools,bandit + codeql,2,2,100.00,1,50.00"), "{text}");
    }

    #[test]
    fn test_reexport_is_byte_identical() {
        let dir_a = temp_out("repro-a");
        let dir_b = temp_out("repro-b");
        let report = sample_report();
        export_csv(&report, &dir_a).expect("first export");
        export_csv(&report, &dir_b).expect("second export");
        for name in [
            "consolidated_findings.csv",
            "tool_coverage_summary.csv",
            "pairwise_iou_analysis.csv",
            "tool_combination_analysis.csv",
        ] {
            let a = std::fs::read(dir_a.join(name)).expect("read a");
            let b = std::fs::read(dir_b.join(name)).expect("read b");
            assert_eq!(a, b, "{name} must be reproducible byte-for-byte");
        }
    }
}
