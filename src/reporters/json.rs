use crate::types::Report;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Outputs the report as JSON. Writes to a file if given, otherwise stdout.
pub fn report_json(report: &Report, output_file: Option<&Path>) -> Result<(), String> {
    if let Some(path) = output_file {
        let file = File::create(path)
            .map_err(|e| format!("Failed to open {} for writing: {e}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        writer
            .write_all(b"\n")
            .map_err(|e| format!("Failed to finalize {}: {e}", path.display()))?;
        eprintln!("✓ JSON report written to {}", path.display());
    } else {
        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        serde_json::to_writer_pretty(&mut writer, report)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        writer
            .write_all(b"\n")
            .map_err(|e| format!("Failed to write stdout: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgreementStats, ReportMeta};

    fn empty_report() -> Report {
        Report {
            meta: ReportMeta {
                results_dir: "results".to_string(),
                project_count: 0,
                tool_count: 0,
                finding_rows: 0,
                top25_benchmark: 25,
                analyzed_at: "2025-01-01T00:00:00Z".to_string(),
            },
            findings: Vec::new(),
            coverage: Vec::new(),
            pairwise: Vec::new(),
            combinations: Vec::new(),
            stats: AgreementStats::default(),
        }
    }

    #[test]
    fn test_writes_valid_json_to_file() {
        let path = std::env::temp_dir().join("scan-tally-test-report.json");
        report_json(&empty_report(), Some(&path)).expect("report should write");
        let text = std::fs::read_to_string(&path).expect("file should exist");
        let value: serde_json::Value =
            serde_json::from_str(&text).expect("output must be valid JSON");
        assert!(value.get("meta").is_some(), "meta section must serialize");
        assert!(value.get("stats").is_some(), "stats section must serialize");
        assert!(text.ends_with('\n'), "file must end with a newline");
    }
}
