use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use crate::types::{CombinationCoverage, PairwiseAgreement, Report};

// IoU bands from the interpretation guide: above HIGH the tools largely
// overlap, below LOW they are complementary.
const IOU_HIGH: f64 = 0.7;
const IOU_LOW: f64 = 0.3;

pub fn report_terminal(report: &Report) {
    eprintln!();
    println!(
        "{} — {} finding rows across {} projects, {} tools (global union: {} CWEs)",
        "🛡 scan-tally".cyan().bold(),
        report.meta.finding_rows.to_string().bright_black(),
        report.meta.project_count.to_string().bright_black(),
        report.meta.tool_count.to_string().bright_black(),
        report.stats.total_unique_cwes.to_string().bright_black(),
    );
    println!();

    if report.coverage.is_empty() {
        println!("{}", "  No CWE findings parsed from any tool output.".yellow());
        println!("{}", "  Check the results directory layout: results/<project>/<tool>.json".bright_black());
        println!();
        return;
    }

    // ── Per-tool coverage ──────────────────────────────────────────────────
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "TOOL", "UNIQUE CWES", "TOP-25", "COVERAGE", "FINDINGS", "TOP-25 FINDINGS",
    ]);
    for c in &report.coverage {
        table.add_row(vec![
            Cell::new(&c.tool).add_attribute(Attribute::Bold),
            Cell::new(c.unique_cwes.len().to_string()),
            Cell::new(format!("{}/{}", c.top25_detected.len(), report.meta.top25_benchmark)),
            coverage_cell(c.top25_coverage_percent),
            Cell::new(c.total_findings.to_string()),
            Cell::new(format!(
                "{} ({:.1}%)",
                c.top25_findings, c.top25_findings_percent
            )),
        ]);
    }
    println!("{table}");

    for c in &report.coverage {
        if c.top25_detected.is_empty() {
            println!(
                "    {} {} detected no Top-25 CWEs",
                "•".white(),
                c.tool.yellow()
            );
        }
    }

    // ── Pairwise agreement ─────────────────────────────────────────────────
    if !report.pairwise.is_empty() {
        println!();
        println!("{}", "🔍 Pairwise agreement (IoU / Jaccard):".cyan());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["PAIR", "T1 CWES", "T2 CWES", "SHARED", "UNION", "IOU"]);
        for p in &report.pairwise {
            table.add_row(vec![
                Cell::new(p.pair_label()),
                Cell::new(p.tool1_cwes.to_string()),
                Cell::new(p.tool2_cwes.to_string()),
                Cell::new(p.shared.len().to_string()),
                Cell::new(p.union_count.to_string()),
                iou_cell(p.jaccard),
            ]);
        }
        println!("{table}");

        print_interpretation(&report.pairwise, report.stats.average_iou);
    }

    // ── Combination coverage ───────────────────────────────────────────────
    if !report.combinations.is_empty() {
        println!();
        println!("{}", "🎯 Coverage by tool combination:".cyan());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["COMBINATION", "TOOLS", "CWES", "COVERAGE", "EFF/TOOL"]);
        let mut sorted: Vec<&CombinationCoverage> = report.combinations.iter().collect();
        sorted.sort_by(|a, b| {
            b.coverage_percent
                .partial_cmp(&a.coverage_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for c in &sorted {
            table.add_row(vec![
                Cell::new(&c.label),
                Cell::new(c.tools.len().to_string()),
                Cell::new(c.cwes_covered.to_string()),
                coverage_cell(c.coverage_percent),
                Cell::new(format!("{:.1}%", c.efficiency_per_tool)),
            ]);
        }
        println!("{table}");
    }

    // ── Recommendations ────────────────────────────────────────────────────
    let recs = build_recommendations(&report.combinations);
    if !recs.is_empty() {
        println!();
        println!("{}", "💡 Recommendations:".cyan());
        for rec in &recs {
            println!("    {} {}", "•".white(), rec);
        }
    }

    println!();
}

// ─── Cell builders ────────────────────────────────────────────────────────────

/// Coverage percent cell, colored by how much of the benchmark is reached.
/// Plain text so comfy-table measures the real visible width.
fn coverage_cell(percent: f64) -> Cell {
    let text = format!("{percent:.1}%");
    if percent >= 75.0 {
        Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold)
    } else if percent >= 25.0 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

/// IoU cell colored by similarity band.
fn iou_cell(iou: f64) -> Cell {
    let text = format!("{iou:.3}");
    if iou > IOU_HIGH {
        Cell::new(text).fg(Color::Red)
    } else if iou >= IOU_LOW {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Green)
    }
}

// ─── Analysis text ────────────────────────────────────────────────────────────

fn print_interpretation(pairwise: &[PairwiseAgreement], average_iou: f64) {
    let most_similar = pairwise.iter().max_by(|a, b| {
        a.jaccard.partial_cmp(&b.jaccard).unwrap_or(std::cmp::Ordering::Equal)
    });
    let most_diverse = pairwise.iter().min_by(|a, b| {
        a.jaccard.partial_cmp(&b.jaccard).unwrap_or(std::cmp::Ordering::Equal)
    });

    if let (Some(hi), Some(lo)) = (most_similar, most_diverse) {
        println!(
            "    {} most similar: {} {}",
            "🔗".white(),
            hi.pair_label().cyan(),
            format!("(IoU {:.3})", hi.jaccard).bright_black(),
        );
        println!(
            "    {} most diverse: {} {}",
            "🔀".white(),
            lo.pair_label().cyan(),
            format!("(IoU {:.3})", lo.jaccard).bright_black(),
        );
    }

    let verdict = if average_iou > IOU_HIGH {
        "high overlap — consider using fewer tools".red()
    } else if average_iou >= IOU_LOW {
        "moderate overlap — a good complementary mix".yellow()
    } else {
        "low overlap — a highly complementary suite".green()
    };
    println!(
        "    {} average IoU {:.3}: {}",
        "📊".white(),
        average_iou,
        verdict
    );
}

fn build_recommendations(combinations: &[CombinationCoverage]) -> Vec<String> {
    let mut recs = Vec::new();

    // On coverage ties prefer the smaller subset — same coverage, fewer tools.
    let best = combinations.iter().max_by(|a, b| {
        a.coverage_percent
            .partial_cmp(&b.coverage_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.tools.len().cmp(&a.tools.len()))
    });
    if let Some(best) = best {
        recs.push(format!(
            "maximum coverage: {} at {}",
            best.label.yellow(),
            format!("{:.1}%", best.coverage_percent).bold(),
        ));

        let efficient = combinations
            .iter()
            .filter(|c| c.tools.len() > 1)
            .max_by(|a, b| {
                a.efficiency_per_tool
                    .partial_cmp(&b.efficiency_per_tool)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(eff) = efficient {
            recs.push(format!(
                "most efficient combination: {} ({:.1}% coverage per tool)",
                eff.label.yellow(),
                eff.efficiency_per_tool,
            ));
        }
    }
    recs
}
