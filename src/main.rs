mod analyzers;
mod config;
mod cwe;
mod parsers;
mod reporters;
mod types;

use clap::Parser;
use cwe::CweCatalog;
use indicatif::{ProgressBar, ProgressStyle};
use parsers::codeql::{QueryMap, DEFAULT_QUERY_MAP};
use parsers::ToolKind;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use types::*;

#[derive(Parser, Debug)]
#[command(
    name = "scan-tally",
    about = "🛡 Merge multi-scanner security findings into CWE coverage and agreement reports",
    version,
    long_about = "Reads raw security-scanner outputs (Bandit, Semgrep, Safety, CodeQL),\n\
                  normalizes them into one CWE findings table, and reports per-tool\n\
                  Top-25 coverage plus pairwise/combination tool agreement.\n\n\
                  Expected layout:\n\
                    <RESULTS_DIR>/<project>/bandit.json\n\
                    <RESULTS_DIR>/<project>/semgrep.json\n\
                    <RESULTS_DIR>/<project>/safety.json\n\
                    <RESULTS_DIR>/<project>/codeql.csv"
)]
struct Args {
    /// Directory containing per-project scanner outputs.
    #[arg(value_name = "RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Report format: terminal, json
    #[arg(long)]
    format: Option<String>,

    /// Output file for --format json (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for the CSV interchange tables
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip writing the CSV tables
    #[arg(long)]
    no_csv: bool,

    /// Analyze a single project subdirectory only
    #[arg(long)]
    project: Option<String>,

    /// Only parse these tools (comma-separated: bandit,semgrep,safety,codeql)
    #[arg(long, value_delimiter = ',')]
    tools: Vec<String>,

    /// Path to a .scan-tally.yml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print an annotated config template and exit (honors --output)
    #[arg(long)]
    generate_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.generate_config {
        if let Err(e) = config::print_template(args.output.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cfg = match &args.config {
        Some(path) => match config::load_config(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => config::TallyConfig::default(),
    };

    let settings = match Settings::resolve(&args, &cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_analysis(&settings) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// ─── Resolved run settings ─────────────────────────────────────────────────────

/// Effective settings after merging CLI flags over config-file values over
/// built-in defaults (CLI always wins).
#[derive(Debug)]
struct Settings {
    results_dir: PathBuf,
    out_dir: PathBuf,
    format: String,
    output: Option<PathBuf>,
    write_csv: bool,
    project: Option<String>,
    enabled_tools: Option<BTreeSet<ToolKind>>,
    catalog: CweCatalog,
    query_map: QueryMap,
}

impl Settings {
    fn resolve(args: &Args, cfg: &config::TallyConfig) -> Result<Settings, String> {
        let format = args
            .format
            .clone()
            .or_else(|| cfg.format.clone())
            .unwrap_or_else(|| "terminal".to_string());
        match format.as_str() {
            "terminal" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid --format value: \"{other}\". Expected one of: \"terminal\", \"json\""
                ))
            }
        }

        let tool_names: Option<Vec<String>> = if !args.tools.is_empty() {
            Some(args.tools.clone())
        } else {
            cfg.tools.clone()
        };
        let enabled_tools = match tool_names {
            Some(names) => {
                let mut set = BTreeSet::new();
                for name in &names {
                    let kind = ToolKind::from_name(name).ok_or_else(|| {
                        format!(
                            "Unknown tool \"{name}\". \
                             Expected any of: bandit, semgrep, safety, codeql"
                        )
                    })?;
                    set.insert(kind);
                }
                Some(set)
            }
            None => None,
        };

        let catalog = match &cfg.reference_cwes {
            Some(ids) => CweCatalog::with_reference_set(ids),
            None => CweCatalog::top25(),
        };

        let mut query_map = DEFAULT_QUERY_MAP.clone();
        if let Some(extra) = &cfg.codeql_queries {
            query_map.extend(extra.clone());
        }

        Ok(Settings {
            results_dir: args
                .results_dir
                .clone()
                .or_else(|| cfg.results_dir.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("results")),
            out_dir: args
                .out
                .clone()
                .or_else(|| cfg.out_dir.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(".")),
            output: args
                .output
                .clone()
                .or_else(|| cfg.output.clone().map(PathBuf::from)),
            write_csv: !args.no_csv,
            project: args.project.clone(),
            format,
            enabled_tools,
            catalog,
            query_map,
        })
    }
}

// ─── Analysis pipeline ─────────────────────────────────────────────────────────

fn run_analysis(settings: &Settings) -> Result<(), String> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(80));

    let total_start = Instant::now();
    let mut step_start = Instant::now();

    pb.set_message("[1/4] Discovering scanner outputs...");
    let inputs = discover_inputs(
        &settings.results_dir,
        settings.project.as_deref(),
        settings.enabled_tools.as_ref(),
    )?;
    if inputs.is_empty() {
        pb.println(format!(
            "  ⚠ No recognized scanner outputs under '{}' — the report will be empty",
            settings.results_dir.display()
        ));
    }
    let t1 = fmt_dur(step_start.elapsed());
    step_start = Instant::now();
    pb.println(format!("  ✓ [1/4] Discovering scanner outputs          {t1}"));

    pb.set_message("[2/4] Parsing and normalizing findings...");
    let findings = collect_findings(&inputs, &settings.catalog, &settings.query_map);
    let t2 = fmt_dur(step_start.elapsed());
    step_start = Instant::now();
    pb.println(format!("  ✓ [2/4] Parsing and normalizing findings     {t2}"));

    pb.set_message("[3/4] Computing coverage and agreement...");
    let coverage = analyzers::coverage::analyze_coverage(&findings, &settings.catalog);
    let pairwise = analyzers::agreement::analyze_pairwise(&coverage);
    let combinations = analyzers::agreement::analyze_combinations(&coverage);
    let stats = analyzers::agreement::summarize(&pairwise, &coverage);
    let t3 = fmt_dur(step_start.elapsed());
    step_start = Instant::now();
    pb.println(format!("  ✓ [3/4] Computing coverage and agreement     {t3}"));

    let projects: BTreeSet<&str> = inputs.iter().map(|i| i.project.as_str()).collect();
    let report = Report {
        meta: ReportMeta {
            results_dir: settings.results_dir.display().to_string(),
            project_count: projects.len(),
            tool_count: coverage.len(),
            finding_rows: findings.len(),
            top25_benchmark: settings.catalog.benchmark(),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        },
        findings,
        coverage,
        pairwise,
        combinations,
        stats,
    };

    pb.set_message("[4/4] Exporting tables...");
    if settings.write_csv {
        let written = reporters::csv::export_csv(&report, &settings.out_dir)?;
        let t4 = fmt_dur(step_start.elapsed());
        pb.println(format!("  ✓ [4/4] Exporting tables                     {t4}"));
        for path in &written {
            pb.println(format!("      → {}", path.display()));
        }
    } else {
        pb.println("  - [4/4] Exporting tables                     skipped (--no-csv)");
    }

    pb.finish_and_clear();
    eprintln!(
        "✔ {} project(s), {} tool(s), {} finding row(s) — ⏱ {}",
        report.meta.project_count,
        report.meta.tool_count,
        report.meta.finding_rows,
        fmt_dur(total_start.elapsed()),
    );

    match settings.format.as_str() {
        "json" => reporters::json::report_json(&report, settings.output.as_deref())?,
        _ => reporters::terminal::report_terminal(&report),
    }

    Ok(())
}

// ─── Input discovery ───────────────────────────────────────────────────────────

/// One recognized scanner output file.
#[derive(Debug, Clone)]
struct InputFile {
    project: String,
    kind: ToolKind,
    path: PathBuf,
}

/// Walks `<results_dir>/<project>/` and collects every recognized scanner
/// output, sorted by project then tool so downstream work is deterministic.
/// Unrecognized files are ignored; an empty walk is not an error.
fn discover_inputs(
    results_dir: &Path,
    project_filter: Option<&str>,
    enabled_tools: Option<&BTreeSet<ToolKind>>,
) -> Result<Vec<InputFile>, String> {
    if !results_dir.is_dir() {
        return Err(format!(
            "Results directory not found: {}",
            results_dir.display()
        ));
    }

    let entries = std::fs::read_dir(results_dir)
        .map_err(|e| format!("Cannot read '{}': {e}", results_dir.display()))?;
    let mut project_dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    project_dirs.sort();

    let mut inputs = Vec::new();
    for dir in project_dirs {
        let Some(project) = dir.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if let Some(filter) = project_filter {
            if project != filter {
                continue;
            }
        }
        let Ok(files) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut files: Vec<PathBuf> = files.flatten().map(|e| e.path()).collect();
        files.sort();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(kind) = ToolKind::from_file_name(name) else {
                continue;
            };
            if let Some(enabled) = enabled_tools {
                if !enabled.contains(&kind) {
                    continue;
                }
            }
            inputs.push(InputFile {
                project: project.clone(),
                kind,
                path,
            });
        }
    }
    Ok(inputs)
}

/// Parses every input in parallel and flattens the per-file CWE counts into
/// the sorted flat Finding list — one row per (project, tool, CWE).
fn collect_findings(
    inputs: &[InputFile],
    catalog: &CweCatalog,
    query_map: &QueryMap,
) -> Vec<Finding> {
    let mut findings: Vec<Finding> = inputs
        .par_iter()
        .flat_map_iter(|input| {
            let counts = parsers::parse_tool_output(input.kind, &input.path, query_map);
            counts
                .into_iter()
                .map(|(cwe_id, count)| Finding {
                    project: input.project.clone(),
                    tool: input.kind.name().to_string(),
                    is_top25: catalog.is_top25(&cwe_id),
                    cwe_id,
                    count,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    findings.sort_by(|a, b| {
        (&a.project, &a.tool, &a.cwe_id).cmp(&(&b.project, &b.tool, &b.cwe_id))
    });
    findings
}

// ─── Duration formatting ───────────────────────────────────────────────────────

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{ms}ms")
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
