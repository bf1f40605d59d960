use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// All settings that can be placed in a .scan-tally.yml config file.
/// Every field is optional — omitted fields fall back to CLI defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    // Run defaults (overridden by the corresponding CLI flag)
    pub results_dir: Option<String>,
    pub out_dir: Option<String>,
    pub format: Option<String>,
    pub output: Option<String>,

    /// Restrict parsing to these tools (bandit, semgrep, safety, codeql).
    pub tools: Option<Vec<String>>,

    /// Alternate reference CWE list for coverage benchmarks. Entries may be
    /// bare numbers or CWE-prefixed; both are normalized on load.
    pub reference_cwes: Option<Vec<String>>,

    /// Extra CodeQL query-name → CWE mappings, merged over the built-in
    /// table (matching names override it).
    pub codeql_queries: Option<BTreeMap<String, String>>,
}

const KNOWN_TOOLS: &[&str] = &["bandit", "semgrep", "safety", "codeql"];

impl TallyConfig {
    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and
    /// what values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<(), String> {
        // format must be one of the two supported report drivers
        if let Some(fmt) = &self.format {
            match fmt.as_str() {
                "terminal" | "json" => {}
                other => {
                    return Err(format!(
                        "Invalid 'format' value: \"{other}\". \
                         Expected one of: \"terminal\", \"json\""
                    ))
                }
            }
        }

        if let Some(tools) = &self.tools {
            if tools.is_empty() {
                return Err("Invalid 'tools' value: empty list. \
                     Omit the field to enable every tool"
                    .to_string());
            }
            for tool in tools {
                if !KNOWN_TOOLS.contains(&tool.as_str()) {
                    return Err(format!(
                        "Unknown tool \"{tool}\" in 'tools'. \
                         Expected any of: {}",
                        KNOWN_TOOLS.join(", ")
                    ));
                }
            }
        }

        if let Some(cwes) = &self.reference_cwes {
            if cwes.is_empty() {
                return Err("Invalid 'reference_cwes' value: empty list. \
                     Omit the field to use the built-in Top 25"
                    .to_string());
            }
        }

        if let Some(queries) = &self.codeql_queries {
            for (query, cwe) in queries {
                if query.trim().is_empty() {
                    return Err("Invalid 'codeql_queries' entry: empty query name".to_string());
                }
                if cwe.trim().is_empty() {
                    return Err(format!(
                        "Invalid 'codeql_queries' mapping for \"{query}\": empty CWE id"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<TallyConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {e}", path.display()))?;
    let cfg: TallyConfig = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid config file '{}': {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| format!("Config file '{}': {e}", path.display()))?;
    Ok(cfg)
}

/// Annotated YAML template — printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# scan-tally configuration file
# Generated by: scan-tally --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
# Save this file as .scan-tally.yml next to your results directory, then run:
#
#   scan-tally --config .scan-tally.yml [results_dir]

# ── Run defaults ───────────────────────────────────────────────────────────────

# Directory holding per-project scanner outputs
# (layout: <results_dir>/<project>/{bandit.json,semgrep.json,safety.json,codeql.csv}).
# results_dir: "results"

# Directory for the CSV interchange tables.
# out_dir: "."

# Report format: terminal, json
# format: "terminal"

# File path for the JSON report (stdout when omitted).
# output: "scan-tally-report.json"

# ── Tool selection ─────────────────────────────────────────────────────────────

# Only parse these scanner outputs. Omit to enable every supported tool.
# tools:
#   - bandit
#   - semgrep
#   - safety
#   - codeql

# ── Reference data ─────────────────────────────────────────────────────────────

# Alternate reference CWE list for coverage benchmarks (bare numbers and
# CWE-prefixed forms both accepted). Omit to use the built-in Top 25.
# reference_cwes:
#   - CWE-79
#   - CWE-89
#   - "22"

# Extra CodeQL query-name → CWE mappings, merged over the built-in table.
# codeql_queries:
#   "Reflected cross-site scripting": "CWE-79"
#   "Server-side request forgery": "CWE-918"
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| format!("Cannot write config template to '{}': {e}", path.display())),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
