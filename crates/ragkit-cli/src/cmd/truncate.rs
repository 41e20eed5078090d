//! `rk truncate`: what a fixed context window cuts off.

use std::io::{self, Write};

use clap::Args;
use ragkit_context::budget::{TruncationReport, truncate_to_fit};
use ragkit_core::config::RagkitConfig;
use serde::{Deserialize, Serialize};

use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, clip, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk truncate`.
#[derive(Args, Debug, Default)]
pub struct TruncateArgs {
    /// Window size in tokens to try (repeatable). Overrides the scenario's
    /// windows.
    #[arg(long = "window", value_name = "TOKENS")]
    pub windows: Vec<usize>,

    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

/// Ranked documents, a prompt template and the windows to try.
#[derive(Debug, Clone, Deserialize)]
pub struct TruncateScenario {
    pub query: String,
    pub template: String,
    /// Best first.
    pub documents: Vec<String>,
    #[serde(default)]
    pub windows: Vec<usize>,
    /// Zero-based index of the document that answers the query.
    pub answer_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct WindowRun {
    #[serde(flatten)]
    pub report: TruncationReport,
    /// `None` when the scenario names no answer document.
    pub answer_included: Option<bool>,
}

/// Report payload for `rk truncate`.
#[derive(Debug, Serialize)]
pub struct TruncateOutput {
    pub query: String,
    pub documents: Vec<String>,
    pub answer_index: Option<usize>,
    pub runs: Vec<WindowRun>,
}

/// Execute `rk truncate`.
pub fn run_truncate(
    args: &TruncateArgs,
    config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: TruncateScenario = args.scenario.load(fixtures::TRUNCATE)?;
    let windows = pick_windows(&args.windows, &scenario.windows, config.context.max_tokens);
    let payload = truncate_windows(scenario, &windows);
    render_mode(output, &payload, render_text, render_pretty)
}

/// Flag values, else the scenario's windows, else the configured window.
fn pick_windows(flags: &[usize], scenario: &[usize], configured: usize) -> Vec<usize> {
    if !flags.is_empty() {
        flags.to_vec()
    } else if !scenario.is_empty() {
        scenario.to_vec()
    } else {
        vec![configured]
    }
}

fn truncate_windows(scenario: TruncateScenario, windows: &[usize]) -> TruncateOutput {
    let runs = windows
        .iter()
        .map(|&max_tokens| {
            let report = truncate_to_fit(
                &scenario.documents,
                max_tokens,
                &scenario.query,
                &scenario.template,
            );
            let answer_included = scenario.answer_index.map(|idx| report.includes(idx));
            WindowRun {
                report,
                answer_included,
            }
        })
        .collect();
    TruncateOutput {
        query: scenario.query,
        documents: scenario.documents,
        answer_index: scenario.answer_index,
        runs,
    }
}

fn answer_label(included: Option<bool>) -> &'static str {
    match included {
        Some(true) => "included",
        Some(false) => "excluded",
        None => "n/a",
    }
}

fn render_text(payload: &TruncateOutput, w: &mut dyn Write) -> io::Result<()> {
    for run in &payload.runs {
        let r = &run.report;
        writeln!(
            w,
            "window={} overhead={} available={} used={} included={} excluded={} answer={}",
            r.max_tokens,
            r.overhead_tokens,
            r.available_tokens,
            r.used_tokens,
            r.included_count(),
            r.excluded_count(),
            answer_label(run.answer_included)
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &TruncateOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "Query", &payload.query)?;
    writeln!(w)?;

    for run in &payload.runs {
        let r = &run.report;
        pretty_section(w, &format!("Window of {} tokens", r.max_tokens))?;
        pretty_kv(w, "Overhead", format!("{} tokens (template + query)", r.overhead_tokens))?;
        pretty_kv(w, "Available", format!("{} tokens", r.available_tokens))?;
        pretty_kv(
            w,
            "Used",
            format!("{} tokens by {} document(s)", r.used_tokens, r.included_count()),
        )?;
        for doc in r.included.iter().chain(&r.excluded) {
            let mark = if r.includes(doc.index) { "kept" } else { "cut " };
            let star = if payload.answer_index == Some(doc.index) {
                " *answer*"
            } else {
                ""
            };
            let text = payload
                .documents
                .get(doc.index)
                .map(String::as_str)
                .unwrap_or_default();
            writeln!(
                w,
                "  [{mark}] Doc {} ({:>3} tokens){star} {}",
                doc.index + 1,
                doc.tokens,
                clip(text, 40)
            )?;
        }
        match run.answer_included {
            Some(true) => writeln!(w, "  The answer document made it into the context.")?,
            Some(false) => writeln!(
                w,
                "  The answer document was cut: the model cannot see it, however good retrieval was."
            )?,
            None => {}
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> TruncateScenario {
        fixtures::load(None, fixtures::TRUNCATE).unwrap()
    }

    #[test]
    fn windows_prefer_flags_then_scenario_then_config() {
        assert_eq!(pick_windows(&[10], &[20], 30), vec![10]);
        assert_eq!(pick_windows(&[], &[20, 21], 30), vec![20, 21]);
        assert_eq!(pick_windows(&[], &[], 30), vec![30]);
    }

    #[test]
    fn large_window_keeps_everything() {
        let out = truncate_windows(bundled(), &[8000]);
        let run = &out.runs[0];
        assert_eq!(run.report.included_count(), 5);
        assert_eq!(run.answer_included, Some(true));
    }

    #[test]
    fn small_window_cuts_the_answer() {
        let out = truncate_windows(bundled(), &[120]);
        let run = &out.runs[0];
        assert_eq!(run.report.included_count(), 1);
        assert_eq!(run.answer_included, Some(false));
    }

    #[test]
    fn text_output_has_one_line_per_window() {
        let out = truncate_windows(bundled(), &[8000, 120]);
        let mut buf = Vec::new();
        render_text(&out, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("answer=excluded"));
    }

    #[test]
    fn json_report_flattens_the_budget() {
        let out = truncate_windows(bundled(), &[120]);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["runs"][0]["max_tokens"], 120);
        assert_eq!(json["runs"][0]["answer_included"], false);
    }
}
