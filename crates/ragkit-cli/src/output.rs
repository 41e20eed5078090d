//! Rendering for the walkthrough reports.
//!
//! Each command builds one serializable report and hands it to
//! [`render_mode`] with a text renderer (tab-separated, one fact per line) and
//! a pretty renderer (sections and bars). JSON comes straight from `serde`.
//!
//! The mode is picked from, in order: `--format`, the hidden `--json` alias,
//! the `FORMAT` environment variable, and finally whether stdout is a
//! terminal (pretty) or a pipe (text).
//!
//! Library failures go to stderr as an [`ErrorReport`] in the same mode, so a
//! script reading `--format json` gets `{"error": {"message", "hint", "code"}}`.

use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use ragkit_context::ContextError;
use ragkit_core::ScoreError;
use serde::Serialize;

pub const PRETTY_RULE_WIDTH: usize = 72;

/// Width of the bar drawn for a weight of 1.0.
pub const BAR_WIDTH: usize = 40;

/// Heading plus a dashed rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{}", "-".repeat(PRETTY_RULE_WIDTH))
}

/// `Key:        value`, keys padded to a common column.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let key = format!("{key}:");
    writeln!(w, "{key:<12} {}", value.as_ref())
}

/// A `#`-bar proportional to `weight`, clamped to `[0, 1]`.
pub fn bar(weight: f64) -> String {
    let filled = (weight.clamp(0.0, 1.0) * BAR_WIDTH as f64).floor();
    // Bounded by BAR_WIDTH above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = filled as usize;
    "#".repeat(filled)
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections, bars and clipped document text.
    Pretty,
    /// Tab-separated lines for pipes.
    Text,
    /// One JSON document per invocation.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Everything that can influence the output mode.
#[derive(Debug, Clone, Copy)]
struct ModeSources<'a> {
    flag: Option<OutputMode>,
    json_alias: bool,
    env: Option<&'a str>,
    tty: bool,
}

impl ModeSources<'_> {
    fn resolve(self) -> OutputMode {
        if let Some(mode) = self.flag {
            return mode;
        }
        if self.json_alias {
            return OutputMode::Json;
        }
        // Unrecognised FORMAT values are ignored.
        if let Some(mode) = self.env.and_then(|v| OutputMode::from_str(v.trim(), true).ok()) {
            return mode;
        }
        if self.tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        }
    }
}

/// Pick the output mode for this process.
pub fn resolve_output_mode(flag: Option<OutputMode>, json_alias: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    ModeSources {
        flag,
        json_alias,
        env: env.as_deref(),
        tty: io::stdout().is_terminal(),
    }
    .resolve()
}

/// Write `report` to stdout in `mode`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    report: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, report)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(report, &mut out)?,
        OutputMode::Pretty => pretty(report, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// A library failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Stable `E####` code when the failure came from scoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&ScoreError> for ErrorReport {
    fn from(err: &ScoreError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            hint: code.hint().map(str::to_owned),
            code: Some(code.code().to_owned()),
        }
    }
}

impl From<&ContextError> for ErrorReport {
    fn from(err: &ContextError) -> Self {
        match err {
            ContextError::Score(inner) => Self::from(inner),
            ContextError::Generation(_) => Self {
                message: err.to_string(),
                hint: None,
                code: None,
            },
        }
    }
}

/// Write `report` to stderr in `mode`.
pub fn render_error(mode: OutputMode, report: &ErrorReport) -> anyhow::Result<()> {
    let mut out = io::stderr().lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, &serde_json::json!({ "error": report }))?;
        writeln!(out)?;
        return Ok(());
    }
    match &report.code {
        Some(code) => writeln!(out, "error[{code}]: {}", report.message)?,
        None => writeln!(out, "error: {}", report.message)?,
    }
    if let Some(hint) = &report.hint {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}

/// Report a library failure on stderr and turn it into the command's error.
pub fn fail<E>(mode: OutputMode, err: E) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
    for<'a> ErrorReport: From<&'a E>,
{
    match render_error(mode, &ErrorReport::from(&err)) {
        Ok(()) => anyhow::Error::new(err),
        Err(render_err) => render_err.context(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_resolution_order() {
        let cases = [
            // flag beats everything
            (Some(OutputMode::Text), true, Some("pretty"), true, OutputMode::Text),
            // --json beats FORMAT
            (None, true, Some("pretty"), true, OutputMode::Json),
            (None, false, Some("json"), false, OutputMode::Json),
            // FORMAT=pretty wins even when piped
            (None, false, Some("pretty"), false, OutputMode::Pretty),
            (None, false, Some(" TEXT "), true, OutputMode::Text),
            (None, false, Some("yaml"), true, OutputMode::Pretty),
            (None, false, Some("yaml"), false, OutputMode::Text),
            (None, false, None, true, OutputMode::Pretty),
            (None, false, None, false, OutputMode::Text),
        ];
        for (flag, json_alias, env, tty, expected) in cases {
            let sources = ModeSources {
                flag,
                json_alias,
                env,
                tty,
            };
            assert_eq!(sources.resolve(), expected, "{sources:?}");
        }
    }

    #[test]
    fn pretty_kv_pads_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "window", "8000").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "window:      8000\n");
    }

    #[test]
    fn pretty_section_underlines_heading() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Scores").unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("Scores\n"));
        assert!(s.contains(&"-".repeat(PRETTY_RULE_WIDTH)));
    }

    #[test]
    fn bar_scales_with_weight() {
        assert_eq!(bar(1.0).len(), BAR_WIDTH);
        assert_eq!(bar(0.4).len(), 16);
        assert_eq!(bar(-2.0), "");
        assert_eq!(bar(7.0).len(), BAR_WIDTH);
    }

    #[test]
    fn clip_keeps_short_text_and_marks_long_text() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a longer sentence", 10), "a longe...");
    }

    #[test]
    fn score_error_carries_code_and_hint() {
        let err = ScoreError::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.code.as_deref(), Some("E2002"));
        assert!(report.hint.is_some());
        assert!(report.message.contains('4'));
    }

    #[test]
    fn context_error_unwraps_score_error() {
        let err = ContextError::Score(ScoreError::CorpusMismatch("x".into()));
        assert_eq!(ErrorReport::from(&err).code.as_deref(), Some("E3001"));

        let err = ContextError::Generation("model offline".into());
        let report = ErrorReport::from(&err);
        assert!(report.code.is_none());
        assert!(report.message.contains("model offline"));
    }

    #[test]
    fn error_report_json_omits_missing_fields() {
        let report = ErrorReport {
            message: "boom".into(),
            hint: None,
            code: None,
        };
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            serde_json::json!({"message": "boom"})
        );
    }
}
