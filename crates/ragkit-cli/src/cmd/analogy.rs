//! `rk analogy`: vector offsets carry meaning.

use std::io::{self, Write};

use anyhow::Context;
use clap::Args;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, DocId, Document};
use ragkit_search::semantic::{analogy, cosine_similarity, nearest_neighbors, sub};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cosine::WordVector;
use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk analogy`.
#[derive(Args, Debug, Default)]
pub struct AnalogyArgs {
    /// Number of nearest words to list per analogy (overrides the scenario).
    #[arg(long, value_name = "N")]
    pub neighbors: Option<usize>,

    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

/// `a - b + c`, e.g. king - man + woman.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalogySpec {
    pub a: String,
    pub b: String,
    pub c: String,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalogyScenario {
    pub words: Vec<WordVector>,
    #[serde(default)]
    pub analogies: Vec<AnalogySpec>,
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
}

const fn default_neighbors() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalogyResult {
    pub expression: String,
    /// `c - b`, the direction being added.
    pub offset: Vec<f64>,
    pub result: Vec<f64>,
    pub neighbors: Vec<Neighbor>,
    pub expected: Option<String>,
    /// `None` when no expected word was given.
    pub matched: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PairSimilarity {
    pub left: String,
    pub right: String,
    pub similarity: f64,
}

/// Report payload for `rk analogy`.
#[derive(Debug, Serialize)]
pub struct AnalogyOutput {
    pub analogies: Vec<AnalogyResult>,
    pub pairs: Vec<PairSimilarity>,
}

/// Execute `rk analogy`.
pub fn run_analogy(
    args: &AnalogyArgs,
    _config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: AnalogyScenario = args.scenario.load(fixtures::ANALOGY)?;
    let k = args.neighbors.unwrap_or(scenario.neighbors);
    let table = word_table(&scenario.words).map_err(|err| fail(output, err))?;

    let mut analogies = Vec::with_capacity(scenario.analogies.len());
    for spec in &scenario.analogies {
        analogies.push(solve(&table, spec, k, output)?);
    }

    let mut pairs = Vec::with_capacity(scenario.pairs.len());
    for (left, right) in &scenario.pairs {
        let similarity = cosine_similarity(lookup(&table, left)?, lookup(&table, right)?)
            .map_err(|err| fail(output, err))?;
        pairs.push(PairSimilarity {
            left: left.clone(),
            right: right.clone(),
            similarity,
        });
    }

    let payload = AnalogyOutput { analogies, pairs };
    render_mode(output, &payload, render_text, render_pretty)
}

fn word_table(words: &[WordVector]) -> ragkit_core::error::Result<Corpus> {
    Corpus::new(
        words
            .iter()
            .map(|w| Document::new(w.word.as_str(), w.word.as_str()).with_vector(w.vector.clone()))
            .collect(),
    )
}

fn lookup<'a>(table: &'a Corpus, word: &str) -> anyhow::Result<&'a [f64]> {
    table
        .get(&DocId::new(word))
        .and_then(|doc| doc.vector.as_deref())
        .with_context(|| format!("word '{word}' is not in the scenario's vocabulary"))
}

fn solve(
    table: &Corpus,
    spec: &AnalogySpec,
    k: usize,
    output: OutputMode,
) -> anyhow::Result<AnalogyResult> {
    let (a, b, c) = (
        lookup(table, &spec.a)?,
        lookup(table, &spec.b)?,
        lookup(table, &spec.c)?,
    );
    let offset = sub(c, b).map_err(|err| fail(output, err))?;
    let result = analogy(a, b, c).map_err(|err| fail(output, err))?;

    let exclude = [
        DocId::new(spec.a.as_str()),
        DocId::new(spec.b.as_str()),
        DocId::new(spec.c.as_str()),
    ];
    let ranking =
        nearest_neighbors(&result, table, &exclude, k).map_err(|err| fail(output, err))?;
    let neighbors: Vec<Neighbor> = ranking
        .iter()
        .map(|r| Neighbor {
            word: r.id.to_string(),
            similarity: r.score,
        })
        .collect();

    let matched = spec
        .expected
        .as_ref()
        .map(|expected| neighbors.first().is_some_and(|n| &n.word == expected));
    debug!(
        best = neighbors.first().map(|n| n.word.as_str()),
        "solved {} - {} + {}",
        spec.a,
        spec.b,
        spec.c
    );

    Ok(AnalogyResult {
        expression: format!("{} - {} + {}", spec.a, spec.b, spec.c),
        offset,
        result,
        neighbors,
        expected: spec.expected.clone(),
        matched,
    })
}

fn fmt_vector(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.2}")).collect();
    format!("[{}]", parts.join(", "))
}

fn render_text(payload: &AnalogyOutput, w: &mut dyn Write) -> io::Result<()> {
    for a in &payload.analogies {
        for (i, n) in a.neighbors.iter().enumerate() {
            writeln!(w, "analogy\t{}\t{}\t{}\t{:.6}", a.expression, i + 1, n.word, n.similarity)?;
        }
    }
    for p in &payload.pairs {
        writeln!(w, "pair\t{}\t{}\t{:.6}", p.left, p.right, p.similarity)?;
    }
    Ok(())
}

fn render_pretty(payload: &AnalogyOutput, w: &mut dyn Write) -> io::Result<()> {
    for a in &payload.analogies {
        pretty_section(w, &a.expression)?;
        pretty_kv(w, "Offset", fmt_vector(&a.offset))?;
        pretty_kv(w, "Result", fmt_vector(&a.result))?;
        for (i, n) in a.neighbors.iter().enumerate() {
            let mark = if a.expected.as_deref() == Some(n.word.as_str()) {
                "  <- expected"
            } else {
                ""
            };
            writeln!(w, "  {:>2}. {:<12} {:.4}{mark}", i + 1, n.word, n.similarity)?;
        }
        match a.matched {
            Some(true) => writeln!(w, "  The nearest word is the expected one.")?,
            Some(false) => writeln!(w, "  The nearest word is not the expected one.")?,
            None => {}
        }
        writeln!(w)?;
    }

    if !payload.pairs.is_empty() {
        pretty_section(w, "Word pairs")?;
        for p in &payload.pairs {
            writeln!(w, "  {:<12} {:<12} {:.4}", p.left, p.right, p.similarity)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> AnalogyScenario {
        fixtures::load(None, fixtures::ANALOGY).unwrap()
    }

    #[test]
    fn king_minus_man_plus_woman_is_queen() {
        let scenario = bundled();
        let table = word_table(&scenario.words).unwrap();
        let result = solve(&table, &scenario.analogies[0], 5, OutputMode::Json).unwrap();
        assert_eq!(result.neighbors[0].word, "queen");
        assert_eq!(result.neighbors[1].word, "princess");
        assert_eq!(result.matched, Some(true));
        assert!(result.neighbors.iter().all(|n| n.word != "king" && n.word != "woman"));
    }

    #[test]
    fn offset_is_the_gender_direction() {
        let scenario = bundled();
        let table = word_table(&scenario.words).unwrap();
        let result = solve(&table, &scenario.analogies[0], 3, OutputMode::Json).unwrap();
        assert!((result.offset[4] + 0.8).abs() < 1e-12);
        assert!((result.offset[5] - 0.8).abs() < 1e-12);
        assert_eq!(result.neighbors.len(), 3);
    }

    #[test]
    fn unknown_word_is_reported() {
        let table = word_table(&bundled().words).unwrap();
        let err = lookup(&table, "emperor").unwrap_err();
        assert!(err.to_string().contains("'emperor'"));
    }

    #[test]
    fn fmt_vector_rounds() {
        assert_eq!(fmt_vector(&[0.123, 1.0]), "[0.12, 1.00]");
    }
}
