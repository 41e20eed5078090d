//! `rk compare`: BM25 and dense retrieval side by side.

use std::io::{self, Write};

use clap::Args;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, DocId, Document, ScoreError};
use ragkit_search::lexical::{Bm25Params, Bm25Scorer};
use ragkit_search::semantic::cosine_scores;
use serde::{Deserialize, Serialize};

use super::{RankedRow, ranked_rows, write_ranked_rows, write_ranked_tsv};
use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk compare`.
#[derive(Args, Debug, Default)]
pub struct CompareArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: String,
    /// Dense ranking is skipped when absent.
    pub query_vector: Option<Vec<f64>>,
    pub documents: Vec<Document>,
    /// Documents a reader would call relevant.
    #[serde(default)]
    pub relevant: Vec<DocId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareScenario {
    pub scenarios: Vec<CompareCase>,
}

#[derive(Debug, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub description: String,
    pub query: String,
    pub lexical: Vec<RankedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense: Option<Vec<RankedRow>>,
    pub relevant: Vec<DocId>,
    /// Whether the top lexical document is one of `relevant`.
    pub lexical_top_relevant: Option<bool>,
    pub dense_top_relevant: Option<bool>,
}

/// Report payload for `rk compare`.
#[derive(Debug, Serialize)]
pub struct CompareOutput {
    pub scenarios: Vec<CaseResult>,
}

/// Execute `rk compare`.
pub fn run_compare(
    args: &CompareArgs,
    config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: CompareScenario = args.scenario.load(fixtures::COMPARE)?;
    let scorer = Bm25Scorer::new().with_params(Bm25Params::from(&config.lexical));

    let mut scenarios = Vec::with_capacity(scenario.scenarios.len());
    for case in scenario.scenarios {
        scenarios.push(compare_case(&scorer, case).map_err(|err| fail(output, err))?);
    }

    let payload = CompareOutput { scenarios };
    render_mode(output, &payload, render_text, render_pretty)
}

fn top_is_relevant(rows: &[RankedRow], relevant: &[DocId]) -> Option<bool> {
    if relevant.is_empty() {
        return None;
    }
    Some(
        rows.first()
            .is_some_and(|top| relevant.iter().any(|id| id.as_str() == top.id)),
    )
}

fn compare_case(scorer: &Bm25Scorer, case: CompareCase) -> Result<CaseResult, ScoreError> {
    let corpus = Corpus::new(case.documents)?;
    let lexical = ranked_rows(&scorer.score(&case.query, &corpus)?.ranking(), &corpus);
    let dense = match &case.query_vector {
        Some(vector) => Some(ranked_rows(
            &cosine_scores(vector, &corpus)?.ranking(),
            &corpus,
        )),
        None => None,
    };

    Ok(CaseResult {
        lexical_top_relevant: top_is_relevant(&lexical, &case.relevant),
        dense_top_relevant: dense
            .as_deref()
            .and_then(|rows| top_is_relevant(rows, &case.relevant)),
        name: case.name,
        description: case.description,
        query: case.query,
        lexical,
        dense,
        relevant: case.relevant,
    })
}

fn render_text(payload: &CompareOutput, w: &mut dyn Write) -> io::Result<()> {
    for case in &payload.scenarios {
        write_ranked_tsv(w, &format!("{}\tbm25", case.name), &case.lexical)?;
        if let Some(dense) = &case.dense {
            write_ranked_tsv(w, &format!("{}\tdense", case.name), dense)?;
        }
    }
    Ok(())
}

fn verdict(hit: Option<bool>) -> &'static str {
    match hit {
        Some(true) => "relevant document on top",
        Some(false) => "top document is not relevant",
        None => "no relevance labels",
    }
}

fn render_pretty(payload: &CompareOutput, w: &mut dyn Write) -> io::Result<()> {
    for case in &payload.scenarios {
        pretty_section(w, &format!("Scenario: {}", case.name))?;
        if !case.description.is_empty() {
            writeln!(w, "{}", case.description)?;
        }
        pretty_kv(w, "Query", &case.query)?;
        writeln!(w, "\nBM25 (lexical match):")?;
        write_ranked_rows(w, &case.lexical)?;
        pretty_kv(w, "BM25", verdict(case.lexical_top_relevant))?;
        if let Some(dense) = &case.dense {
            writeln!(w, "\nDense (embedding match):")?;
            write_ranked_rows(w, dense)?;
            pretty_kv(w, "Dense", verdict(case.dense_top_relevant))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Vec<CaseResult> {
        let scenario: CompareScenario = fixtures::load(None, fixtures::COMPARE).unwrap();
        scenario
            .scenarios
            .into_iter()
            .map(|case| compare_case(&Bm25Scorer::new(), case).unwrap())
            .collect()
    }

    #[test]
    fn synonyms_favour_dense_retrieval() {
        let cases = bundled();
        let synonyms = &cases[0];
        assert_eq!(synonyms.lexical[0].id, "d4");
        assert_eq!(synonyms.dense.as_ref().unwrap()[0].id, "d3");
        assert_eq!(synonyms.lexical_top_relevant, Some(false));
        assert_eq!(synonyms.dense_top_relevant, Some(true));
    }

    #[test]
    fn technical_terms_favour_bm25() {
        let cases = bundled();
        let technical = &cases[1];
        assert!(technical.dense.is_none());
        assert_eq!(technical.lexical[0].id, "d1");
        assert_eq!(technical.lexical_top_relevant, Some(true));
        assert_eq!(technical.dense_top_relevant, None);
    }

    #[test]
    fn query_vector_without_document_vectors_fails() {
        let case = CompareCase {
            name: "broken".into(),
            description: String::new(),
            query: "car".into(),
            query_vector: Some(vec![1.0, 0.0]),
            documents: vec![Document::new("d1", "car")],
            relevant: Vec::new(),
        };
        let err = compare_case(&Bm25Scorer::new(), case).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }
}
