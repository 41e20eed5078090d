//! `rk failures`: ways retrieval goes wrong before generation starts.

use std::io::{self, Write};

use clap::Args;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, DocId, Document, ScoreError};
use ragkit_search::retrieve::{Retrieved, VectorStore};
use ragkit_search::semantic::cosine_scores;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, clip, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk failures`.
#[derive(Args, Debug, Default)]
pub struct FailuresArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailureCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: String,
    pub query_vector: Vec<f64>,
    pub k: usize,
    pub documents: Vec<Document>,
    /// Documents that answer the query. Empty when the corpus has none.
    #[serde(default)]
    pub relevant: Vec<DocId>,
    #[serde(default)]
    pub lesson: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailuresScenario {
    pub cases: Vec<FailureCase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No document in the corpus answers the query.
    NotInCorpus,
    /// A relevant document exists but fell outside the top k.
    Missed,
    /// A relevant document made the top k.
    Found,
}

impl Outcome {
    const fn code(self) -> &'static str {
        match self {
            Self::NotInCorpus => "not_in_corpus",
            Self::Missed => "missed",
            Self::Found => "found",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::NotInCorpus => "answer not in corpus",
            Self::Missed => "relevant document missed",
            Self::Found => "relevant document retrieved",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RelevantRank {
    pub id: DocId,
    pub rank: usize,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub description: String,
    pub query: String,
    pub k: usize,
    pub retrieved: Vec<Retrieved>,
    /// Full-ranking position of every relevant document.
    pub relevant: Vec<RelevantRank>,
    pub outcome: Outcome,
    /// Best minus worst score within the top k.
    pub score_spread: f64,
    pub lesson: String,
}

/// Report payload for `rk failures`.
#[derive(Debug, Serialize)]
pub struct FailuresOutput {
    pub cases: Vec<CaseReport>,
}

/// Execute `rk failures`.
pub fn run_failures(
    args: &FailuresArgs,
    _config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: FailuresScenario = args.scenario.load(fixtures::FAILURES)?;
    let mut cases = Vec::with_capacity(scenario.cases.len());
    for case in scenario.cases {
        cases.push(diagnose(case).map_err(|err| fail(output, err))?);
    }
    let payload = FailuresOutput { cases };
    render_mode(output, &payload, render_text, render_pretty)
}

fn diagnose(case: FailureCase) -> Result<CaseReport, ScoreError> {
    let corpus = Corpus::new(case.documents)?;
    for id in &case.relevant {
        if corpus.get(id).is_none() {
            return Err(ScoreError::invalid(format!(
                "relevant document '{id}' is not in the corpus"
            )));
        }
    }

    let store = VectorStore::from_corpus(&corpus)?;
    let retrieved = store.search(&case.query_vector, case.k)?;
    let ranking = cosine_scores(&case.query_vector, &corpus)?.ranking();

    let relevant: Vec<RelevantRank> = ranking
        .iter()
        .filter(|r| case.relevant.contains(&r.id))
        .map(|r| RelevantRank {
            id: r.id.clone(),
            rank: r.rank,
            score: r.score,
        })
        .collect();

    let outcome = if case.relevant.is_empty() {
        Outcome::NotInCorpus
    } else if retrieved.iter().any(|r| case.relevant.contains(&r.id)) {
        Outcome::Found
    } else {
        Outcome::Missed
    };

    let score_spread = match (retrieved.first(), retrieved.last()) {
        (Some(best), Some(worst)) => best.score - worst.score,
        _ => 0.0,
    };
    debug!(case = %case.name, ?outcome, score_spread, "diagnosed retrieval");

    Ok(CaseReport {
        name: case.name,
        description: case.description,
        query: case.query,
        k: case.k,
        retrieved,
        relevant,
        outcome,
        score_spread,
        lesson: case.lesson,
    })
}

fn render_text(payload: &FailuresOutput, w: &mut dyn Write) -> io::Result<()> {
    for case in &payload.cases {
        let ids: Vec<&str> = case.retrieved.iter().map(|r| r.id.as_str()).collect();
        writeln!(
            w,
            "{}\toutcome={}\tretrieved={}\tspread={:.4}",
            case.name,
            case.outcome.code(),
            ids.join(","),
            case.score_spread
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &FailuresOutput, w: &mut dyn Write) -> io::Result<()> {
    for (i, case) in payload.cases.iter().enumerate() {
        pretty_section(w, &format!("Failure mode {}: {}", i + 1, case.name))?;
        if !case.description.is_empty() {
            writeln!(w, "{}", case.description)?;
        }
        pretty_kv(w, "Query", &case.query)?;
        writeln!(w, "Top {} retrieved:", case.k)?;
        for r in &case.retrieved {
            let star = if case.relevant.iter().any(|rel| rel.id == r.id) {
                " *"
            } else {
                "  "
            };
            writeln!(
                w,
                "  {:>2}.{star}[{:.4}] {}",
                r.rank,
                r.score,
                clip(&r.text, 52)
            )?;
        }
        for rel in &case.relevant {
            if rel.rank > case.k {
                writeln!(
                    w,
                    "  relevant {} sits at rank {} ({:.4}), below the cut",
                    rel.id, rel.rank, rel.score
                )?;
            }
        }
        pretty_kv(w, "Outcome", case.outcome.label())?;
        pretty_kv(w, "Spread", format!("{:.4} between best and worst kept", case.score_spread))?;
        if !case.lesson.is_empty() {
            writeln!(w, "{}", case.lesson)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Vec<CaseReport> {
        let scenario: FailuresScenario = fixtures::load(None, fixtures::FAILURES).unwrap();
        scenario
            .cases
            .into_iter()
            .map(|case| diagnose(case).unwrap())
            .collect()
    }

    #[test]
    fn outcomes_per_failure_mode() {
        let outcomes: Vec<Outcome> = bundled().iter().map(|c| c.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::NotInCorpus,
                Outcome::Missed,
                Outcome::Found,
                Outcome::Found
            ]
        );
    }

    #[test]
    fn missing_knowledge_still_returns_k_documents() {
        let cases = bundled();
        assert_eq!(cases[0].retrieved.len(), 3);
        assert!(cases[0].retrieved.iter().all(|r| r.score > 0.6));
    }

    #[test]
    fn vocabulary_mismatch_ranks_the_answer_third() {
        let cases = bundled();
        assert_eq!(cases[1].relevant[0].rank, 3);
        let ids: Vec<&str> = cases[1].retrieved.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d4", "d3"]);
    }

    #[test]
    fn needle_is_found_but_the_field_is_crowded() {
        let cases = bundled();
        let needle = &cases[3];
        assert_eq!(needle.retrieved[0].id.as_str(), "d5");
        assert!(needle.retrieved.iter().all(|r| r.score > 0.8));
    }

    #[test]
    fn outcome_codes_match_json() {
        for outcome in [Outcome::NotInCorpus, Outcome::Missed, Outcome::Found] {
            assert_eq!(serde_json::to_value(outcome).unwrap(), outcome.code());
        }
    }

    #[test]
    fn unknown_relevant_id_is_invalid_input() {
        let case = FailureCase {
            name: "typo".into(),
            description: String::new(),
            query: "q".into(),
            query_vector: vec![1.0, 0.0],
            k: 1,
            documents: vec![Document::new("d1", "text").with_vector(vec![1.0, 0.0])],
            relevant: vec![DocId::new("d9")],
            lesson: String::new(),
        };
        let err = diagnose(case).unwrap_err();
        assert!(err.to_string().contains("'d9'"));
    }
}
