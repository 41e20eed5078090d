//! `rk cosine`: what cosine similarity does and does not measure.

use std::io::{self, Write};

use clap::Args;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, Document, ScoreError};
use ragkit_search::semantic::{cosine_scores, cosine_similarity};
use serde::{Deserialize, Serialize};

use super::{RankedRow, ranked_rows, write_ranked_rows, write_ranked_tsv};
use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk cosine`.
#[derive(Args, Debug, Default)]
pub struct CosineArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorPair {
    pub label: String,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordVector {
    pub word: String,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorQuery {
    pub text: String,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CosineScenario {
    #[serde(default)]
    pub pairs: Vec<VectorPair>,
    #[serde(default)]
    pub words: Vec<WordVector>,
    pub query: Option<VectorQuery>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct PairScore {
    pub label: String,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct WordScore {
    pub left: String,
    pub right: String,
    pub similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct DocumentRanking {
    pub query: String,
    pub ranking: Vec<RankedRow>,
}

/// Report payload for `rk cosine`.
#[derive(Debug, Serialize)]
pub struct CosineOutput {
    pub pairs: Vec<PairScore>,
    pub words: Vec<WordScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentRanking>,
}

/// Execute `rk cosine`.
pub fn run_cosine(
    args: &CosineArgs,
    _config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: CosineScenario = args.scenario.load(fixtures::COSINE)?;
    let payload = compare_vectors(scenario).map_err(|err| fail(output, err))?;
    render_mode(output, &payload, render_text, render_pretty)
}

fn compare_vectors(scenario: CosineScenario) -> Result<CosineOutput, ScoreError> {
    let mut pairs = Vec::with_capacity(scenario.pairs.len());
    for pair in scenario.pairs {
        let similarity = cosine_similarity(&pair.left, &pair.right)?;
        pairs.push(PairScore {
            label: pair.label,
            left: pair.left,
            right: pair.right,
            similarity,
        });
    }

    let mut words = Vec::new();
    for (i, left) in scenario.words.iter().enumerate() {
        for right in &scenario.words[i + 1..] {
            words.push(WordScore {
                left: left.word.clone(),
                right: right.word.clone(),
                similarity: cosine_similarity(&left.vector, &right.vector)?,
            });
        }
    }

    let documents = match scenario.query {
        Some(query) if !scenario.documents.is_empty() => {
            let corpus = Corpus::new(scenario.documents)?;
            let ranking = cosine_scores(&query.vector, &corpus)?.ranking();
            Some(DocumentRanking {
                query: query.text,
                ranking: ranked_rows(&ranking, &corpus),
            })
        }
        _ => None,
    };

    Ok(CosineOutput {
        pairs,
        words,
        documents,
    })
}

fn render_text(payload: &CosineOutput, w: &mut dyn Write) -> io::Result<()> {
    for p in &payload.pairs {
        writeln!(w, "pair\t{}\t{:.6}", p.label, p.similarity)?;
    }
    for s in &payload.words {
        writeln!(w, "word\t{}\t{}\t{:.6}", s.left, s.right, s.similarity)?;
    }
    if let Some(docs) = &payload.documents {
        write_ranked_tsv(w, "doc", &docs.ranking)?;
    }
    Ok(())
}

fn render_pretty(payload: &CosineOutput, w: &mut dyn Write) -> io::Result<()> {
    if !payload.pairs.is_empty() {
        pretty_section(w, "Geometry")?;
        for p in &payload.pairs {
            writeln!(
                w,
                "  {:<28} {:?} vs {:?} -> {:+.4}",
                p.label, p.left, p.right, p.similarity
            )?;
        }
        writeln!(w, "  Only the angle counts: scaling a vector leaves the score unchanged.")?;
        writeln!(w)?;
    }

    if !payload.words.is_empty() {
        pretty_section(w, "Word similarity")?;
        for s in &payload.words {
            writeln!(w, "  {:<10} {:<10} {:.4}", s.left, s.right, s.similarity)?;
        }
        writeln!(w)?;
    }

    if let Some(docs) = &payload.documents {
        pretty_section(w, "Documents ranked against the query")?;
        pretty_kv(w, "Query", &docs.query)?;
        write_ranked_rows(w, &docs.ranking)?;
        writeln!(w)?;
    }
    Ok(())
}
