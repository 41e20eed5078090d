//! `rk hybrid`: BM25, dense, weighted fusion and RRF over one corpus.

use std::io::{self, Write};

use clap::Args;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, Document, Query, ScoreError};
use ragkit_search::fusion::{FusionMethod, HybridHit, HybridScorer};
use serde::{Deserialize, Serialize};

use super::{RankedRow, ranked_rows, write_ranked_rows, write_ranked_tsv};
use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, clip, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk hybrid`.
#[derive(Args, Debug, Default)]
pub struct HybridArgs {
    /// Semantic weight for weighted fusion (repeatable). Overrides the
    /// scenario's alphas.
    #[arg(long = "alpha", value_name = "ALPHA")]
    pub alphas: Vec<f64>,

    /// RRF constant.
    #[arg(long, value_name = "K")]
    pub rrf_k: Option<usize>,

    /// Number of fused results to show.
    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,

    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HybridScenario {
    pub query: String,
    pub query_vector: Vec<f64>,
    pub documents: Vec<Document>,
    #[serde(default)]
    pub alphas: Vec<f64>,
    pub rrf_k: Option<usize>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct FusedRun {
    pub method: FusionMethod,
    pub hits: Vec<HybridHit>,
}

/// Report payload for `rk hybrid`.
#[derive(Debug, Serialize)]
pub struct HybridOutput {
    pub query: String,
    pub top_k: usize,
    pub lexical: Vec<RankedRow>,
    pub semantic: Vec<RankedRow>,
    pub weighted: Vec<FusedRun>,
    pub reciprocal_rank: FusedRun,
    #[serde(skip)]
    texts: Vec<(String, String)>,
}

impl HybridOutput {
    fn text_of(&self, id: &str) -> &str {
        self.texts
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map_or("", |(_, text)| text.as_str())
    }
}

/// Fusion parameters after flag, scenario and config precedence.
#[derive(Debug, Clone, PartialEq)]
struct Plan {
    alphas: Vec<f64>,
    rrf_k: usize,
    top_k: usize,
}

fn plan(args: &HybridArgs, scenario: &HybridScenario, config: &RagkitConfig) -> Plan {
    let alphas = if !args.alphas.is_empty() {
        args.alphas.clone()
    } else if !scenario.alphas.is_empty() {
        scenario.alphas.clone()
    } else {
        vec![config.fusion.alpha]
    };
    Plan {
        alphas,
        rrf_k: args.rrf_k.or(scenario.rrf_k).unwrap_or(config.fusion.rrf_k),
        top_k: args.top_k.or(scenario.top_k).unwrap_or(config.retrieval.top_k),
    }
}

/// Execute `rk hybrid`.
pub fn run_hybrid(
    args: &HybridArgs,
    config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: HybridScenario = args.scenario.load(fixtures::HYBRID)?;
    let plan = plan(args, &scenario, config);
    let payload = score_all(scenario, &plan, config).map_err(|err| fail(output, err))?;
    render_mode(output, &payload, render_text, render_pretty)
}

fn score_all(
    scenario: HybridScenario,
    plan: &Plan,
    config: &RagkitConfig,
) -> Result<HybridOutput, ScoreError> {
    let corpus = Corpus::new(scenario.documents)?;
    let query = Query::new(scenario.query).with_vector(scenario.query_vector);
    let scorer = HybridScorer::from_config(config);

    let run = |method: FusionMethod| -> Result<_, ScoreError> {
        scorer.clone().with_method(method).score(&query, &corpus)
    };

    let rrf = run(FusionMethod::ReciprocalRank { k: plan.rrf_k })?;
    let mut weighted = Vec::with_capacity(plan.alphas.len());
    for &alpha in &plan.alphas {
        let result = run(FusionMethod::Weighted { alpha })?;
        weighted.push(FusedRun {
            method: result.method,
            hits: result.top(plan.top_k).to_vec(),
        });
    }

    Ok(HybridOutput {
        lexical: ranked_rows(&rrf.lexical.ranking(), &corpus),
        semantic: ranked_rows(&rrf.semantic.ranking(), &corpus),
        reciprocal_rank: FusedRun {
            method: rrf.method,
            hits: rrf.top(plan.top_k).to_vec(),
        },
        weighted,
        top_k: plan.top_k,
        texts: corpus
            .iter()
            .map(|doc| (doc.id.to_string(), doc.text.clone()))
            .collect(),
        query: query.text,
    })
}

fn method_label(method: &FusionMethod) -> String {
    match method {
        FusionMethod::Weighted { alpha } => format!("weighted alpha={alpha}"),
        FusionMethod::ReciprocalRank { k } => format!("rrf k={k}"),
    }
}

fn render_text(payload: &HybridOutput, w: &mut dyn Write) -> io::Result<()> {
    write_ranked_tsv(w, "bm25", &payload.lexical)?;
    write_ranked_tsv(w, "dense", &payload.semantic)?;
    for run in payload.weighted.iter().chain(std::iter::once(&payload.reciprocal_rank)) {
        let label = method_label(&run.method);
        for hit in &run.hits {
            writeln!(w, "{label}\t{}\t{}\t{:.6}", hit.rank, hit.id, hit.score)?;
        }
    }
    Ok(())
}

fn write_hits(w: &mut dyn Write, payload: &HybridOutput, run: &FusedRun) -> io::Result<()> {
    for hit in &run.hits {
        writeln!(
            w,
            "  {:>2}. [{:.4}] {:<4} bm25 #{:<2} dense #{:<2} {}",
            hit.rank,
            hit.score,
            hit.id.as_str(),
            hit.lexical_rank,
            hit.semantic_rank,
            clip(payload.text_of(hit.id.as_str()), 36)
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &HybridOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "Query", &payload.query)?;
    writeln!(w)?;

    pretty_section(w, "BM25 only (lexical)")?;
    write_ranked_rows(w, &payload.lexical[..payload.top_k.min(payload.lexical.len())])?;
    writeln!(w)?;
    pretty_section(w, "Dense only (semantic)")?;
    write_ranked_rows(w, &payload.semantic[..payload.top_k.min(payload.semantic.len())])?;
    writeln!(w)?;

    for run in &payload.weighted {
        if let FusionMethod::Weighted { alpha } = run.method {
            pretty_section(
                w,
                &format!("Weighted fusion: {:.1} x BM25 + {alpha:.1} x dense", 1.0 - alpha),
            )?;
        }
        write_hits(w, payload, run)?;
        writeln!(w)?;
    }

    pretty_section(
        w,
        &format!("Reciprocal rank fusion ({})", method_label(&payload.reciprocal_rank.method)),
    )?;
    write_hits(w, payload, &payload.reciprocal_rank)?;
    writeln!(w, "  RRF uses only ranks, so no score normalization is needed.")?;
    Ok(())
}
