//! `rk pipeline`: retrieve, then generate.

use std::io::{self, Write};

use anyhow::bail;
use clap::Args;
use ragkit_context::pipeline::{ExtractiveGenerator, PipelineTrace, RagPipeline};
use ragkit_context::ContextError;
use ragkit_core::config::RagkitConfig;
use ragkit_core::{Corpus, Document};
use ragkit_search::retrieve::VectorStore;
use ragkit_search::semantic::FixtureEmbedder;
use serde::{Deserialize, Serialize};

use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, clip, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk pipeline`.
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Ask only this question (must be one of the scenario's questions).
    #[arg(long, short = 'q')]
    pub question: Option<String>,

    /// Documents to retrieve per question (defaults to `retrieval.top_k`).
    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,

    /// Include the full prompt in pretty output.
    #[arg(long)]
    pub show_prompt: bool,

    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

/// A question with its precomputed embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionVector {
    pub question: String,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineScenario {
    pub documents: Vec<Document>,
    pub questions: Vec<QuestionVector>,
}

/// Report payload for `rk pipeline`.
#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub top_k: usize,
    pub traces: Vec<PipelineTrace>,
    #[serde(skip)]
    show_prompt: bool,
}

/// Execute `rk pipeline`.
pub fn run_pipeline(
    args: &PipelineArgs,
    config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: PipelineScenario = args.scenario.load(fixtures::PIPELINE)?;
    let questions: Vec<String> = match &args.question {
        Some(question) => {
            if !scenario.questions.iter().any(|q| &q.question == question) {
                bail!(
                    "question {question:?} has no embedding in the scenario; \
                     known questions: {}",
                    scenario
                        .questions
                        .iter()
                        .map(|q| format!("{:?}", q.question))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            vec![question.clone()]
        }
        None => scenario.questions.iter().map(|q| q.question.clone()).collect(),
    };

    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);
    let traces =
        answer_all(scenario, &questions, top_k).map_err(|err| fail(output, err))?;
    let payload = PipelineOutput {
        top_k,
        traces,
        show_prompt: args.show_prompt,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn answer_all(
    scenario: PipelineScenario,
    questions: &[String],
    top_k: usize,
) -> Result<Vec<PipelineTrace>, ContextError> {
    let embedder = FixtureEmbedder::new(
        scenario
            .questions
            .into_iter()
            .map(|q| (q.question, q.vector)),
    )?;
    let store = VectorStore::from_corpus(&Corpus::new(scenario.documents)?)?;
    let pipeline = RagPipeline::new(embedder, store, ExtractiveGenerator).with_top_k(top_k);

    questions.iter().map(|q| pipeline.answer(q)).collect()
}

fn render_text(payload: &PipelineOutput, w: &mut dyn Write) -> io::Result<()> {
    for trace in &payload.traces {
        let ids: Vec<&str> = trace.retrieved.iter().map(|r| r.id.as_str()).collect();
        writeln!(
            w,
            "{}\tretrieved={}\tanswer={}",
            trace.question,
            ids.join(","),
            trace.answer
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &PipelineOutput, w: &mut dyn Write) -> io::Result<()> {
    for trace in &payload.traces {
        pretty_section(w, &trace.question)?;
        writeln!(w, "Step 1, retrieve top {}:", payload.top_k)?;
        for r in &trace.retrieved {
            writeln!(w, "  {:>2}. [{:.4}] {}", r.rank, r.score, clip(&r.text, 56))?;
        }
        if payload.show_prompt {
            writeln!(w, "Step 2, prompt:")?;
            for line in trace.prompt.text.lines() {
                writeln!(w, "  | {line}")?;
            }
        } else {
            writeln!(
                w,
                "Step 2, prompt: {} passages, {} characters (--show-prompt to print)",
                trace.prompt.passages.len(),
                trace.prompt.text.chars().count()
            )?;
        }
        writeln!(w, "Step 3, generate ({}):", trace.generator)?;
        pretty_kv(w, "Answer", &trace.answer)?;
        writeln!(w)?;
    }
    Ok(())
}
