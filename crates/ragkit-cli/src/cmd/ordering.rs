//! `rk ordering`: lost in the middle.

use std::io::{self, Write};

use clap::Args;
use ragkit_context::ordering::{AttentionLevel, OrderingStrategy, attention_weight};
use ragkit_core::config::RagkitConfig;
use serde::{Deserialize, Serialize};

use crate::fixtures::{self, ScenarioArgs};
use crate::output::{OutputMode, bar, clip, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `rk ordering`.
#[derive(Args, Debug, Default)]
pub struct OrderingArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderingScenario {
    pub query: String,
    pub documents: Vec<String>,
    /// Zero-based index of the document holding the answer.
    pub answer_index: usize,
}

#[derive(Debug, Serialize)]
pub struct Slot {
    pub position: usize,
    pub weight: f64,
    pub level: AttentionLevel,
}

#[derive(Debug, Serialize)]
pub struct PlacedDoc {
    #[serde(flatten)]
    pub slot: Slot,
    /// Index in the scenario's document list.
    pub source_index: usize,
    pub text: String,
    pub is_answer: bool,
}

#[derive(Debug, Serialize)]
pub struct Arrangement {
    pub title: String,
    pub strategy: OrderingStrategy,
    pub documents: Vec<PlacedDoc>,
    pub answer_position: usize,
    pub answer_weight: f64,
}

/// Report payload for `rk ordering`.
#[derive(Debug, Serialize)]
pub struct OrderingOutput {
    pub query: String,
    pub profile: Vec<Slot>,
    pub arrangements: Vec<Arrangement>,
}

/// Execute `rk ordering`.
pub fn run_ordering(
    args: &OrderingArgs,
    _config: &RagkitConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let scenario: OrderingScenario = args.scenario.load(fixtures::ORDERING)?;
    let payload = arrange(&scenario).map_err(|err| fail(output, err))?;
    render_mode(output, &payload, render_text, render_pretty)
}

fn slot(position: usize, total: usize) -> Slot {
    let weight = attention_weight(position, total);
    Slot {
        position,
        weight,
        level: AttentionLevel::from_weight(weight),
    }
}

fn arrange(scenario: &OrderingScenario) -> ragkit_core::error::Result<OrderingOutput> {
    let total = scenario.documents.len();
    let answer = scenario.answer_index;
    let plans = [
        ("Answer in the middle", OrderingStrategy::RelevanceFirst),
        ("Answer moved to the front", OrderingStrategy::MoveToFront { index: answer }),
        ("Answer moved to the back", OrderingStrategy::MoveToBack { index: answer }),
        ("Interleaved by rank", OrderingStrategy::Interleave),
    ];

    let mut arrangements = Vec::with_capacity(plans.len());
    for (title, strategy) in plans {
        let order = strategy.permutation(total)?;
        let documents: Vec<PlacedDoc> = order
            .iter()
            .enumerate()
            .map(|(position, &source_index)| PlacedDoc {
                slot: slot(position, total),
                source_index,
                text: scenario.documents[source_index].clone(),
                is_answer: source_index == answer,
            })
            .collect();
        let answer_position = order.iter().position(|&i| i == answer).unwrap_or(answer);
        arrangements.push(Arrangement {
            title: title.to_owned(),
            strategy,
            documents,
            answer_position,
            answer_weight: attention_weight(answer_position, total),
        });
    }

    Ok(OrderingOutput {
        query: scenario.query.clone(),
        profile: (0..total).map(|p| slot(p, total)).collect(),
        arrangements,
    })
}

fn render_text(payload: &OrderingOutput, w: &mut dyn Write) -> io::Result<()> {
    for s in &payload.profile {
        writeln!(w, "slot\t{}\t{:.3}\t{}", s.position + 1, s.weight, s.level.label())?;
    }
    for a in &payload.arrangements {
        let order: Vec<String> = a
            .documents
            .iter()
            .map(|d| (d.source_index + 1).to_string())
            .collect();
        writeln!(
            w,
            "arrangement\t{}\torder={}\tanswer_position={}\tanswer_weight={:.3}",
            a.title,
            order.join(","),
            a.answer_position + 1,
            a.answer_weight
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &OrderingOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "Query", &payload.query)?;
    writeln!(w)?;

    pretty_section(w, "Modelled attention by position")?;
    let last = payload.profile.len().saturating_sub(1);
    for s in &payload.profile {
        let note = if s.position == 0 {
            "  <- start"
        } else if s.position == last {
            "  <- end"
        } else if s.position == payload.profile.len() / 2 {
            "  <- middle"
        } else {
            ""
        };
        writeln!(w, "  {:>2} {:<40} {:.2}{note}", s.position + 1, bar(s.weight), s.weight)?;
    }
    writeln!(w)?;

    for a in &payload.arrangements {
        pretty_section(w, &a.title)?;
        for d in &a.documents {
            let star = if d.is_answer { " *" } else { "  " };
            writeln!(
                w,
                "  {:>2}.{star}[{:<4} {:.2}] {}",
                d.slot.position + 1,
                d.slot.level.label(),
                d.slot.weight,
                clip(&d.text, 48)
            )?;
        }
        pretty_kv(
            w,
            "Answer",
            format!(
                "position {} of {}, attention {:.2}",
                a.answer_position + 1,
                a.documents.len(),
                a.answer_weight
            ),
        )?;
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> OrderingOutput {
        let scenario: OrderingScenario = fixtures::load(None, fixtures::ORDERING).unwrap();
        arrange(&scenario).unwrap()
    }

    #[test]
    fn middle_answer_gets_the_least_attention() {
        let out = bundled();
        let middle = &out.arrangements[0];
        assert_eq!(middle.answer_position, 3);
        assert!((middle.answer_weight - 0.4).abs() < 1e-12);
    }

    #[test]
    fn moving_the_answer_to_an_edge_restores_attention() {
        let out = bundled();
        assert_eq!(out.arrangements[1].answer_position, 0);
        assert_eq!(out.arrangements[2].answer_position, 6);
        assert!((out.arrangements[1].answer_weight - 1.0).abs() < 1e-12);
        assert!((out.arrangements[2].answer_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interleave_order_matches_rank_pattern() {
        let out = bundled();
        let order: Vec<usize> = out.arrangements[3]
            .documents
            .iter()
            .map(|d| d.source_index)
            .collect();
        assert_eq!(order, vec![0, 2, 4, 6, 5, 3, 1]);
    }

    #[test]
    fn out_of_range_answer_is_invalid_input() {
        let scenario = OrderingScenario {
            query: "q".into(),
            documents: vec!["a".into(), "b".into()],
            answer_index: 5,
        };
        let err = arrange(&scenario).unwrap_err();
        assert_eq!(err.code().code(), "E1001");
    }

    #[test]
    fn profile_levels_are_u_shaped() {
        let labels: Vec<&str> = bundled().profile.iter().map(|s| s.level.label()).collect();
        assert_eq!(labels, vec!["HIGH", "HIGH", "MED", "LOW", "MED", "HIGH", "HIGH"]);
    }
}
