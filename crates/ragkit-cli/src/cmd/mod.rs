pub mod analogy;
pub mod compare;
pub mod completions;
pub mod cosine;
pub mod failures;
pub mod hybrid;
pub mod ordering;
pub mod pipeline;
pub mod truncate;

use std::io::{self, Write};

use ragkit_core::{Corpus, RankedDoc, Ranking};
use serde::Serialize;

use crate::output::clip;

/// One ranked document with its text, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRow {
    pub rank: usize,
    pub id: String,
    pub score: f64,
    pub text: String,
}

impl RankedRow {
    fn from_ranked(ranked: &RankedDoc, corpus: &Corpus) -> Self {
        Self {
            rank: ranked.rank,
            id: ranked.id.to_string(),
            score: ranked.score,
            text: corpus
                .get(&ranked.id)
                .map(|doc| doc.text.clone())
                .unwrap_or_default(),
        }
    }
}

/// Attach document texts to a ranking.
pub fn ranked_rows(ranking: &Ranking, corpus: &Corpus) -> Vec<RankedRow> {
    ranking
        .iter()
        .map(|ranked| RankedRow::from_ranked(ranked, corpus))
        .collect()
}

/// `  1. [0.9729] d5  Refund policy: ...`
pub fn write_ranked_rows(w: &mut dyn Write, rows: &[RankedRow]) -> io::Result<()> {
    for row in rows {
        writeln!(
            w,
            "  {:>2}. [{:.4}] {:<4} {}",
            row.rank,
            row.score,
            row.id,
            clip(&row.text, 52)
        )?;
    }
    Ok(())
}

/// `rank<TAB>id<TAB>score` lines.
pub fn write_ranked_tsv(w: &mut dyn Write, label: &str, rows: &[RankedRow]) -> io::Result<()> {
    for row in rows {
        writeln!(w, "{label}\t{}\t{}\t{:.6}", row.rank, row.id, row.score)?;
    }
    Ok(())
}
