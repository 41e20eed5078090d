//! Bundled walkthrough scenarios.
//!
//! Every subcommand runs over a JSON scenario. The default one is compiled
//! into the binary; `--scenario <file>` swaps in user data with the same
//! schema.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::de::DeserializeOwned;
use tracing::debug;

pub const TRUNCATE: &str = include_str!("../fixtures/truncate.json");
pub const ORDERING: &str = include_str!("../fixtures/ordering.json");
pub const COSINE: &str = include_str!("../fixtures/cosine.json");
pub const ANALOGY: &str = include_str!("../fixtures/analogy.json");
pub const COMPARE: &str = include_str!("../fixtures/compare.json");
pub const HYBRID: &str = include_str!("../fixtures/hybrid.json");
pub const FAILURES: &str = include_str!("../fixtures/failures.json");
pub const PIPELINE: &str = include_str!("../fixtures/pipeline.json");

/// `--scenario` flag shared by every walkthrough.
#[derive(Args, Debug, Default, Clone)]
pub struct ScenarioArgs {
    /// Run over this JSON file instead of the bundled scenario.
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,
}

impl ScenarioArgs {
    /// Load the user's scenario file, or parse `bundled`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not match the
    /// scenario schema.
    pub fn load<T: DeserializeOwned>(&self, bundled: &str) -> anyhow::Result<T> {
        load(self.scenario.as_deref(), bundled)
    }
}

/// Parse the scenario at `path`, falling back to the `bundled` JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match the scenario
/// schema.
pub fn load<T: DeserializeOwned>(path: Option<&Path>, bundled: &str) -> anyhow::Result<T> {
    match path {
        Some(path) => {
            debug!("loading scenario from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read scenario {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse scenario {}", path.display()))
        }
        None => serde_json::from_str(bundled).context("Failed to parse bundled scenario"),
    }
}
