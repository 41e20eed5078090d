#![forbid(unsafe_code)]

mod cmd;
mod fixtures;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use ragkit_core::config::load_config;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ragkit: lexical, semantic and hybrid retrieval, walked through",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read settings from this TOML file instead of `ragkit.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Context",
        about = "Show what a context window cuts off",
        long_about = "Fit ranked documents into context windows of several sizes and report \
                      the token budget, which documents were kept and whether the answer survived.",
        after_help = "EXAMPLES:\n    # Bundled refund-policy scenario at 8000 and 120 tokens\n    rk truncate\n\n    # Try other window sizes\n    rk truncate --window 200 --window 300\n\n    # Emit machine-readable output\n    rk truncate --format json"
    )]
    Truncate(cmd::truncate::TruncateArgs),

    #[command(
        next_help_heading = "Context",
        about = "Show the lost-in-the-middle effect",
        long_about = "Print the modelled attention curve and place the answer document in the \
                      middle, at the front, at the back and by interleaving.",
        after_help = "EXAMPLES:\n    # Bundled seven-document scenario\n    rk ordering\n\n    # Use your own documents\n    rk ordering --scenario docs.json"
    )]
    Ordering(cmd::ordering::OrderingArgs),

    #[command(
        next_help_heading = "Embeddings",
        about = "Explore cosine similarity",
        long_about = "Score geometric vector pairs, a small word vocabulary and a document set \
                      with cosine similarity.",
        after_help = "EXAMPLES:\n    # Bundled vectors\n    rk cosine\n\n    # Tab-separated scores for scripts\n    rk cosine --format text"
    )]
    Cosine(cmd::cosine::CosineArgs),

    #[command(
        next_help_heading = "Embeddings",
        about = "Solve word analogies with vector arithmetic",
        long_about = "Compute a - b + c (king - man + woman) and list the nearest words, \
                      excluding the operands.",
        after_help = "EXAMPLES:\n    # king - man + woman\n    rk analogy\n\n    # Show only the three nearest words\n    rk analogy --neighbors 3"
    )]
    Analogy(cmd::analogy::AnalogyArgs),

    #[command(
        next_help_heading = "Retrieval",
        about = "Compare BM25 and dense rankings",
        long_about = "Rank the same corpus lexically (BM25) and by embedding similarity, on a \
                      synonym-heavy query and a technical-term query.",
        after_help = "EXAMPLES:\n    # Bundled scenarios\n    rk compare\n\n    # Different BM25 constants\n    rk compare --config tuned.toml"
    )]
    Compare(cmd::compare::CompareArgs),

    #[command(
        next_help_heading = "Retrieval",
        about = "Fuse BM25 and dense scores",
        long_about = "Score one corpus with BM25 and cosine similarity, then fuse with weighted \
                      min-max fusion at several alphas and with reciprocal rank fusion.",
        after_help = "EXAMPLES:\n    # Bundled scenario at alpha 0.3, 0.5 and 0.7\n    rk hybrid\n\n    # Lean hard on the dense signal\n    rk hybrid --alpha 0.9\n\n    # Change the RRF constant\n    rk hybrid --rrf-k 10"
    )]
    Hybrid(cmd::hybrid::HybridArgs),

    #[command(
        next_help_heading = "Retrieval",
        about = "Walk through retrieval failure modes",
        long_about = "Run four small corpora that show missing knowledge, vocabulary mismatch, \
                      ambiguous queries and a needle in a haystack.",
        after_help = "EXAMPLES:\n    # All four failure modes\n    rk failures\n\n    # Emit machine-readable output\n    rk failures --format json"
    )]
    Failures(cmd::failures::FailuresArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Retrieve, then generate",
        long_about = "Embed each question, retrieve the top documents, build a grounded prompt \
                      and answer it with the extractive generator.",
        after_help = "EXAMPLES:\n    # Every bundled question\n    rk pipeline\n\n    # One question, with the full prompt\n    rk pipeline -q \"Who founded TechCorp?\" --show-prompt"
    )]
    Pipeline(cmd::pipeline::PipelineArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for rk.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    rk completions bash > ~/.local/share/bash-completion/completions/rk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RAGKIT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ragkit=debug,info"
        } else {
            "ragkit=info,warn"
        })
    });

    let format = env::var("RAGKIT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = env::current_dir()?;
    let config = load_config(cli.config.as_deref(), &project_root)?;
    let output = cli.output_mode();
    debug!(?output, "resolved output mode");

    let command_result = match cli.command {
        Commands::Truncate(ref args) => cmd::truncate::run_truncate(args, &config, output),
        Commands::Ordering(ref args) => cmd::ordering::run_ordering(args, &config, output),
        Commands::Cosine(ref args) => cmd::cosine::run_cosine(args, &config, output),
        Commands::Analogy(ref args) => cmd::analogy::run_analogy(args, &config, output),
        Commands::Compare(ref args) => cmd::compare::run_compare(args, &config, output),
        Commands::Hybrid(ref args) => cmd::hybrid::run_hybrid(args, &config, output),
        Commands::Failures(ref args) => cmd::failures::run_failures(args, &config, output),
        Commands::Pipeline(ref args) => cmd::pipeline::run_pipeline(args, &config, output),
        Commands::Completions(_) => Ok(()),
    };

    command_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["rk", "--json", "hybrid"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_after_subcommand() {
        let cli = Cli::parse_from(["rk", "cosine", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["rk", "compare", "--config", "tuned.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("tuned.toml")));
    }

    #[test]
    fn verbose_flag_parsed() {
        let cli = Cli::parse_from(["rk", "-v", "failures"]);
        assert!(cli.verbose);
    }

    #[test]
    fn truncate_windows_repeat() {
        let cli = Cli::parse_from(["rk", "truncate", "--window", "200", "--window", "300"]);
        match cli.command {
            Commands::Truncate(args) => assert_eq!(args.windows, vec![200, 300]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn hybrid_overrides_parse() {
        let cli = Cli::parse_from([
            "rk", "hybrid", "--alpha", "0.2", "--alpha", "0.8", "--rrf-k", "10", "--top-k", "2",
        ]);
        match cli.command {
            Commands::Hybrid(args) => {
                assert_eq!(args.alphas, vec![0.2, 0.8]);
                assert_eq!(args.rrf_k, Some(10));
                assert_eq!(args.top_k, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn scenario_flag_is_accepted_everywhere() {
        for sub in [
            "truncate", "ordering", "cosine", "analogy", "compare", "hybrid", "failures",
            "pipeline",
        ] {
            let cli = Cli::try_parse_from(["rk", sub, "--scenario", "x.json"]);
            assert!(cli.is_ok(), "{sub} should accept --scenario");
        }
    }

    #[test]
    fn pipeline_question_short_flag() {
        let cli = Cli::parse_from(["rk", "pipeline", "-q", "Who founded TechCorp?"]);
        match cli.command {
            Commands::Pipeline(args) => {
                assert_eq!(args.question.as_deref(), Some("Who founded TechCorp?"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn completions_requires_a_shell() {
        assert!(Cli::try_parse_from(["rk", "completions"]).is_err());
        assert!(Cli::try_parse_from(["rk", "completions", "zsh"]).is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["rk", "--format", "yaml", "cosine"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
