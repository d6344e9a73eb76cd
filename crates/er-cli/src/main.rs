#![forbid(unsafe_code)]

//! Prompt-driven ER diagram CLI.
//!
//! # Commands
//!
//! - `generate`: Turn a Spanish prompt into an ER graph, editing `--graph` when given
//! - `extract`: Output the recognized table, column and relation edits as JSON
//! - `lexicon`: Show how the heuristics see individual words

use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use er_core::{
    EngineConfig, Graph, categorize_entity, is_stopword, is_type_keyword, normalize_token,
    word_forms,
};
use er_engine::{DiagramCatalog, Pipeline};
use er_intent::extract_intents;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Prompt-driven ER diagram CLI - generate and edit entity-relationship graphs.
#[derive(Debug, Parser)]
#[command(
    name = "er-cli",
    version,
    about = "Prompt-driven ER diagram CLI - generate and edit entity-relationship graphs",
    long_about = "Turns Spanish natural-language instructions into entity-relationship graphs.\n\n\
        Explicit edits (create table, add column, relate tables) are applied to an\n\
        existing graph; free text falls back to keyword diagrams and synthesis."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate or edit a graph from a prompt.
    Generate {
        /// Prompt text, a file containing it, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Existing graph to edit (JSON, or YAML by extension)
        #[arg(short, long)]
        graph: Option<String>,

        /// Engine configuration (TOML, JSON or YAML by extension)
        #[arg(short, long)]
        config: Option<String>,

        /// Keyword catalog of canned diagrams (JSON, or YAML by extension)
        #[arg(long)]
        catalog: Option<String>,

        /// Never replace a supplied graph with a catalog or synthesized diagram
        #[arg(long)]
        preserve_graph: bool,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Output only the graph, without strategy and feedback
        #[arg(long)]
        graph_only: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract the edits recognized in a prompt and output them as JSON.
    Extract {
        /// Prompt text, a file containing it, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show normalization, number forms and category of words.
    Lexicon {
        /// Words to inspect.
        #[arg(required = true)]
        words: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Result of a generate run.
#[derive(Debug, Serialize)]
struct GenerateResult {
    strategy: &'static str,
    node_count: usize,
    edge_count: usize,
    elapsed_ms: f64,
    feedback: Vec<FeedbackEntry>,
    graph: Graph,
}

#[derive(Debug, Serialize)]
struct FeedbackEntry {
    code: &'static str,
    message: String,
}

/// How the heuristics classify one word.
#[derive(Debug, Serialize)]
struct LexiconEntry {
    word: String,
    normalized: String,
    forms: Vec<String>,
    category: &'static str,
    stopword: bool,
    type_keyword: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Generate {
            input,
            graph,
            config,
            catalog,
            preserve_graph,
            output,
            graph_only,
            pretty,
        } => cmd_generate(
            &input,
            graph.as_deref(),
            config.as_deref(),
            catalog.as_deref(),
            preserve_graph,
            output.as_deref(),
            graph_only,
            pretty,
        ),

        Command::Extract { input, pretty } => cmd_extract(&input, pretty),

        Command::Lexicon { words, json } => cmd_lexicon(&words, json),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline prompt text
        Ok(input.to_string())
    }
}

/// Read a structured file, choosing the format from its extension.
fn load_structured<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path).context(format!("Failed to read file: {path}"))?;
    let extension = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    debug!(path, format = extension.as_deref().unwrap_or("json"), "loading");
    match extension.as_deref() {
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&content).context(format!("Invalid YAML in {path}"))
        }
        Some("toml") => toml::from_str(&content).context(format!("Invalid TOML in {path}")),
        _ => serde_json::from_str(&content).context(format!("Invalid JSON in {path}")),
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');
    Ok(json)
}

// =============================================================================
// Command: generate
// =============================================================================

fn cmd_generate(
    input: &str,
    graph_path: Option<&str>,
    config_path: Option<&str>,
    catalog_path: Option<&str>,
    preserve_graph: bool,
    output: Option<&str>,
    graph_only: bool,
    pretty: bool,
) -> Result<()> {
    let prompt = load_input(input)?;
    let mut config = match config_path {
        Some(path) => load_structured::<EngineConfig>(path)?,
        None => EngineConfig::default(),
    };
    config.preserve_graph |= preserve_graph;
    let catalog = match catalog_path {
        Some(path) => {
            let catalog = load_structured::<DiagramCatalog>(path)?;
            if catalog.is_empty() {
                warn!("Catalog has no entries: {path}");
            }
            catalog
        }
        None => DiagramCatalog::default(),
    };
    let graph = graph_path.map(load_structured::<Graph>).transpose()?;

    let pipeline = Pipeline::new(config)
        .context("Invalid engine configuration")?
        .with_catalog(catalog);
    let resolved = pipeline.config();
    debug!(
        strategies = ?resolved.strategies.iter().map(|strategy| strategy.as_str()).collect::<Vec<_>>(),
        max_dynamic_entities = resolved.max_dynamic_entities,
        preserve_graph = resolved.preserve_graph,
        "engine configuration"
    );

    let start = Instant::now();
    let generation = pipeline
        .generate(&prompt, graph.as_ref())
        .context("Failed to apply prompt")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let Some(generation) = generation else {
        bail!("No configured strategy produced a graph for this prompt");
    };

    for item in &generation.feedback {
        warn!(code = item.code(), "{}", item.message());
    }

    let content = if graph_only {
        to_json(&generation.graph, pretty)?
    } else {
        let result = GenerateResult {
            strategy: generation.strategy.as_str(),
            node_count: generation.graph.nodes.len(),
            edge_count: generation.graph.edges.len(),
            elapsed_ms,
            feedback: generation
                .feedback
                .iter()
                .map(|item| FeedbackEntry {
                    code: item.code(),
                    message: item.message(),
                })
                .collect(),
            graph: generation.graph,
        };
        to_json(&result, pretty)?
    };
    write_output(output, &content)
}

// =============================================================================
// Command: extract
// =============================================================================

fn cmd_extract(input: &str, pretty: bool) -> Result<()> {
    let prompt = load_input(input)?;
    let intents = extract_intents(&prompt);
    if !intents.is_actionable() {
        info!(
            relation_intent = intents.relation_intent,
            "no explicit edits recognized"
        );
    }
    write_output(None, &to_json(&intents, pretty)?)
}

// =============================================================================
// Command: lexicon
// =============================================================================

fn cmd_lexicon(words: &[String], json_output: bool) -> Result<()> {
    let entries: Vec<LexiconEntry> = words
        .iter()
        .map(|word| {
            let normalized = normalize_token(word);
            LexiconEntry {
                forms: word_forms(&normalized),
                category: categorize_entity(&normalized).as_str(),
                stopword: is_stopword(&normalized),
                type_keyword: is_type_keyword(&normalized),
                normalized,
                word: word.clone(),
            }
        })
        .collect();

    if json_output {
        return write_output(None, &to_json(&entries, true)?);
    }

    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("Word:        {}", entry.word);
        println!("Normalized:  {}", entry.normalized);
        println!("Forms:       {}", entry.forms.join(", "));
        println!("Category:    {}", entry.category);
        println!("Stop word:   {}", yes_no(entry.stopword));
        println!("Type word:   {}", yes_no(entry.type_keyword));
    }
    Ok(())
}
