use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docsearch_core::types::{Query, TagSet};
use docsearch_pipeline::{GenerateRequest, SearchPipeline};

#[derive(Parser, Debug)]
#[command(name = "docsearch", version, about = "Search, rerank and summarize over a local index")]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weighted lexical retrieval only
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Restrict to documents carrying any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Retrieval, then rerank and summary
    Enhanced {
        query: String,
        #[arg(long, default_value = "50")]
        initial_top_k: usize,
        #[arg(long, default_value = "30")]
        final_top_k: usize,
        #[arg(long)]
        no_rerank: bool,
        #[arg(long)]
        no_summary: bool,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Free-form text generation
    Generate {
        prompt: String,
        /// Prompt plus generated tokens
        #[arg(long, conflicts_with = "max_new_tokens")]
        max_length: Option<usize>,
        #[arg(long)]
        max_new_tokens: Option<usize>,
        #[arg(long)]
        temperature: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    docsearch_cli::init_tracing(cli.verbose);
    let cfg = docsearch_cli::load_app_config(cli.config_dir.as_deref())?;
    let pipeline = SearchPipeline::open(&cfg)?;

    let output = match cli.command {
        Command::Search { query, top_k, tags } => {
            let tags: TagSet = tags.into_iter().collect();
            let results = pipeline.search(&query, top_k.unwrap_or(cfg.search.default_top_k), &tags);
            serde_json::json!({ "results": results })
        }
        Command::Enhanced { query, initial_top_k, final_top_k, no_rerank, no_summary, tags } => {
            let query = Query::new(query)
                .with_top_k(initial_top_k)
                .with_final_top_k(final_top_k)
                .with_rerank(!no_rerank)
                .with_summary(!no_summary)
                .with_tags(tags);
            serde_json::to_value(pipeline.search_with_rerank_and_summary(&query))?
        }
        Command::Generate { prompt, max_length, max_new_tokens, temperature } => {
            let text = pipeline.generate_text(&GenerateRequest { prompt, max_length, max_new_tokens, temperature })?;
            serde_json::json!({ "generated_text": text })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
