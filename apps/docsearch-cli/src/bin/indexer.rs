use clap::Parser;
use std::path::PathBuf;

use docsearch_core::corpus::CorpusLoader;
use docsearch_models::ModelSet;
use docsearch_pipeline::{DocumentExpander, IndexBuilder};
use docsearch_text::TantivyStore;

/// Load a JSONL corpus into the search index.
#[derive(Parser, Debug)]
#[command(name = "docsearch-indexer", version)]
struct Args {
    /// A .jsonl file or a directory of them
    corpus: PathBuf,

    /// Delete and recreate an existing index
    #[arg(long)]
    force: bool,

    /// Documents per bulk write (default from config)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Index at most this many documents
    #[arg(long)]
    limit: Option<usize>,

    /// Synthetic queries per document, 1-10
    #[arg(long)]
    num_queries: Option<usize>,

    /// Skip document expansion
    #[arg(long)]
    no_expand: bool,

    /// Directory holding config.toml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    docsearch_cli::init_tracing(args.verbose);
    let cfg = docsearch_cli::load_app_config(args.config_dir.as_deref())?;

    let corpus = CorpusLoader::new().with_limit(args.limit).load(&args.corpus)?;
    for skipped in corpus.skipped.iter().take(5) {
        tracing::warn!(file = %skipped.file.display(), line = skipped.line, error = %skipped.error, "skipped corpus line");
    }

    let expander = if args.no_expand || !cfg.expansion.enabled {
        tracing::info!("document expansion disabled");
        None
    } else {
        let generator = ModelSet::load_expander_only(&cfg.models)?;
        Some(DocumentExpander::new(generator, &cfg.expansion, cfg.models.seed))
    };

    let dir = cfg.index.dir_path();
    let mut builder = IndexBuilder::new(TantivyStore::at(&dir), expander).with_progress(true);
    if let Some(n) = args.num_queries {
        builder = builder.with_num_queries(n);
    }
    builder.create_index(args.force)?;
    let report = builder.bulk_index(&corpus.documents, args.batch_size.unwrap_or(cfg.indexing.batch_size));

    if !report.errors.is_empty() {
        eprintln!("Errors:\n{}", report.preview(5));
    }
    let summary = serde_json::json!({
        "index_dir": dir.display().to_string(),
        "skipped_lines": corpus.skipped.len(),
        "attempted": report.attempted,
        "indexed": report.indexed,
        "failed": report.failed,
        "expansion_fallbacks": report.expansion_fallbacks,
        "fallback_ids": report.fallbacks.iter().map(|f| f.doc_id.as_str()).collect::<Vec<_>>(),
        "elapsed_secs": report.elapsed.as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
