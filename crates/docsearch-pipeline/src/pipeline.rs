use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use docsearch_core::config::{AppConfig, GenerateConfig};
use docsearch_core::traits::{GenerationLength, GenerationParams, IndexStore, TextGenerator};
use docsearch_core::types::{Candidate, Query, RankedSearchResult, SearchResult, TagSet};
use docsearch_core::{Error, Result, Stage};
use docsearch_models::ModelSet;
use docsearch_text::TantivyStore;

use crate::reranker::Reranker;
use crate::retriever::Retriever;
use crate::summarizer::{strip_prompt_echo, Summarizer, SUMMARY_UNAVAILABLE};

pub const GENERATION_UNAVAILABLE: &str = "Generation unavailable.";

/// Result list of an enhanced search: plain retrieval hits, or reranked
/// hits carrying `rerank_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Hits {
    Retrieved(Vec<SearchResult>),
    Reranked(Vec<RankedSearchResult>),
}

impl Hits {
    pub fn len(&self) -> usize {
        match self {
            Hits::Retrieved(r) => r.len(),
            Hits::Reranked(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn doc_ids(&self) -> Vec<&str> {
        match self {
            Hits::Retrieved(r) => r.iter().map(|h| h.doc_id.as_str()).collect(),
            Hits::Reranked(r) => r.iter().map(|h| h.result.doc_id.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedSearchResponse {
    pub results: Hits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Stages that fell back instead of producing their normal output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Stage>,
}

/// Free-form generation request. `max_new_tokens` wins over `max_length`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_length: Option<usize>,
    pub max_new_tokens: Option<usize>,
    pub temperature: Option<f64>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self { Self { prompt: prompt.into(), ..Default::default() } }
}

/// Retrieve, optionally rerank, optionally summarize.
pub struct SearchPipeline<S: IndexStore> {
    retriever: Retriever<S>,
    reranker: Reranker,
    summarizer: Summarizer,
    generator: Arc<dyn TextGenerator>,
    generate_cfg: GenerateConfig,
    seed: u64,
}

impl SearchPipeline<TantivyStore> {
    /// Open the configured index and load every model; any failure here is fatal.
    pub fn open(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let store = TantivyStore::open(cfg.index.dir_path())?;
        let models = ModelSet::load(&cfg.models, &cfg.rerank)?;
        Ok(Self::new(store, &models, cfg))
    }
}

impl<S: IndexStore> SearchPipeline<S> {
    pub fn new(store: S, models: &ModelSet, cfg: &AppConfig) -> Self {
        Self {
            retriever: Retriever::new(store, cfg.search.clone()),
            reranker: Reranker::new(models.reranker.clone(), &cfg.rerank),
            summarizer: Summarizer::new(models.generator.clone(), &cfg.summary, cfg.models.seed),
            generator: models.generator.clone(),
            generate_cfg: cfg.generate.clone(),
            seed: cfg.models.seed,
        }
    }

    pub fn retriever(&self) -> &Retriever<S> { &self.retriever }

    pub fn search(&self, text: &str, top_k: usize, tags_filter: &TagSet) -> Vec<SearchResult> {
        self.retriever.search(text, top_k, tags_filter)
    }

    pub fn search_with_rerank_and_summary(&self, query: &Query) -> EnhancedSearchResponse {
        let started = Instant::now();
        let q = query.clamped(self.retriever.config().max_top_k);
        let excerpt = self.retriever.config().excerpt_chars;
        let mut degraded = Vec::new();

        let candidates = match self.retriever.retrieve(&q.text, q.top_k, &q.tags_filter) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(stage = %Stage::Retrieval, error = %e, "retrieval failed");
                degraded.push(Stage::Retrieval);
                Vec::new()
            }
        };

        let (results, ordered) = if q.apply_rerank && !candidates.is_empty() {
            match self.reranker.rerank(&q.text, &candidates, q.final_top_k) {
                Ok(ranked) => {
                    let hits = Hits::Reranked(ranked.iter().map(|r| r.to_result(excerpt)).collect());
                    (hits, ranked.into_iter().map(|r| r.candidate).collect::<Vec<Candidate>>())
                }
                Err(e) => {
                    tracing::warn!(stage = %Stage::Rerank, error = %e, "rerank failed; keeping retrieval order");
                    degraded.push(Stage::Rerank);
                    let mut kept = candidates;
                    kept.truncate(q.final_top_k);
                    (Hits::Retrieved(kept.iter().map(|c| c.to_result(excerpt)).collect()), kept)
                }
            }
        } else {
            let mut kept = candidates;
            kept.truncate(q.final_top_k);
            (Hits::Retrieved(kept.iter().map(|c| c.to_result(excerpt)).collect()), kept)
        };

        let summary = if q.apply_summary {
            match self.summarizer.enhance(&q.text, &ordered) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(stage = %Stage::Summary, error = %e, "summary failed");
                    degraded.push(Stage::Summary);
                    Some(SUMMARY_UNAVAILABLE.to_string())
                }
            }
        } else {
            None
        };

        tracing::info!(
            top_k = q.top_k,
            final_top_k = q.final_top_k,
            results = results.len(),
            degraded = degraded.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "enhanced search"
        );
        EnhancedSearchResponse { results, summary, degraded }
    }

    fn validate(&self, req: &GenerateRequest) -> Result<GenerationParams> {
        let g = &self.generate_cfg;
        if req.prompt.trim().is_empty() {
            return Err(Error::InvalidInput("prompt must not be empty".into()));
        }
        let max_length = req.max_length.unwrap_or(g.default_max_length);
        if !(1..=g.max_length_limit).contains(&max_length) {
            return Err(Error::InvalidInput(format!("max_length must be in [1, {}], got {max_length}", g.max_length_limit)));
        }
        if req.max_new_tokens == Some(0) {
            return Err(Error::InvalidInput("max_new_tokens must be >= 1".into()));
        }
        let temperature = req.temperature.unwrap_or(g.default_temperature);
        if !(g.min_temperature..=g.max_temperature).contains(&temperature) {
            return Err(Error::InvalidInput(format!(
                "temperature must be in [{}, {}], got {temperature}",
                g.min_temperature, g.max_temperature
            )));
        }
        let length = req.max_new_tokens.map_or(GenerationLength::MaxLength(max_length), GenerationLength::MaxNewTokens);
        Ok(GenerationParams { length, temperature, seed: self.seed })
    }

    /// Generated continuation of the prompt, without the echo. Bad input is
    /// an error; an inference failure is not.
    pub fn generate_text(&self, req: &GenerateRequest) -> Result<String> {
        let params = self.validate(req)?;
        match self.generator.generate(&req.prompt, &params) {
            Ok(out) => Ok(strip_prompt_echo(&out, &req.prompt)),
            Err(e) => {
                tracing::warn!(stage = %Stage::Generation, error = %e, "generation failed");
                Ok(GENERATION_UNAVAILABLE.to_string())
            }
        }
    }
}
