use crate::types::{BulkOutcome, IndexedDocument, StoreQuery, StoreResponse};

/// Sampling controls for synthetic query generation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGenParams {
    pub num_sequences: usize,
    pub temperature: f64,
    pub top_k: usize,
    /// Input is truncated to this many tokens before generation.
    pub max_input_tokens: usize,
    /// Cap on each generated sequence.
    pub max_output_tokens: usize,
    /// 0 disables the constraint.
    pub no_repeat_ngram_size: usize,
    pub seed: u64,
}

impl Default for QueryGenParams {
    fn default() -> Self {
        Self {
            num_sequences: 5,
            temperature: 0.7,
            top_k: 10,
            max_input_tokens: 512,
            max_output_tokens: 64,
            no_repeat_ngram_size: 2,
            seed: 42,
        }
    }
}

/// Length budget for free-form generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationLength {
    /// Prompt plus generated tokens.
    MaxLength(usize),
    MaxNewTokens(usize),
}

impl GenerationLength {
    /// Number of tokens that may still be generated after a prompt of
    /// `prompt_tokens`.
    pub fn new_token_budget(self, prompt_tokens: usize) -> usize {
        match self {
            GenerationLength::MaxLength(total) => total.saturating_sub(prompt_tokens),
            GenerationLength::MaxNewTokens(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub length: GenerationLength,
    pub temperature: f64,
    pub seed: u64,
}

/// doc2query-style generator: text in, candidate queries out.
pub trait QueryGenerator: Send + Sync {
    fn generate_queries(&self, text: &str, params: &QueryGenParams) -> anyhow::Result<Vec<String>>;
}

/// Cross-encoder: one relevance score per (query, document) pair, in input order.
pub trait PairScorer: Send + Sync {
    fn score_pairs(&self, query: &str, documents: &[String]) -> anyhow::Result<Vec<f32>>;
}

/// Causal generator. The returned text includes the echoed prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> anyhow::Result<String>;
}

/// Read side of the index store.
pub trait IndexStore: Send + Sync {
    fn query(&self, query: &StoreQuery) -> anyhow::Result<StoreResponse>;
}

/// Write side of the index store. Writes are exclusive, hence `&mut self`.
pub trait IndexSink {
    /// Create the index if absent; with `force`, drop and recreate it.
    fn create_index(&mut self, force: bool) -> anyhow::Result<()>;
    /// Upsert documents by `doc_id` in a single write.
    fn bulk_upsert(&mut self, docs: &[IndexedDocument]) -> anyhow::Result<BulkOutcome>;
}

impl<T: IndexStore + ?Sized> IndexStore for std::sync::Arc<T> {
    fn query(&self, query: &StoreQuery) -> anyhow::Result<StoreResponse> { (**self).query(query) }
}
