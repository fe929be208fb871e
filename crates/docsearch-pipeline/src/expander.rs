use std::sync::Arc;

use docsearch_core::config::ExpansionConfig;
use docsearch_core::traits::{QueryGenParams, QueryGenerator};
use docsearch_core::{Error, Result, Stage};

pub const MIN_QUERIES: usize = 1;
pub const MAX_QUERIES: usize = 10;

/// Expanded text for one document, plus what went into it.
#[derive(Debug)]
pub struct Expansion {
    pub text: String,
    pub queries: Vec<String>,
    /// Set when generation failed and `text` is the unexpanded fallback.
    pub error: Option<Error>,
}

/// Appends doc2query-style synthetic queries to a document's text.
#[derive(Clone)]
pub struct DocumentExpander {
    generator: Arc<dyn QueryGenerator>,
    params: QueryGenParams,
}

impl DocumentExpander {
    pub fn new(generator: Arc<dyn QueryGenerator>, cfg: &ExpansionConfig, seed: u64) -> Self {
        let params = QueryGenParams {
            num_sequences: cfg.num_queries.clamp(MIN_QUERIES, MAX_QUERIES),
            temperature: cfg.temperature,
            top_k: cfg.top_k,
            max_input_tokens: cfg.max_input_tokens,
            max_output_tokens: cfg.max_query_tokens,
            no_repeat_ngram_size: cfg.no_repeat_ngram_size,
            seed,
        };
        Self { generator, params }
    }

    pub fn default_num_queries(&self) -> usize { self.params.num_sequences }

    /// Distinct, non-empty queries for `text`, at most `num_queries` of them.
    pub fn generate_queries(&self, text: &str, num_queries: usize) -> Result<Vec<String>> {
        let n = num_queries.clamp(MIN_QUERIES, MAX_QUERIES);
        let params = QueryGenParams { num_sequences: n, ..self.params.clone() };
        let raw = self.generator.generate_queries(text, &params).map_err(|e| Error::model(Stage::Expansion, e))?;
        let mut queries = collapse_queries(raw);
        queries.truncate(n);
        Ok(queries)
    }

    /// Never fails: a generation error yields the unexpanded text.
    pub fn expand(&self, title: &str, body: &str, num_queries: usize) -> String {
        self.expand_detailed(title, body, num_queries).text
    }

    pub fn expand_detailed(&self, title: &str, body: &str, num_queries: usize) -> Expansion {
        let base = base_text(title, body);
        if base.is_empty() {
            return Expansion { text: base, queries: Vec::new(), error: None };
        }
        match self.generate_queries(&base, num_queries) {
            Ok(queries) => Expansion { text: compose(&base, &queries), queries, error: None },
            Err(e) => {
                tracing::warn!(stage = %Stage::Expansion, error = %e, "expansion failed; using unexpanded text");
                Expansion { text: base, queries: Vec::new(), error: Some(e) }
            }
        }
    }
}

/// `"{title}. {body}"`, or whichever half is present. A half counts as
/// absent when it is blank; present halves are used verbatim.
pub fn base_text(title: &str, body: &str) -> String {
    match (title.trim().is_empty(), body.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => title.to_string(),
        (true, false) => body.to_string(),
        (false, false) => format!("{title}. {body}"),
    }
}

/// Trim, drop empties and collapse exact duplicates, keeping first occurrences.
pub fn collapse_queries(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for q in raw {
        let q = q.trim();
        if !q.is_empty() && !out.iter().any(|seen| seen == q) {
            out.push(q.to_string());
        }
    }
    out
}

pub fn compose(base: &str, queries: &[String]) -> String {
    if queries.is_empty() {
        return base.to_string();
    }
    format!("{base}\n\nPotential queries: {}", queries.join(" | "))
}
