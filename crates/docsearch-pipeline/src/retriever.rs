use std::time::Instant;

use docsearch_core::config::SearchConfig;
use docsearch_core::traits::IndexStore;
use docsearch_core::types::{clamp_top_k, Candidate, FieldClause, MatchOperator, SearchField, SearchResult, StoreQuery, TagSet};
use docsearch_core::{Error, Result, Stage};

/// Weighted multi-field lexical retrieval over an [`IndexStore`].
pub struct Retriever<S: IndexStore> {
    store: S,
    cfg: SearchConfig,
}

impl<S: IndexStore> Retriever<S> {
    pub fn new(store: S, cfg: SearchConfig) -> Self { Self { store, cfg } }

    pub fn config(&self) -> &SearchConfig { &self.cfg }
    pub fn store(&self) -> &S { &self.store }

    /// Title (all terms) outweighs body, which outweighs expanded text.
    pub fn clauses(&self) -> Vec<FieldClause> {
        vec![
            FieldClause { field: SearchField::Title, boost: self.cfg.title_weight, operator: MatchOperator::All },
            FieldClause { field: SearchField::Body, boost: self.cfg.body_weight, operator: MatchOperator::Any },
            FieldClause { field: SearchField::ExpandedText, boost: self.cfg.expanded_weight, operator: MatchOperator::Any },
        ]
    }

    /// Candidates with full bodies and normalized scores. A blank query
    /// returns nothing without touching the store.
    pub fn retrieve(&self, text: &str, top_k: usize, tags_filter: &TagSet) -> Result<Vec<Candidate>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let size = clamp_top_k(top_k, self.cfg.max_top_k);
        let query = StoreQuery { text: text.to_string(), clauses: self.clauses(), tags_filter: tags_filter.clone(), size };
        let started = Instant::now();
        let resp = self.store.query(&query).map_err(|e| Error::store(format!("{e:#}")))?;
        let max_score = resp.max_score.or_else(|| resp.hits.iter().map(|h| h.score).reduce(f32::max)).unwrap_or(0.0);
        let candidates: Vec<Candidate> = resp
            .hits
            .into_iter()
            .take(size)
            .map(|h| Candidate { score: normalize(h.score, max_score), doc_id: h.doc_id, title: h.title, body: h.body, tags: h.tags })
            .collect();
        tracing::debug!(top_k = size, total_hits = resp.total_hits, returned = candidates.len(), elapsed_ms = started.elapsed().as_millis() as u64, "retrieved");
        Ok(candidates)
    }

    /// Soft-failing search: store errors are logged and yield no results.
    pub fn search(&self, text: &str, top_k: usize, tags_filter: &TagSet) -> Vec<SearchResult> {
        match self.retrieve(text, top_k, tags_filter) {
            Ok(candidates) => candidates.iter().map(|c| c.to_result(self.cfg.excerpt_chars)).collect(),
            Err(e) => {
                tracing::warn!(stage = %Stage::Retrieval, error = %e, "search failed; returning no results");
                Vec::new()
            }
        }
    }
}

/// `score / max`, or 0 when the maximum is not positive.
pub fn normalize(score: f32, max_score: f32) -> f32 {
    if max_score > 0.0 && score.is_finite() {
        (score / max_score).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_guards_non_positive_max() {
        assert_eq!(normalize(4.0, 8.0), 0.5);
        assert_eq!(normalize(8.0, 8.0), 1.0);
        assert_eq!(normalize(1.0, 0.0), 0.0);
        assert_eq!(normalize(-1.0, -0.5), 0.0);
    }
}
