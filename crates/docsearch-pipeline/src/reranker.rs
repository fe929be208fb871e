use std::sync::Arc;
use std::time::Instant;

use docsearch_core::config::RerankConfig;
use docsearch_core::traits::PairScorer;
use docsearch_core::types::{truncate_chars, Candidate, RankedCandidate};
use docsearch_core::{Error, Result, Stage};

/// Cross-encoder reordering of a candidate set.
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn PairScorer>,
    body_prefix_chars: usize,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairScorer>, cfg: &RerankConfig) -> Self {
        Self { scorer, body_prefix_chars: cfg.body_prefix_chars }
    }

    /// `"{title} {body prefix}"`, with tags appended when there are any.
    pub fn scoring_text(&self, c: &Candidate) -> String {
        let mut text = format!("{} {}", c.title, truncate_chars(&c.body, self.body_prefix_chars));
        if !c.tags.is_empty() {
            text.push_str(" [");
            text.push_str(&c.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", "));
            text.push(']');
        }
        text
    }

    /// At most `top_k` candidates ordered by raw cross-encoder score,
    /// descending; equal scores keep their input order. The input is left
    /// untouched so callers can fall back to it.
    pub fn rerank(&self, query: &str, candidates: &[Candidate], top_k: usize) -> Result<Vec<RankedCandidate>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let texts: Vec<String> = candidates.iter().map(|c| self.scoring_text(c)).collect();
        let scores = self.scorer.score_pairs(query, &texts).map_err(|e| Error::model(Stage::Rerank, e))?;
        if scores.len() != candidates.len() {
            return Err(Error::model(Stage::Rerank, format!("expected {} scores, got {}", candidates.len(), scores.len())));
        }
        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(Error::model(Stage::Rerank, format!("non-finite score for {}", candidates[bad].doc_id)));
        }
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        // sort_by is stable
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(top_k);
        let ranked: Vec<RankedCandidate> = order
            .into_iter()
            .map(|i| RankedCandidate { candidate: candidates[i].clone(), rerank_score: scores[i] })
            .collect();
        tracing::debug!(pairs = texts.len(), kept = ranked.len(), elapsed_ms = started.elapsed().as_millis() as u64, "reranked");
        Ok(ranked)
    }
}
