#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docsearch_core::traits::{GenerationParams, IndexSink, IndexStore, PairScorer, QueryGenParams, QueryGenerator, TextGenerator};
use docsearch_core::types::{BulkOutcome, Document, IndexedDocument, StoreHit, StoreQuery, StoreResponse, TagSet};
use docsearch_models::ModelSet;

pub fn hit(id: &str, score: f32, title: &str, body: &str, tags: &[&str]) -> StoreHit {
    StoreHit { doc_id: id.into(), score, title: title.into(), body: body.into(), tags: tags.iter().map(|t| t.to_string()).collect() }
}

pub fn tags(list: &[&str]) -> TagSet { list.iter().map(|t| t.to_string()).collect() }

pub fn document(id: &str, title: &str, body: &str) -> Document {
    Document { doc_id: id.into(), title: title.into(), body: body.into(), tags: TagSet::new() }
}

/// Returns canned hits (at most `size`) and records every query.
#[derive(Default)]
pub struct MockStore {
    pub hits: Vec<StoreHit>,
    pub fail: bool,
    pub queries: Mutex<Vec<StoreQuery>>,
}

impl MockStore {
    pub fn with_hits(hits: Vec<StoreHit>) -> Self { Self { hits, ..Default::default() } }
    pub fn failing() -> Self { Self { fail: true, ..Default::default() } }
    pub fn calls(&self) -> usize { self.queries.lock().unwrap().len() }
    pub fn last(&self) -> StoreQuery { self.queries.lock().unwrap().last().cloned().expect("no query") }
}

impl IndexStore for MockStore {
    fn query(&self, query: &StoreQuery) -> Result<StoreResponse> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail { return Err(anyhow!("connection refused")); }
        let hits: Vec<StoreHit> = self.hits.iter().take(query.size).cloned().collect();
        Ok(StoreResponse { total_hits: self.hits.len(), max_score: hits.first().map(|h| h.score), hits })
    }
}

/// Records each bulk call; can reject ids or fail whole calls.
#[derive(Default)]
pub struct MockSink {
    pub batches: Vec<Vec<IndexedDocument>>,
    pub reject: Vec<String>,
    pub fail_calls: bool,
}

impl IndexSink for MockSink {
    fn create_index(&mut self, _force: bool) -> Result<()> { Ok(()) }

    fn bulk_upsert(&mut self, docs: &[IndexedDocument]) -> Result<BulkOutcome> {
        self.batches.push(docs.to_vec());
        if self.fail_calls { return Err(anyhow!("store rejected the batch")); }
        let mut outcome = BulkOutcome::default();
        for d in docs {
            if self.reject.contains(&d.document.doc_id) {
                outcome.failed.push((d.document.doc_id.clone(), "mapping conflict".into()));
            } else {
                outcome.indexed += 1;
            }
        }
        Ok(outcome)
    }
}

/// Replays a fixed list of queries, or fails on texts containing `fail_on`.
#[derive(Default)]
pub struct ScriptedQueries {
    pub output: Vec<String>,
    pub fail_on: Option<String>,
    pub seen: Mutex<Vec<QueryGenParams>>,
}

impl QueryGenerator for ScriptedQueries {
    fn generate_queries(&self, text: &str, params: &QueryGenParams) -> Result<Vec<String>> {
        self.seen.lock().unwrap().push(params.clone());
        if self.fail_on.as_deref().is_some_and(|f| text.contains(f)) { return Err(anyhow!("CUDA out of memory")); }
        Ok(self.output.clone())
    }
}

/// Scores pairs from a fixed list, in order.
pub struct FixedScores {
    pub scores: Vec<f32>,
    pub calls: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
}

impl FixedScores {
    pub fn new(scores: Vec<f32>) -> Self { Self { scores, calls: AtomicUsize::new(0), texts: Mutex::new(Vec::new()) } }
}

impl PairScorer for FixedScores {
    fn score_pairs(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().extend(documents.iter().cloned());
        Ok(self.scores.iter().copied().take(documents.len()).collect())
    }
}

pub struct BrokenScorer;

impl PairScorer for BrokenScorer {
    fn score_pairs(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>> { Err(anyhow!("model not responding")) }
}

/// Echoes the prompt followed by `continuation`, recording every call.
pub struct EchoGenerator {
    pub continuation: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl EchoGenerator {
    pub fn new(continuation: &str) -> Self { Self { continuation: continuation.into(), fail: false, prompts: Mutex::new(Vec::new()) } }
    pub fn failing() -> Self { Self { fail: true, ..Self::new("") } }
    pub fn calls(&self) -> usize { self.prompts.lock().unwrap().len() }
}

impl TextGenerator for EchoGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push((prompt.to_string(), params.clone()));
        if self.fail { return Err(anyhow!("generation timed out")); }
        Ok(format!("{prompt} {}", self.continuation))
    }
}

pub fn models(reranker: Arc<dyn PairScorer>, generator: Arc<dyn TextGenerator>) -> ModelSet {
    ModelSet { expander: Arc::new(ScriptedQueries::default()), reranker, generator }
}
