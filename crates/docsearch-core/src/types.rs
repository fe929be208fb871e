//! Domain types shared by the index store, the model runtimes and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type DocId = String;
pub type TagSet = BTreeSet<String>;

/// Number of body characters kept in a client-visible excerpt.
pub const EXCERPT_CHARS: usize = 300;

/// A source document as authored in the corpus.
///
/// - `doc_id`: stable unique key within an index
/// - `body`: the main text (called "plot" or "text" depending on corpus)
/// - `tags`: optional unordered labels, matched exactly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: TagSet,
}

/// A document ready to be written: the authored fields plus the derived
/// expansion text. `expanded_text` is only ever produced by the expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub document: Document,
    pub expanded_text: Option<String>,
}

impl IndexedDocument {
    pub fn unexpanded(document: Document) -> Self {
        Self { document, expanded_text: None }
    }
}

/// Free-text fields of the index schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Title,
    Body,
    ExpandedText,
}

impl SearchField {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Body => "body",
            SearchField::ExpandedText => "expanded_text",
        }
    }
}

/// How the terms of a query combine inside one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperator {
    /// At least one term must appear.
    Any,
    /// Every term must appear.
    All,
}

/// One weighted, field-scoped lexical match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldClause {
    pub field: SearchField,
    pub boost: f32,
    pub operator: MatchOperator,
}

/// Structured query handed to the index store: an OR over `clauses`,
/// hard-filtered on `tags_filter` (any tag matches) when non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub text: String,
    pub clauses: Vec<FieldClause>,
    pub tags_filter: TagSet,
    pub size: usize,
}

/// A hit as returned by the store, in the store's relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub doc_id: DocId,
    pub score: f32,
    pub title: String,
    pub body: String,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreResponse {
    pub total_hits: usize,
    pub max_score: Option<f32>,
    pub hits: Vec<StoreHit>,
}

/// Result of one bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub indexed: usize,
    pub failed: Vec<(DocId, String)>,
}

/// A retrieved document as it travels through the pipeline.
///
/// Carries the full body so reranking and summarization never work from
/// the display excerpt; `score` is normalized to `[0, 1]` against the top
/// hit of the candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub doc_id: DocId,
    pub score: f32,
    pub title: String,
    pub body: String,
    pub tags: TagSet,
}

impl Candidate {
    pub fn to_result(&self, excerpt_chars: usize) -> SearchResult {
        SearchResult {
            doc_id: self.doc_id.clone(),
            score: self.score,
            title: self.title.clone(),
            body_excerpt: truncate_chars(&self.body, excerpt_chars).to_string(),
            tags: self.tags.clone(),
        }
    }
}

/// A candidate after cross-encoder scoring. `rerank_score` is the raw
/// model output and lives on a different scale from `Candidate::score`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub rerank_score: f32,
}

impl RankedCandidate {
    pub fn to_result(&self, excerpt_chars: usize) -> RankedSearchResult {
        RankedSearchResult { result: self.candidate.to_result(excerpt_chars), rerank_score: self.rerank_score }
    }
}

/// Client-visible search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f32,
    pub title: String,
    pub body_excerpt: String,
    pub tags: TagSet,
}

/// Client-visible result of a reranked search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSearchResult {
    #[serde(flatten)]
    pub result: SearchResult,
    pub rerank_score: f32,
}

/// A search request as accepted at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub top_k: usize,
    #[serde(default)]
    pub tags_filter: TagSet,
    pub apply_rerank: bool,
    pub final_top_k: usize,
    pub apply_summary: bool,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: 50,
            tags_filter: TagSet::new(),
            apply_rerank: true,
            final_top_k: 30,
            apply_summary: true,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self { self.top_k = top_k; self }
    pub fn with_final_top_k(mut self, final_top_k: usize) -> Self { self.final_top_k = final_top_k; self }
    pub fn with_rerank(mut self, apply: bool) -> Self { self.apply_rerank = apply; self }
    pub fn with_summary(mut self, apply: bool) -> Self { self.apply_summary = apply; self }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_filter = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_blank(&self) -> bool { self.text.trim().is_empty() }

    /// Returns a copy with `top_k` clamped to `[1, max_top_k]` and
    /// `final_top_k` clamped to `[1, top_k]`.
    pub fn clamped(&self, max_top_k: usize) -> Self {
        let top_k = clamp_top_k(self.top_k, max_top_k);
        Self { top_k, final_top_k: clamp_top_k(self.final_top_k, top_k), ..self.clone() }
    }
}

pub fn clamp_top_k(top_k: usize, max: usize) -> usize { top_k.clamp(1, max.max(1)) }

/// Prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
