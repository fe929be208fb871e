use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use docsearch_core::traits::IndexSink;
use docsearch_core::types::{DocId, Document, IndexedDocument};
use docsearch_core::{Error, Result};

use crate::expander::DocumentExpander;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocError {
    pub doc_id: DocId,
    pub error: String,
}

/// Totals for one `bulk_index` run. `indexed + failed == attempted`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub attempted: usize,
    pub indexed: usize,
    pub failed: usize,
    /// Documents indexed without expansion because generation failed.
    pub expansion_fallbacks: usize,
    /// Which documents fell back, and why. They still count as indexed.
    pub fallbacks: Vec<DocError>,
    pub errors: Vec<DocError>,
    #[serde(serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
}

fn as_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl IndexReport {
    /// The first `n` errors, one per line, then "... and N more".
    pub fn preview(&self, n: usize) -> String {
        let mut lines: Vec<String> = self.errors.iter().take(n).map(|e| format!("{}: {}", e.doc_id, e.error)).collect();
        if self.errors.len() > n {
            lines.push(format!("... and {} more", self.errors.len() - n));
        }
        lines.join("\n")
    }

    fn fail(&mut self, doc_id: &str, error: impl ToString) {
        self.failed += 1;
        self.errors.push(DocError { doc_id: doc_id.to_string(), error: error.to_string() });
    }
}

/// Offline loader: expands documents and writes them in batches.
pub struct IndexBuilder<S: IndexSink> {
    sink: S,
    expander: Option<DocumentExpander>,
    num_queries: usize,
    progress: bool,
}

impl<S: IndexSink> IndexBuilder<S> {
    /// Without an expander, documents are indexed with no `expanded_text`.
    pub fn new(sink: S, expander: Option<DocumentExpander>) -> Self {
        let num_queries = expander.as_ref().map_or(0, DocumentExpander::default_num_queries);
        Self { sink, expander, num_queries, progress: false }
    }

    pub fn with_num_queries(mut self, n: usize) -> Self { self.num_queries = n; self }
    pub fn with_progress(mut self, show: bool) -> Self { self.progress = show; self }

    pub fn sink(&self) -> &S { &self.sink }
    pub fn into_sink(self) -> S { self.sink }

    pub fn create_index(&mut self, force: bool) -> Result<()> {
        self.sink.create_index(force).map_err(|e| Error::IndexUnavailable(format!("{e:#}")))
    }

    fn prepare(&self, doc: &Document, report: &mut IndexReport) -> IndexedDocument {
        let Some(expander) = &self.expander else { return IndexedDocument::unexpanded(doc.clone()) };
        let expansion = expander.expand_detailed(&doc.title, &doc.body, self.num_queries);
        if let Some(e) = &expansion.error {
            tracing::warn!(doc_id = %doc.doc_id, error = %e, "indexing without expansion");
            report.expansion_fallbacks += 1;
            report.fallbacks.push(DocError { doc_id: doc.doc_id.clone(), error: e.to_string() });
        }
        let expanded_text = Some(expansion.text).filter(|t| !t.is_empty());
        IndexedDocument { document: doc.clone(), expanded_text }
    }

    /// Partition `docs` into batches of `batch_size`, one bulk write each.
    /// Failures are recorded in the report, never abort the run.
    pub fn bulk_index(&mut self, docs: &[Document], batch_size: usize) -> IndexReport {
        let started = Instant::now();
        let batch_size = batch_size.max(1);
        let mut report = IndexReport { attempted: docs.len(), ..Default::default() };
        let mut seen: HashSet<&str> = HashSet::with_capacity(docs.len());

        let pb = if self.progress { ProgressBar::new(docs.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut done = 0usize;
        for (batch_no, batch) in docs.chunks(batch_size).enumerate() {
            let mut prepared = Vec::with_capacity(batch.len());
            for doc in batch {
                let id = doc.doc_id.trim();
                if id.is_empty() {
                    report.fail(&doc.doc_id, "empty doc_id");
                } else if !seen.insert(id) {
                    report.fail(&doc.doc_id, "duplicate doc_id in this run");
                } else {
                    prepared.push(self.prepare(doc, &mut report));
                }
                done += 1;
                pb.set_position(done as u64);
            }
            if prepared.is_empty() {
                continue;
            }
            match self.sink.bulk_upsert(&prepared) {
                Ok(outcome) => {
                    report.indexed += outcome.indexed;
                    for (doc_id, error) in outcome.failed {
                        report.fail(&doc_id, error);
                    }
                }
                Err(e) => {
                    tracing::warn!(batch = batch_no, docs = prepared.len(), error = %e, "bulk write failed");
                    for doc in &prepared {
                        report.fail(&doc.document.doc_id, format!("bulk write failed: {e}"));
                    }
                }
            }
            let rate = done as f64 / started.elapsed().as_secs_f64().max(1e-9);
            let pct = (done as f64 * 1000.0 / docs.len().max(1) as f64).round() / 10.0;
            pb.set_message(format!("{rate:.0} docs/s"));
            tracing::info!(batch = batch_no, done, total = docs.len(), pct, docs_per_sec = rate.round(), "batch written");
        }

        report.elapsed = started.elapsed();
        pb.finish_with_message(format!("{} indexed, {} failed", report.indexed, report.failed));
        tracing::info!(
            attempted = report.attempted,
            indexed = report.indexed,
            failed = report.failed,
            expansion_fallbacks = report.expansion_fallbacks,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "bulk index finished"
        );
        report
    }
}
