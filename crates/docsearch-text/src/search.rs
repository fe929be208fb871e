use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, ConstScoreQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{TantivyDocument, Term};

use docsearch_core::traits::IndexStore;
use docsearch_core::types::{MatchOperator, SearchField, StoreHit, StoreQuery, StoreResponse};

use crate::index::{OpenIndex, TantivyStore};

/// Run `text` through the field analyzer, keeping first-occurrence order.
fn analyze(open: &OpenIndex, text: &str) -> anyhow::Result<Vec<String>> {
	let mut analyzer = open.index.tokenizer_for_field(open.fields.text(SearchField::Title))?;
	let mut stream = analyzer.token_stream(text);
	let mut terms: Vec<String> = Vec::new();
	while stream.advance() {
		let t = &stream.token().text;
		if !terms.contains(t) { terms.push(t.clone()); }
	}
	Ok(terms)
}

fn build_query(open: &OpenIndex, query: &StoreQuery, terms: &[String]) -> Box<dyn Query> {
	let mut should: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(query.clauses.len());
	for clause in &query.clauses {
		let field = open.fields.text(clause.field);
		let occur = match clause.operator {
			MatchOperator::Any => Occur::Should,
			MatchOperator::All => Occur::Must,
		};
		let term_queries: Vec<(Occur, Box<dyn Query>)> = terms
			.iter()
			.map(|t| (occur, Box::new(TermQuery::new(Term::from_field_text(field, t), IndexRecordOption::WithFreqs)) as Box<dyn Query>))
			.collect();
		let field_query: Box<dyn Query> = Box::new(BooleanQuery::new(term_queries));
		should.push((Occur::Should, Box::new(BoostQuery::new(field_query, clause.boost))));
	}
	let matched: Box<dyn Query> = Box::new(BooleanQuery::new(should));
	if query.tags_filter.is_empty() {
		return matched;
	}
	let tag_terms: Vec<(Occur, Box<dyn Query>)> = query
		.tags_filter
		.iter()
		.map(|tag| (Occur::Should, Box::new(TermQuery::new(Term::from_field_text(open.fields.tags, tag), IndexRecordOption::Basic)) as Box<dyn Query>))
		.collect();
	// filter only: contributes nothing to the score
	let filter: Box<dyn Query> = Box::new(ConstScoreQuery::new(Box::new(BooleanQuery::new(tag_terms)), 0.0));
	Box::new(BooleanQuery::new(vec![(Occur::Must, matched), (Occur::Must, filter)]))
}

fn to_hit(open: &OpenIndex, score: f32, doc: &TantivyDocument) -> StoreHit {
	let f = &open.fields;
	let text = |field: Field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
	StoreHit {
		doc_id: text(f.doc_id),
		score,
		title: text(f.title),
		body: text(f.body),
		tags: doc.get_all(f.tags).filter_map(|v| v.as_str().map(str::to_string)).collect(),
	}
}

impl IndexStore for TantivyStore {
	fn query(&self, query: &StoreQuery) -> anyhow::Result<StoreResponse> {
		let open = self.opened()?;
		let terms = analyze(open, &query.text)?;
		if terms.is_empty() || query.clauses.is_empty() {
			return Ok(StoreResponse::default());
		}
		let q = build_query(open, query, &terms);
		let searcher = open.reader.searcher();
		let (top_docs, total_hits) = searcher.search(&*q, &(TopDocs::with_limit(query.size.max(1)), Count))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			hits.push(to_hit(open, score, &doc));
		}
		let max_score = hits.first().map(|h| h.score);
		tracing::debug!(terms = terms.len(), total_hits, returned = hits.len(), "store query");
		Ok(StoreResponse { total_hits, max_score, hits })
	}
}
