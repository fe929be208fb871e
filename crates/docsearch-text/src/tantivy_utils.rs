use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use docsearch_core::types::SearchField;

pub const ANALYZER: &str = "text_with_stopwords";

pub const DOC_ID: &str = "doc_id";
pub const TAGS: &str = "tags";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(DOC_ID, STRING | STORED);
	let indexing = TextFieldIndexing::default().set_tokenizer(ANALYZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let stored_text = TextOptions::default().set_indexing_options(indexing.clone()).set_stored();
	schema_builder.add_text_field(SearchField::Title.as_str(), stored_text.clone());
	schema_builder.add_text_field(SearchField::Body.as_str(), stored_text);
	// expansion is only a recall aid, never shown back
	schema_builder.add_text_field(SearchField::ExpandedText.as_str(), TextOptions::default().set_indexing_options(indexing));
	schema_builder.add_text_field(TAGS, STRING | STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","but","by","for","if","in","into","is","it","no","not","of","on","or","such","that","the","their","then","there","these","they","this","to","was","will","with",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(ANALYZER, tokenizer);
}

/// Resolved handles for every schema field.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
	pub doc_id: Field,
	pub title: Field,
	pub body: Field,
	pub expanded_text: Field,
	pub tags: Field,
}

impl SchemaFields {
	pub fn resolve(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			doc_id: schema.get_field(DOC_ID)?,
			title: schema.get_field(SearchField::Title.as_str())?,
			body: schema.get_field(SearchField::Body.as_str())?,
			expanded_text: schema.get_field(SearchField::ExpandedText.as_str())?,
			tags: schema.get_field(TAGS)?,
		})
	}

	pub fn text(&self, field: SearchField) -> Field {
		match field {
			SearchField::Title => self.title,
			SearchField::Body => self.body,
			SearchField::ExpandedText => self.expanded_text,
		}
	}
}
