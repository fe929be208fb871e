use anyhow::anyhow;
use std::path::{Path, PathBuf};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use docsearch_core::error::Error;
use docsearch_core::traits::IndexSink;
use docsearch_core::types::{BulkOutcome, IndexedDocument};

use crate::tantivy_utils::{build_schema, register_tokenizer, SchemaFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub(crate) struct OpenIndex {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	pub(crate) fields: SchemaFields,
}

impl OpenIndex {
	fn new(index: Index) -> Result<Self, Error> {
		register_tokenizer(&index);
		let fields = SchemaFields::resolve(&index.schema()).map_err(|e| Error::IndexUnavailable(format!("schema mismatch: {e}")))?;
		let reader = index
			.reader_builder()
			.reload_policy(ReloadPolicy::OnCommitWithDelay)
			.try_into()
			.map_err(|e| Error::IndexUnavailable(e.to_string()))?;
		Ok(Self { index, reader, fields })
	}
}

/// Tantivy-backed index store living in one directory.
///
/// Reads go through a shared reader; writes open a fresh writer per bulk
/// call and reload the reader after commit.
pub struct TantivyStore {
	dir: PathBuf,
	pub(crate) state: Option<OpenIndex>,
}

impl TantivyStore {
	/// Open an existing index for serving. A missing or foreign index is fatal.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
		let dir = dir.into();
		if !Self::exists(&dir) {
			return Err(Error::IndexUnavailable(format!("no index at {}", dir.display())));
		}
		let index = Index::open_in_dir(&dir).map_err(|e| Error::IndexUnavailable(format!("{}: {e}", dir.display())))?;
		let state = OpenIndex::new(index)?;
		tracing::info!(dir = %dir.display(), docs = state.reader.searcher().num_docs(), "opened index");
		Ok(Self { dir, state: Some(state) })
	}

	/// A store bound to `dir` that is not opened yet; call `create_index` before writing.
	pub fn at(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into(), state: None } }

	pub fn exists(dir: &Path) -> bool { dir.join("meta.json").is_file() }

	pub fn dir(&self) -> &Path { &self.dir }

	pub fn num_docs(&self) -> u64 {
		self.state.as_ref().map_or(0, |s| s.reader.searcher().num_docs())
	}

	pub(crate) fn opened(&self) -> anyhow::Result<&OpenIndex> {
		self.state.as_ref().ok_or_else(|| anyhow!("index at {} is not open", self.dir.display()))
	}

	fn to_tantivy(fields: &SchemaFields, doc: &IndexedDocument) -> TantivyDocument {
		let d = &doc.document;
		let mut out = TantivyDocument::default();
		out.add_text(fields.doc_id, &d.doc_id);
		out.add_text(fields.title, &d.title);
		out.add_text(fields.body, &d.body);
		if let Some(expanded) = &doc.expanded_text {
			out.add_text(fields.expanded_text, expanded);
		}
		for tag in &d.tags {
			out.add_text(fields.tags, tag);
		}
		out
	}
}

impl IndexSink for TantivyStore {
	fn create_index(&mut self, force: bool) -> anyhow::Result<()> {
		if force && Self::exists(&self.dir) {
			tracing::info!(dir = %self.dir.display(), "deleting existing index");
			self.state = None;
			std::fs::remove_dir_all(&self.dir)?;
		}
		let index = if Self::exists(&self.dir) {
			Index::open_in_dir(&self.dir)?
		} else {
			std::fs::create_dir_all(&self.dir)?;
			let index = Index::create_in_dir(&self.dir, build_schema())?;
			tracing::info!(dir = %self.dir.display(), "created index");
			index
		};
		self.state = Some(OpenIndex::new(index)?);
		Ok(())
	}

	fn bulk_upsert(&mut self, docs: &[IndexedDocument]) -> anyhow::Result<BulkOutcome> {
		let open = self.opened()?;
		let mut writer: IndexWriter = open.index.writer(WRITER_HEAP_BYTES)?;
		let mut outcome = BulkOutcome::default();
		for doc in docs {
			let doc_id = &doc.document.doc_id;
			if doc_id.trim().is_empty() {
				outcome.failed.push((doc_id.clone(), "empty doc_id".to_string()));
				continue;
			}
			// replaces any earlier version, including one added earlier in this batch
			writer.delete_term(Term::from_field_text(open.fields.doc_id, doc_id));
			match writer.add_document(Self::to_tantivy(&open.fields, doc)) {
				Ok(_) => outcome.indexed += 1,
				Err(e) => outcome.failed.push((doc_id.clone(), e.to_string())),
			}
		}
		writer.commit()?;
		open.reader.reload()?;
		Ok(outcome)
	}
}
