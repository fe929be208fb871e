//! JSONL corpus loading.
//!
//! One JSON object per line with `doc_id` (or `id`), `title`, the body under
//! `body`, `plot` or `text`, and optional `tags` given either as an array or
//! as a comma-separated string. Malformed lines are reported and skipped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::types::{Document, TagSet};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "id")]
    doc_id: RawId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "plot", alias = "text")]
    body: Option<String>,
    #[serde(default)]
    tags: Option<RawTags>,
}

impl From<RawRecord> for Document {
    fn from(raw: RawRecord) -> Self {
        let doc_id = match raw.doc_id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        };
        let tags: TagSet = match raw.tags {
            Some(RawTags::List(list)) => list.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect(),
            Some(RawTags::Joined(s)) => s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect(),
            None => TagSet::new(),
        };
        Document { doc_id, title: raw.title.unwrap_or_default(), body: raw.body.unwrap_or_default(), tags }
    }
}

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub file: PathBuf,
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub files: Vec<PathBuf>,
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Default, Clone)]
pub struct CorpusLoader {
    limit: Option<usize>,
}

impl CorpusLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self { self.limit = limit; self }

    /// Load a single `.jsonl` file, or every `.jsonl` file below a directory.
    pub fn load(&self, path: &Path) -> Result<Corpus> {
        let files = if path.is_dir() { list_jsonl_files(path) } else { vec![path.to_path_buf()] };
        let mut corpus = Corpus::default();
        if files.is_empty() {
            tracing::warn!(path = %path.display(), "no .jsonl files found");
            return Ok(corpus);
        }
        for file in &files {
            if self.limit_reached(&corpus) { break; }
            self.load_file(file, &mut corpus)?;
            corpus.files.push(file.clone());
        }
        tracing::info!(
            files = corpus.files.len(),
            documents = corpus.documents.len(),
            skipped = corpus.skipped.len(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    fn limit_reached(&self, corpus: &Corpus) -> bool {
        self.limit.is_some_and(|limit| corpus.documents.len() >= limit)
    }

    fn load_file(&self, file: &Path, corpus: &mut Corpus) -> Result<()> {
        let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
        for (idx, line) in reader.lines().enumerate() {
            if self.limit_reached(corpus) { break; }
            let line = line.with_context(|| format!("reading {}", file.display()))?;
            if line.trim().is_empty() { continue; }
            match serde_json::from_str::<RawRecord>(&line) {
                Ok(raw) => corpus.documents.push(raw.into()),
                Err(e) => {
                    tracing::warn!(file = %file.display(), line = idx + 1, error = %e, "skipping malformed record");
                    corpus.skipped.push(SkippedLine { file: file.to_path_buf(), line: idx + 1, error: e.to_string() });
                }
            }
        }
        Ok(())
    }
}

fn list_jsonl_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("jsonl"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
