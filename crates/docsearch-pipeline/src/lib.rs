//! The query-time pipeline (retrieve, rerank, summarize) and the offline
//! expansion and indexing path that feeds it.

pub mod expander;
pub mod indexer;
pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod summarizer;

pub use expander::DocumentExpander;
pub use indexer::{IndexBuilder, IndexReport};
pub use pipeline::{EnhancedSearchResponse, GenerateRequest, Hits, SearchPipeline};
pub use reranker::Reranker;
pub use retriever::Retriever;
pub use summarizer::Summarizer;
