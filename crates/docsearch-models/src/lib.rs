//! Local transformer runtimes behind the core model traits: a doc2query
//! generator, a cross-encoder, and a causal LM, plus deterministic fakes.

use std::path::Path;
use std::sync::Arc;

use docsearch_core::config::{ModelsConfig, RerankConfig};
use docsearch_core::traits::{PairScorer, QueryGenerator, TextGenerator};
use docsearch_core::{Error, Result, Stage};

pub mod causal_lm;
pub mod cross_encoder;
pub mod device;
pub mod doc2query;
pub mod fake;
pub mod sampling;
pub mod tokenize;
pub mod weights;

pub use causal_lm::CausalLmGenerator;
pub use cross_encoder::CrossEncoderModel;
pub use doc2query::Doc2QueryModel;
pub use fake::{FakePairScorer, FakeQueryGenerator, FakeTextGenerator};

/// The three models the pipeline needs, loaded once and shared.
#[derive(Clone)]
pub struct ModelSet {
    pub expander: Arc<dyn QueryGenerator>,
    pub reranker: Arc<dyn PairScorer>,
    pub generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("ModelSet") }
}

pub fn fake_models_requested(cfg: &ModelsConfig) -> bool {
    cfg.use_fake
        || std::env::var("APP_USE_FAKE_MODELS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

impl ModelSet {
    pub fn fake() -> Self {
        Self {
            expander: Arc::new(FakeQueryGenerator),
            reranker: Arc::new(FakePairScorer),
            generator: Arc::new(FakeTextGenerator),
        }
    }

    /// Load every model, failing on the first one that is missing or broken.
    pub fn load(cfg: &ModelsConfig, rerank: &RerankConfig) -> Result<Self> {
        if fake_models_requested(cfg) {
            tracing::info!("using fake models");
            return Ok(Self::fake());
        }
        Ok(Self {
            expander: Arc::new(Self::load_expander(cfg)?),
            reranker: Arc::new(Self::load_reranker(cfg, rerank)?),
            generator: Arc::new(Self::load_generator(cfg)?),
        })
    }

    /// Only the query generator; indexing needs nothing else.
    pub fn load_expander_only(cfg: &ModelsConfig) -> Result<Arc<dyn QueryGenerator>> {
        if fake_models_requested(cfg) { return Ok(Arc::new(FakeQueryGenerator)); }
        Ok(Arc::new(Self::load_expander(cfg)?))
    }

    fn load_expander(cfg: &ModelsConfig) -> Result<Doc2QueryModel> {
        let dir = model_dir(cfg, &cfg.expander)?;
        Doc2QueryModel::load(&dir, device::select_device()).map_err(|e| Error::model(Stage::Expansion, e))
    }

    fn load_reranker(cfg: &ModelsConfig, rerank: &RerankConfig) -> Result<CrossEncoderModel> {
        let dir = model_dir(cfg, &cfg.reranker)?;
        CrossEncoderModel::load(&dir, device::select_device(), rerank.max_tokens, rerank.batch_size).map_err(|e| Error::model(Stage::Rerank, e))
    }

    fn load_generator(cfg: &ModelsConfig) -> Result<CausalLmGenerator> {
        let dir = model_dir(cfg, &cfg.generator)?;
        CausalLmGenerator::load(&dir, device::select_device()).map_err(|e| Error::model(Stage::Generation, e))
    }
}

fn model_dir(cfg: &ModelsConfig, name: &str) -> Result<std::path::PathBuf> {
    let dir = cfg.model_path(name);
    if !Path::new(&dir).is_dir() {
        return Err(Error::NotFound(format!("model directory {}", dir.display())));
    }
    Ok(dir)
}
