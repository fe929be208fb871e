use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, IndexOp};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;

use docsearch_core::traits::PairScorer;

use crate::tokenize::PairBatch;
use crate::weights::{load_config, load_tokenizer, load_var_builder};

#[derive(Deserialize)]
struct HeadConfig { hidden_size: usize }

/// BERT sequence-classification cross-encoder (one relevance logit per pair).
pub struct CrossEncoderModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    pad_id: u32,
    max_tokens: usize,
    batch_size: usize,
    gate: Mutex<()>,
}

impl CrossEncoderModel {
    pub fn load(model_dir: &Path, device: Device, max_tokens: usize, batch_size: usize) -> Result<Self> {
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: BertConfig = load_config(model_dir)?;
        let head: HeadConfig = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, DType::F32, &device)?;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = linear(head.hidden_size, head.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(head.hidden_size, 1, vb.pp("classifier"))?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        Ok(Self { bert, pooler, classifier, tokenizer, device, pad_id, max_tokens, batch_size: batch_size.max(1), gate: Mutex::new(()) })
    }

    fn score_batch(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let batch = PairBatch::encode(&self.tokenizer, query, documents, self.max_tokens, self.pad_id)?;
        let (ids, type_ids, mask) = batch.to_tensors(&self.device)?;
        let hidden = self.bert.forward(&ids, &type_ids, Some(&mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.squeeze(1)?.to_dtype(DType::F32)?;
        Ok(logits.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }
}

impl PairScorer for CrossEncoderModel {
    fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let _guard = self.gate.lock().map_err(|_| anyhow!("cross-encoder lock poisoned"))?;
        let mut scores = Vec::with_capacity(documents.len());
        for chunk in documents.chunks(self.batch_size) {
            scores.extend(self.score_batch(query, chunk)?);
        }
        Ok(scores)
    }
}
