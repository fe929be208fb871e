use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::Tokenizer;

use docsearch_core::traits::{QueryGenParams, QueryGenerator};

use crate::sampling::{ban_repeated_ngrams, logits_processor};
use crate::tokenize::encode_truncated;
use crate::weights::{load_config, load_tokenizer, load_var_builder};

/// Task prefix the doc2query checkpoints were fine-tuned with.
pub const TASK_PREFIX: &str = "generate query: ";

pub fn model_input(text: &str) -> String {
    format!("{TASK_PREFIX}{text}")
}

/// doc2query T5: given a passage, sample questions it answers.
pub struct Doc2QueryModel {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: T5Config,
    device: Device,
}

impl Doc2QueryModel {
    pub fn load(model_dir: &Path, device: Device) -> Result<Self> {
        tracing::info!(dir = %model_dir.display(), "loading doc2query model");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: T5Config = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, DType::F32, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        Ok(Self { model: Mutex::new(model), tokenizer, config, device })
    }

    fn sample_sequence(&self, model: &mut T5ForConditionalGeneration, encoder_output: &Tensor, params: &QueryGenParams, seed: u64) -> Result<Vec<u32>> {
        let start = self.config.decoder_start_token_id.unwrap_or(self.config.pad_token_id) as u32;
        let eos = self.config.eos_token_id as u32;
        let mut processor = logits_processor(seed, params.temperature, Some(params.top_k));
        let mut tokens = vec![start];
        model.clear_kv_cache();
        for step in 0..params.max_output_tokens {
            let input = if step == 0 || !self.config.use_cache {
                Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                Tensor::new(&tokens[tokens.len() - 1..], &self.device)?.unsqueeze(0)?
            };
            let logits = model.decode(&input, encoder_output)?.squeeze(0)?.to_dtype(DType::F32)?;
            let logits = ban_repeated_ngrams(&logits, &tokens[1..], params.no_repeat_ngram_size)?;
            let next = processor.sample(&logits)?;
            if next == eos { break; }
            tokens.push(next);
        }
        Ok(tokens.split_off(1))
    }
}

impl QueryGenerator for Doc2QueryModel {
    fn generate_queries(&self, text: &str, params: &QueryGenParams) -> Result<Vec<String>> {
        let ids = encode_truncated(&self.tokenizer, &model_input(text), params.max_input_tokens)?;
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let mut model = self.model.lock().map_err(|_| anyhow!("doc2query model lock poisoned"))?;
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;
        let mut queries = Vec::with_capacity(params.num_sequences);
        for i in 0..params.num_sequences {
            let tokens = self.sample_sequence(&mut model, &encoder_output, params, params.seed.wrapping_add(i as u64))?;
            let query = self.tokenizer.decode(&tokens, true).map_err(|e| anyhow!("Detokenization failed: {}", e))?;
            queries.push(query.trim().to_string());
        }
        tracing::trace!(n = queries.len(), input_tokens = ids.len(), "doc2query sampled");
        Ok(queries)
    }
}
