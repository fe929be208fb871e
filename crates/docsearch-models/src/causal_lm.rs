use anyhow::{anyhow, bail, Result};
use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::qwen2::{Config as Qwen2Config, ModelForCausalLM};
use tokenizers::Tokenizer;

use docsearch_core::traits::{GenerationParams, TextGenerator};

use crate::sampling::logits_processor;
use crate::weights::{load_config, load_tokenizer, load_var_builder};

const EOS_CANDIDATES: [&str; 3] = ["<|im_end|>", "<|endoftext|>", "</s>"];

/// Instruction-tuned decoder used for summaries and free-form generation.
pub struct CausalLmGenerator {
    model: Mutex<ModelForCausalLM>,
    tokenizer: Tokenizer,
    device: Device,
    eos_tokens: Vec<u32>,
}

impl CausalLmGenerator {
    pub fn load(model_dir: &Path, device: Device) -> Result<Self> {
        tracing::info!(dir = %model_dir.display(), "loading causal LM");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: Qwen2Config = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, DType::F32, &device)?;
        let model = ModelForCausalLM::new(&config, vb)?;
        let eos_tokens: Vec<u32> = EOS_CANDIDATES.iter().filter_map(|t| tokenizer.token_to_id(t)).collect();
        if eos_tokens.is_empty() { tracing::warn!("no end-of-sequence token in vocabulary; generation runs to the length budget"); }
        Ok(Self { model: Mutex::new(model), tokenizer, device, eos_tokens })
    }
}

impl TextGenerator for CausalLmGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let enc = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut tokens = enc.get_ids().to_vec();
        if tokens.is_empty() { bail!("prompt produced no tokens"); }
        let prompt_len = tokens.len();
        let budget = params.length.new_token_budget(prompt_len);
        let mut processor = logits_processor(params.seed, params.temperature, None);

        let mut model = self.model.lock().map_err(|_| anyhow!("generator lock poisoned"))?;
        model.clear_kv_cache();
        for step in 0..budget {
            let context = if step == 0 { tokens.len() } else { 1 };
            let offset = tokens.len() - context;
            let input = Tensor::new(&tokens[offset..], &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, offset)?.squeeze(0)?.squeeze(0)?.to_dtype(DType::F32)?;
            let next = processor.sample(&logits)?;
            if self.eos_tokens.contains(&next) { break; }
            tokens.push(next);
        }
        model.clear_kv_cache();
        drop(model);

        tracing::debug!(prompt_tokens = prompt_len, new_tokens = tokens.len() - prompt_len, "generated");
        self.tokenizer.decode(&tokens, true).map_err(|e| anyhow!("Detokenization failed: {}", e))
    }
}
