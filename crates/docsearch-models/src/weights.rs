use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use serde::de::DeserializeOwned;
use tokenizers::Tokenizer;

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    Tokenizer::from_file(&path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

pub fn load_config<T: DeserializeOwned>(model_dir: &Path) -> Result<T> {
    let path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Every `*.safetensors` shard in the directory, or `pytorch_model.bin` when there are none.
pub fn load_var_builder(model_dir: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let mut shards: Vec<_> = std::fs::read_dir(model_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "safetensors"))
        .collect();
    shards.sort();
    let mut tensors: HashMap<String, Tensor> = HashMap::new();
    if shards.is_empty() {
        let bin = model_dir.join("pytorch_model.bin");
        if !bin.is_file() { bail!("no model.safetensors or pytorch_model.bin in {}", model_dir.display()); }
        tracing::debug!(path = %bin.display(), "loading pickle weights");
        tensors.extend(candle_core::pickle::read_all(&bin)?);
    } else {
        for shard in &shards {
            tracing::debug!(path = %shard.display(), "loading safetensors shard");
            tensors.extend(candle_core::safetensors::load(shard, device)?);
        }
    }
    Ok(VarBuilder::from_tensors(tensors, dtype, device))
}
