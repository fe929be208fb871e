use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Keep at most `max_len` tokens, preserving the final (special) token.
pub fn truncate_keep_last(tokens: &[u32], max_len: usize) -> Vec<u32> {
    if tokens.len() <= max_len {
        return tokens.to_vec();
    }
    if max_len == 0 {
        return Vec::new();
    }
    let mut out = tokens[..max_len - 1].to_vec();
    out.push(tokens[tokens.len() - 1]);
    out
}

pub fn encode_truncated(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<Vec<u32>> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    Ok(truncate_keep_last(enc.get_ids(), max_len))
}

/// Right-padded batch of (query, document) pair encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairBatch {
    pub ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub mask: Vec<u32>,
    pub rows: usize,
    pub seq_len: usize,
}

impl PairBatch {
    pub fn encode(tokenizer: &Tokenizer, query: &str, docs: &[String], max_len: usize, pad_id: u32) -> Result<Self> {
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let enc = tokenizer
                .encode((query, doc.as_str()), true)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
            rows.push((truncate_keep_last(enc.get_ids(), max_len), truncate_keep_last(enc.get_type_ids(), max_len)));
        }
        Ok(Self::from_rows(rows, pad_id))
    }

    /// Pad every row to the longest one.
    pub fn from_rows(rows: Vec<(Vec<u32>, Vec<u32>)>, pad_id: u32) -> Self {
        let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0);
        let n = rows.len();
        let mut batch = Self {
            ids: Vec::with_capacity(n * seq_len),
            type_ids: Vec::with_capacity(n * seq_len),
            mask: Vec::with_capacity(n * seq_len),
            rows: n,
            seq_len,
        };
        for (ids, types) in rows {
            let pad = seq_len - ids.len();
            batch.mask.extend(std::iter::repeat(1).take(ids.len()).chain(std::iter::repeat(0).take(pad)));
            batch.ids.extend(ids.iter().copied().chain(std::iter::repeat(pad_id).take(pad)));
            batch.type_ids.extend(types.iter().copied().chain(std::iter::repeat(0)).take(seq_len));
        }
        batch
    }

    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        let shape = (self.rows, self.seq_len);
        let ids = Tensor::from_vec(self.ids.clone(), shape, device)?;
        let type_ids = Tensor::from_vec(self.type_ids.clone(), shape, device)?;
        let mask = Tensor::from_vec(self.mask.clone(), shape, device)?;
        Ok((ids, type_ids, mask))
    }
}
