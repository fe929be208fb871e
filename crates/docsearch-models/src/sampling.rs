use anyhow::Result;
use candle_core::Tensor;
use candle_transformers::generation::{LogitsProcessor, Sampling};

/// Greedy when `temperature <= 0`, otherwise top-k (or full-vocabulary) sampling.
pub fn logits_processor(seed: u64, temperature: f64, top_k: Option<usize>) -> LogitsProcessor {
    let sampling = if temperature <= 0.0 {
        Sampling::ArgMax
    } else {
        match top_k {
            Some(k) if k > 0 => Sampling::TopK { k, temperature },
            _ => Sampling::All { temperature },
        }
    };
    LogitsProcessor::from_sampling(seed, sampling)
}

/// Tokens that would complete an n-gram already present in `generated`.
pub fn banned_tokens(generated: &[u32], ngram: usize) -> Vec<u32> {
    if ngram == 0 || generated.len() + 1 < ngram {
        return Vec::new();
    }
    let prefix = &generated[generated.len() + 1 - ngram..];
    let mut banned: Vec<u32> = generated
        .windows(ngram)
        .filter(|w| &w[..ngram - 1] == prefix)
        .map(|w| w[ngram - 1])
        .collect();
    banned.sort_unstable();
    banned.dedup();
    banned
}

/// Push banned continuations to -inf on a 1-D logits tensor.
pub fn ban_repeated_ngrams(logits: &Tensor, generated: &[u32], ngram: usize) -> Result<Tensor> {
    let banned = banned_tokens(generated, ngram);
    if banned.is_empty() {
        return Ok(logits.clone());
    }
    let mut values = logits.to_vec1::<f32>()?;
    for token in banned {
        if let Some(v) = values.get_mut(token as usize) { *v = f32::NEG_INFINITY; }
    }
    Ok(Tensor::new(values.as_slice(), logits.device())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn bigram_ban_blocks_repeat_continuation() {
        // "a b c a" -> "a b" already seen, so "b" is banned next
        assert_eq!(banned_tokens(&[1, 2, 3, 1], 2), vec![2]);
        assert!(banned_tokens(&[1, 2, 3], 2).is_empty());
        assert!(banned_tokens(&[1], 3).is_empty());
        assert!(banned_tokens(&[1, 2, 1], 0).is_empty());
    }

    #[test]
    fn unigram_ban_blocks_everything_generated() {
        assert_eq!(banned_tokens(&[5, 3, 5], 1), vec![3, 5]);
    }

    #[test]
    fn banned_logits_become_negative_infinity() {
        let logits = Tensor::new(&[0.1f32, 0.2, 0.3, 0.4], &Device::Cpu).unwrap();
        let out = ban_repeated_ngrams(&logits, &[1, 2, 1], 2).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(out[2], f32::NEG_INFINITY);
        assert_eq!(out[0], 0.1);
    }

    #[test]
    fn zero_temperature_is_greedy() {
        let logits = Tensor::new(&[0.1f32, 2.0, 0.3], &Device::Cpu).unwrap();
        let mut lp = logits_processor(7, 0.0, Some(10));
        assert_eq!(lp.sample(&logits).unwrap(), 1);
    }
}
