//! Deterministic stand-ins used when model weights are not available.

use anyhow::Result;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docsearch_core::traits::{GenerationParams, PairScorer, QueryGenParams, QueryGenerator, TextGenerator};

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_lowercase)
        .collect()
}

fn hash_with_seed(seed: u64, value: impl Hash) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Builds "what is ..." queries from hashed picks of the passage's content words.
#[derive(Debug, Default, Clone)]
pub struct FakeQueryGenerator;

impl QueryGenerator for FakeQueryGenerator {
    fn generate_queries(&self, text: &str, params: &QueryGenParams) -> Result<Vec<String>> {
        let vocab = words(text);
        if vocab.is_empty() { return Ok(Vec::new()); }
        Ok((0..params.num_sequences)
            .map(|i| {
                let a = hash_with_seed(params.seed, (text, i)) as usize % vocab.len();
                let b = (a + 1) % vocab.len();
                if a == b { format!("what is {}", vocab[a]) } else { format!("what is {} {}", vocab[a], vocab[b]) }
            })
            .collect())
    }
}

/// Lexical overlap scaled to a logit-like range; no tie-breaking jitter.
#[derive(Debug, Default, Clone)]
pub struct FakePairScorer;

impl PairScorer for FakePairScorer {
    fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let terms: BTreeSet<String> = words(query).into_iter().collect();
        Ok(documents
            .iter()
            .map(|doc| {
                if terms.is_empty() { return -5.0; }
                let doc_terms: BTreeSet<String> = words(doc).into_iter().collect();
                let overlap = terms.intersection(&doc_terms).count() as f32;
                overlap / terms.len() as f32 * 10.0 - 5.0
            })
            .collect())
    }
}

/// Echoes the prompt, then writes a couple of sentences about the first
/// `Title:` line it finds and stops mid-sentence, the way a length-capped
/// model does.
#[derive(Debug, Default, Clone)]
pub struct FakeTextGenerator;

impl TextGenerator for FakeTextGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let title = prompt.lines().find_map(|l| l.trim().strip_prefix("Title:")).map(str::trim).filter(|t| !t.is_empty());
        let continuation = match title {
            Some(title) => format!("{title} is the closest match. It fits what you described and is worth a look because"),
            None => "Here is a short continuation of the text. It keeps going until the budget runs".to_string(),
        };
        let prompt_words = prompt.split_whitespace().count();
        let budget = params.length.new_token_budget(prompt_words);
        let generated: Vec<&str> = continuation.split_whitespace().take(budget).collect();
        if generated.is_empty() { return Ok(prompt.to_string()); }
        Ok(format!("{prompt} {}", generated.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_core::traits::GenerationLength;

    #[test]
    fn fake_queries_are_deterministic() {
        let g = FakeQueryGenerator;
        let p = QueryGenParams { num_sequences: 3, ..Default::default() };
        let a = g.generate_queries("Penguins dance across the frozen ice", &p).unwrap();
        let b = g.generate_queries("Penguins dance across the frozen ice", &p).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(g.generate_queries("", &p).unwrap().is_empty());
    }

    #[test]
    fn fake_scores_follow_overlap() {
        let s = FakePairScorer;
        let docs = vec!["penguins dance".to_string(), "alien ship".to_string()];
        let scores = s.score_pairs("dancing penguins", &docs).unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn fake_generation_echoes_prompt() {
        let g = FakeTextGenerator;
        let params = GenerationParams { length: GenerationLength::MaxNewTokens(50), temperature: 0.2, seed: 1 };
        let out = g.generate("Results:\nTitle: Alien\n", &params).unwrap();
        assert!(out.starts_with("Results:\nTitle: Alien\n"));
        assert!(out.contains("Alien is the closest match."));
        assert!(!out.trim_end().ends_with('.'));
    }
}
