use std::sync::Arc;

use docsearch_core::config::SummaryConfig;
use docsearch_core::traits::{GenerationLength, GenerationParams, TextGenerator};
use docsearch_core::types::Candidate;
use docsearch_core::{Error, Result, Stage};

pub const NO_RESULTS_MESSAGE: &str = "No search results found for this query.";
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

const TERMINALS: [char; 3] = ['.', '!', '?'];

/// What the summary prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptFields<'a> {
    pub query: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

pub fn build_prompt(fields: PromptFields<'_>) -> String {
    let PromptFields { query, title, body } = fields;
    format!(
        "Task: Using the document below, write a brief summary of its key points that shows how it answers the search \"{query}\".\n\
         \n\
         Document:\n\
         Title: {title}\n\
         Text: {body}\n\
         \n\
         Rules:\n\
         1. Use details from the document text.\n\
         2. Two or three sentences at most.\n\
         3. Make the relevance to \"{query}\" clear.\n\
         4. Be direct.\n\
         5. Do not mention the search itself.\n\
         6. No commentary about the document or this task.\n\
         7. Do not repeat these rules.\n\
         8. Only state what the document says.\n\
         \n\
         Summary:"
    )
}

/// Drop a trailing unfinished sentence. Text without any terminal
/// punctuation is returned as is.
pub fn repair_sentence(text: &str) -> String {
    if text.is_empty() || text.ends_with(TERMINALS) {
        return text.to_string();
    }
    match text.rfind(TERMINALS) {
        Some(idx) => text[..=idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Remove the echoed prompt when the output starts with it, then trim.
pub fn strip_prompt_echo(output: &str, prompt: &str) -> String {
    output.strip_prefix(prompt).unwrap_or(output).trim().to_string()
}

/// Query-conditioned explanation of the top result.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, cfg: &SummaryConfig, seed: u64) -> Self {
        let params = GenerationParams { length: GenerationLength::MaxNewTokens(cfg.max_new_tokens), temperature: cfg.temperature, seed };
        Self { generator, params }
    }

    /// Summary of `results[0]`; the no-results message, without a model
    /// call, when `results` is empty.
    pub fn enhance(&self, query: &str, results: &[Candidate]) -> Result<String> {
        let Some(top) = results.first() else { return Ok(NO_RESULTS_MESSAGE.to_string()) };
        let prompt = build_prompt(PromptFields { query, title: &top.title, body: &top.body });
        let output = self.generator.generate(&prompt, &self.params).map_err(|e| Error::model(Stage::Summary, e))?;
        let summary = repair_sentence(&strip_prompt_echo(&output, &prompt));
        tracing::debug!(doc_id = %top.doc_id, chars = summary.chars().count(), "summarized");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_cuts_back_to_last_terminal() {
        assert_eq!(repair_sentence("One. Two! Three and"), "One. Two!");
        assert_eq!(repair_sentence("Is it? yes"), "Is it?");
        assert_eq!(repair_sentence("Complete."), "Complete.");
    }

    #[test]
    fn repair_leaves_unpunctuated_text_alone() {
        assert_eq!(repair_sentence("no punctuation here"), "no punctuation here");
        assert_eq!(repair_sentence(""), "");
    }

    #[test]
    fn repair_is_idempotent() {
        for s in ["A. B", "A. B.", "x", "Wait! what", "a?b  "] {
            let once = repair_sentence(s);
            assert_eq!(repair_sentence(&once), once);
        }
    }

    #[test]
    fn prompt_embeds_query_and_document() {
        let p = build_prompt(PromptFields { query: "space horror", title: "Alien", body: "A crew fights a creature." });
        assert!(p.contains("\"space horror\""));
        assert!(p.contains("Title: Alien\n"));
        assert!(p.contains("Text: A crew fights a creature.\n"));
        assert!(p.ends_with("Summary:"));
    }

    #[test]
    fn echo_is_stripped_only_as_prefix() {
        assert_eq!(strip_prompt_echo("Q: hi\n  answer ", "Q: hi"), "answer");
        assert_eq!(strip_prompt_echo("something else", "Q: hi"), "something else");
    }
}
