use once_cell::sync::Lazy;
use regex::Regex;
use screensolve_core::{Example, ProblemRecord};

use crate::normalize::normalize;
use crate::strategy::{default_strategies, ExtractionStrategy};

/// Where the prose ends and the examples begin.
static EXAMPLE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Example\s*1|Examples?:|Input\s*:").expect("example boundary pattern")
});

/// Sentence-like span: capital letter, 10-120 chars, terminator.
static TITLE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z].{10,120}?[.!?]").expect("title pattern"));

const TITLE_FALLBACK_CHARS: usize = 120;

static DEFAULT_PARSER: Lazy<ProblemParser> = Lazy::new(ProblemParser::new);

pub struct ProblemParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ProblemParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemParser {
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }

    /// Appends a strategy that runs after the existing ones.
    pub fn with_strategy(mut self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn parse(&self, raw_text: &str) -> ProblemRecord {
        let text = normalize(raw_text);

        let split = EXAMPLE_BOUNDARY
            .find(&text)
            .map(|m| m.start())
            .unwrap_or(text.len());
        let preamble = &text[..split];

        let record = ProblemRecord {
            title: extract_title(preamble),
            description: preamble.trim().to_string(),
            examples: self.extract_examples(&text),
        };

        tracing::debug!(
            "Parsed problem '{}' with {} example(s)",
            record.title,
            record.examples.len()
        );
        record
    }

    fn extract_examples(&self, text: &str) -> Vec<Example> {
        for strategy in &self.strategies {
            let examples = strategy.extract(text);
            if !examples.is_empty() {
                tracing::debug!("{} extracted {} example(s)", strategy.name(), examples.len());
                return examples;
            }
        }
        Vec::new()
    }
}

fn extract_title(preamble: &str) -> String {
    match TITLE_SPAN.find(preamble) {
        Some(m) => m.as_str().trim().to_string(),
        None => preamble
            .chars()
            .take(TITLE_FALLBACK_CHARS)
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

/// Parses raw OCR text with the default strategy chain.
pub fn parse_problem(raw_text: &str) -> ProblemRecord {
    DEFAULT_PARSER.parse(raw_text)
}
