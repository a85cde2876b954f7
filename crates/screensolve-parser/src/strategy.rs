use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use screensolve_core::Example;

static EXAMPLE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Example\s*\d+\s*:?").expect("example header pattern"));

static INPUT_OUTPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Input\s*:?\s*(.+?)\s*Output\s*:?\s*([^\n]+)").expect("input/output pattern")
});

static EXPLANATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Explanation").expect("explanation pattern"));

/// One way of pulling examples out of normalized problem text.
///
/// The parser runs strategies in order and keeps the first non-empty result,
/// so a new heuristic is added by appending a strategy.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> Vec<Example>;
}

fn example_from(caps: &Captures<'_>) -> Example {
    let output = &caps[2];
    let output = match EXPLANATION.find(output) {
        Some(m) => &output[..m.start()],
        None => output,
    };
    Example::new(&caps[1], output)
}

/// Scans each `Example N:` block for its first `Input … Output …` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleBlocks;

impl ExtractionStrategy for ExampleBlocks {
    fn name(&self) -> &'static str {
        "example_blocks"
    }

    fn extract(&self, text: &str) -> Vec<Example> {
        EXAMPLE_HEADER
            .split(text)
            .skip(1)
            .filter_map(|block| INPUT_OUTPUT.captures(block))
            .map(|caps| example_from(&caps))
            .collect()
    }
}

/// Every non-overlapping `Input … Output …` pair in the text, ignoring
/// example headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseInputOutput;

impl ExtractionStrategy for LooseInputOutput {
    fn name(&self) -> &'static str {
        "loose_input_output"
    }

    fn extract(&self, text: &str) -> Vec<Example> {
        INPUT_OUTPUT
            .captures_iter(text)
            .map(|caps| example_from(&caps))
            .collect()
    }
}

pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![Box::new(ExampleBlocks), Box::new(LooseInputOutput)]
}
