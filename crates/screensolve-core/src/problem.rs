use serde::{Deserialize, Serialize};

/// One input/output pair lifted from the problem text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

impl Example {
    pub fn new(input: impl AsRef<str>, output: impl AsRef<str>) -> Self {
        Self {
            input: input.as_ref().trim().to_string(),
            output: output.as_ref().trim().to_string(),
        }
    }
}

/// Structured view of a coding problem recovered from OCR text.
///
/// Every field may be empty: a record with no examples is a valid parse
/// result, not a failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub title: String,
    pub description: String,
    pub examples: Vec<Example>,
}

impl ProblemRecord {
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.examples.is_empty()
    }
}
