//! Turns noisy OCR text from a coding-judge screenshot into a [`ProblemRecord`].
//!
//! Parsing is heuristic and total: malformed or empty input produces empty
//! fields, never an error.
//!
//! [`ProblemRecord`]: screensolve_core::ProblemRecord

pub mod normalize;
pub mod parser;
pub mod strategy;

pub use normalize::normalize;
pub use parser::{parse_problem, ProblemParser};
pub use strategy::{default_strategies, ExampleBlocks, ExtractionStrategy, LooseInputOutput};
