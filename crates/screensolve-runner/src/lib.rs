pub mod capture;
pub mod code_executor;
pub mod ocr;
pub mod pipeline;
pub mod solution;

#[cfg(all(test, target_os = "linux"))]
mod process_check;

pub use capture::CommandCapture;
pub use code_executor::{outputs_match, run_on_examples, CodeExecutor};
pub use ocr::TesseractOcr;
pub use pipeline::{whole_text_example, SolveEvent, SolvePipeline};
pub use solution::{load_examples, write_solution};
