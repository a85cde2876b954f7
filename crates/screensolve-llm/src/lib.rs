mod ollama;
mod openai;
mod prompt;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;
pub use prompt::{build_user_prompt, strip_code_fences, SYSTEM_PROMPT};

use screensolve_core::{LlmConfig, LlmProvider, SolutionGenerator};

pub fn build_generator(config: &LlmConfig) -> Box<dyn SolutionGenerator> {
    match config.provider {
        LlmProvider::OpenAi => Box::new(OpenAiGenerator::new(config)),
        LlmProvider::Ollama => Box::new(OllamaGenerator::new(config)),
    }
}
