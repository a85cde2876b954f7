use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use screensolve_core::{Language, LlmConfig, Result, SolutionGenerator, SolverError};
use tracing::debug;

use crate::prompt::{build_user_prompt, strip_code_fences, SYSTEM_PROMPT};

fn llm_err(e: impl ToString) -> SolverError {
    SolverError::Llm(e.to_string())
}

fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| SolverError::Llm("No response content".into()))
}

/// Chat-completions generator. The API key comes from `OPENAI_API_KEY`.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_request(&self, user_input: &str) -> Result<CreateChatCompletionRequest> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .temperature(self.temperature)
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(SYSTEM_PROMPT)
                        .build()
                        .map_err(llm_err)?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(user_input)
                        .build()
                        .map_err(llm_err)?,
                ),
            ]);

        if let Some(max_tokens) = self.max_tokens {
            args.max_completion_tokens(max_tokens);
        }

        args.build().map_err(llm_err)
    }
}

#[async_trait]
impl SolutionGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_solution(&self, problem_text: &str, language: Language) -> Result<String> {
        let request = self.build_request(&build_user_prompt(problem_text, language))?;
        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        let content = extract_content(response)?;

        debug!("OpenAI reply: {} chars", content.len());
        strip_code_fences(&content)
    }
}
