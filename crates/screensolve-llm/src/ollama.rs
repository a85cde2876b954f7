use async_trait::async_trait;
use screensolve_core::{Language, LlmConfig, Result, SolutionGenerator, SolverError};
use serde::{Deserialize, Serialize};

use crate::prompt::{build_user_prompt, strip_code_fences, SYSTEM_PROMPT};

#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    host: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: reqwest::Client::new(),
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SolverError::Llm(format!(
                "Failed to list models: {}",
                resp.status()
            )));
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn build_request(&self, user_input: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_input.to_string(),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        }
    }

    async fn chat(&self, user_input: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let request = self.build_request(user_input);

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SolverError::Llm(format!("Chat failed: {} - {}", status, body)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;

        let chat_resp: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            SolverError::Llm(format!(
                "Failed to parse response: {} - Body: {}",
                e,
                body.chars().take(500).collect::<String>()
            ))
        })?;

        Ok(chat_resp.message.content)
    }
}

#[async_trait]
impl SolutionGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_solution(&self, problem_text: &str, language: Language) -> Result<String> {
        tracing::info!("Requesting solution from {} at {}", self.model, self.host);
        let content = self.chat(&build_user_prompt(problem_text, language)).await?;
        strip_code_fences(&content)
    }
}
