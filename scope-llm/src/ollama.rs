use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use scope_http::{HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for a local Ollama server using the non-streaming `/api/generate`
/// endpoint.
pub struct OllamaClient {
    client: HttpClient,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    model: Option<String>,
    eval_count: Option<u32>,
}

impl OllamaClient {
    pub fn new(endpoint: &str, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let base = format!("{}/", endpoint.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| LlmError::Network(format!("client init failed: {e}")))?
            .with_timeout(timeout);

        Ok(Self { client, model })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError> {
        let req = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            system: system_prompt.map(str::to_string),
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let opts = RequestOpts {
            retries: Some(0),
            ..Default::default()
        };

        let resp: GenerateResponse = self.client.post_json("api/generate", &req, opts).await?;

        if resp.response.trim().is_empty() {
            return Err(LlmError::Decode("model returned an empty response".into()));
        }

        Ok(LlmResponse {
            text: resp.response,
            model: resp.model,
            tokens_used: resp.eval_count,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
