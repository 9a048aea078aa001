use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::StructuringError;

/// Generation temperature for every call: deterministic, minimally varying.
pub const GENERATION_TEMPERATURE: f32 = 0.0;

/// Google Generative Language API client (Gemini models).
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a new client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, StructuringError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(StructuringError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> StructuringError {
        if e.is_connect() {
            StructuringError::ApiConnection(self.base_url.clone())
        } else if e.is_timeout() {
            StructuringError::HttpClient(format!(
                "Request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            StructuringError::HttpClient(e.to_string())
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, StructuringError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Response body from `models/{model}:generateContent`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Response body from `GET /v1beta/models`
#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_completion(self) -> Result<String, StructuringError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(StructuringError::EmptyCompletion(reason));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(StructuringError::EmptyCompletion(
                candidate
                    .finish_reason
                    .unwrap_or_else(|| "empty text".to_string()),
            ));
        }

        Ok(text)
    }
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: GENERATION_TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: GenerateContentResponse = Self::check_status(response)?
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        parsed.into_completion()
    }

    fn list_models(&self) -> Result<Vec<String>, StructuringError> {
        let url = format!("{}/v1beta/models?pageSize=1000", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: ModelsResponse = Self::check_status(response)?
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

/// Mock LLM client for testing: returns a configurable response.
pub struct MockLlmClient {
    response: String,
    available_models: Vec<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            available_models: vec![crate::config::DEFAULT_MODEL.to_string()],
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, StructuringError> {
        Ok(self.response.clone())
    }

    fn list_models(&self) -> Result<Vec<String>, StructuringError> {
        Ok(self.available_models.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use super::*;

    #[derive(Clone, Default)]
    struct StubState {
        last_body: Arc<Mutex<Option<serde_json::Value>>>,
        reply: Arc<Mutex<serde_json::Value>>,
    }

    async fn stub_generate(
        State(state): State<StubState>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return Err((StatusCode::FORBIDDEN, "API key not valid".into()));
        }
        *state.last_body.lock().unwrap() = Some(body);
        Ok(Json(state.reply.lock().unwrap().clone()))
    }

    async fn stub_models() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "models": [
                {"name": "models/gemini-1.5-flash-latest"},
                {"name": "models/gemini-1.5-pro"}
            ]
        }))
    }

    /// Serve a fake Generative Language API on a background runtime.
    /// The blocking client must not run inside the runtime, so tests stay sync.
    fn start_stub(reply: serde_json::Value) -> (tokio::runtime::Runtime, SocketAddr, StubState) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let state = StubState {
            reply: Arc::new(Mutex::new(reply)),
            ..Default::default()
        };
        let app = Router::new()
            .route(
                "/v1beta/models/:call",
                post(stub_generate),
            )
            .route("/v1beta/models", get(stub_models))
            .with_state(state.clone());

        let listener = rt
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        rt.spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (rt, addr, state)
    }

    fn completion_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn generate_sends_prompt_with_zero_temperature() {
        let (_rt, addr, state) = start_stub(completion_reply("{\"titulo_artigo\": \"T\"}"));
        let client = GeminiClient::new(&format!("http://{addr}"), "test-key", 10).unwrap();

        let completion = client.generate("gemini-1.5-flash-latest", "PROMPT").unwrap();
        assert_eq!(completion, "{\"titulo_artigo\": \"T\"}");

        let body = state.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "PROMPT");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn generate_joins_multiple_parts() {
        let reply = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\": "}, {"text": "1}"}]},
                "finishReason": "STOP"
            }]
        });
        let (_rt, addr, _) = start_stub(reply);
        let client = GeminiClient::new(&format!("http://{addr}"), "test-key", 10).unwrap();
        assert_eq!(client.generate("m", "p").unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn wrong_key_maps_to_api_error() {
        let (_rt, addr, _) = start_stub(completion_reply("{}"));
        let client = GeminiClient::new(&format!("http://{addr}"), "wrong-key", 10).unwrap();
        let result = client.generate("m", "p");
        assert!(matches!(result, Err(StructuringError::ApiError { status: 403, .. })));
    }

    #[test]
    fn blocked_prompt_is_empty_completion() {
        let reply = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let (_rt, addr, _) = start_stub(reply);
        let client = GeminiClient::new(&format!("http://{addr}"), "test-key", 10).unwrap();
        match client.generate("m", "p") {
            Err(StructuringError::EmptyCompletion(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected EmptyCompletion, got {other:?}"),
        }
    }

    #[test]
    fn list_models_strips_prefix() {
        let (_rt, addr, _) = start_stub(completion_reply("{}"));
        let client = GeminiClient::new(&format!("http://{addr}"), "test-key", 10).unwrap();
        let models = client.list_models().unwrap();
        assert_eq!(models, vec!["gemini-1.5-flash-latest", "gemini-1.5-pro"]);
        assert!(client.is_model_available("gemini-1.5-flash").unwrap());
    }

    #[test]
    fn unreachable_endpoint_is_connection_error() {
        // Port 9 (discard) is closed on test machines.
        let client = GeminiClient::new("http://127.0.0.1:9", "test-key", 5).unwrap();
        let result = client.generate("m", "p");
        assert!(matches!(result, Err(StructuringError::ApiConnection(_))));
    }

    #[test]
    fn empty_api_key_rejected() {
        let result = GeminiClient::new("http://localhost", "   ", 10);
        assert!(matches!(result, Err(StructuringError::MissingApiKey)));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeminiClient::new("https://generativelanguage.googleapis.com/", "k", 60).unwrap();
        assert_eq!(client.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        assert_eq!(client.generate("model", "prompt").unwrap(), "test response");
    }

    #[test]
    fn mock_client_model_not_available() {
        let client = MockLlmClient::new("").with_models(vec!["gemini-1.0-pro".into()]);
        assert!(!client.is_model_available("gemini-1.5").unwrap());
    }
}
