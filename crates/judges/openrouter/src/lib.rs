//! OpenRouter Photo Judge
//!
//! Sends both photos of a comparison to a vision model through OpenRouter's
//! chat-completions endpoint and reads back which one it prefers.
//!
//! # Credentials
//!
//! The API key is read from `OPENROUTER_API_KEY`. A `.env` file in the
//! working directory is loaded first if present:
//! ```text
//! OPENROUTER_API_KEY=sk-or-...
//! ```
//!
//! Every call is blocking; the tournament judges one pair at a time.

mod response;

pub use response::{extract_json_object, parse_judgment};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bracket_core::{Item, Judge, JudgeError, Judgment};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::response::ChatResponse;

/// Chat-completions endpoint
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f64 = 0.1;

const SYSTEM_PROMPT: &str = "You are an expert photo judge.";

const INSTRUCTIONS: &str = "You will be shown two photos, A and B, as base64 data URLs.
Choose the better photograph on overall visual appeal, storytelling and emotional impact.
Note the strengths and weaknesses of each photo as well as the overall comparison.
Reply ONLY with:
{
  \"winner\": \"<a|b>\",
  \"explanation\": \"<up to 40 words comparing them, and 20 words per photo>\"
}";

/// Judge backed by a remote vision model.
pub struct OpenRouterJudge {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenRouterJudge {
    /// Build a judge from `OPENROUTER_API_KEY`.
    ///
    /// Fails with [`JudgeError::MissingCredentials`] when the key is unset
    /// or empty.
    pub fn from_env() -> Result<Self, JudgeError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(JudgeError::MissingCredentials(API_KEY_VAR))?;
        Self::new(api_key)
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, JudgeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| JudgeError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: OPENROUTER_URL.to_string(),
        })
    }

    /// Point the judge at a different chat-completions endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn send(&self, body: &Value) -> Result<String, JudgeError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Photo Tournament")
            .json(body)
            .send()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(JudgeError::Status(resp.status().as_u16()));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| JudgeError::MalformedResponse(format!("unreadable body: {}", e)))?;

        parsed
            .into_content()
            .ok_or_else(|| JudgeError::MalformedResponse("no content in reply".to_string()))
    }
}

impl Judge for OpenRouterJudge {
    fn judge(&mut self, a: &Item, b: &Item, model: &str) -> Result<Judgment, JudgeError> {
        let image_a = image_data_url(Path::new(&a.locator))?;
        let image_b = image_data_url(Path::new(&b.locator))?;

        debug!(a = %a.id, b = %b.id, model, "requesting judgment");
        let content = self.send(&request_body(model, &image_a, &image_b))?;
        parse_judgment(&content)
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }
}

/// Chat-completions payload asking `model` to compare two images.
pub fn request_body(model: &str, image_a: &str, image_b: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": INSTRUCTIONS },
                    { "type": "image_url", "image_url": { "url": image_a } },
                    { "type": "text", "text": "Photo A (above)" },
                    { "type": "image_url", "image_url": { "url": image_b } },
                    { "type": "text", "text": "Photo B (above)" },
                ],
            },
        ],
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
    })
}

/// Read an image file into a `data:` URL. PNG by extension, JPEG otherwise.
pub fn image_data_url(path: &Path) -> Result<String, JudgeError> {
    let bytes = std::fs::read(path).map_err(|source| JudgeError::Content {
        path: path.to_path_buf(),
        source,
    })?;
    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    let mime = if is_png { "image/png" } else { "image/jpeg" };
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
