use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::schema::Schema;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    // Base64 encoded
    pub data: String,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: &str) -> Self {
        Part::Text {
            text: text.to_string(),
        }
    }

    pub fn inline_data(mime_type: &str, data: String) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data,
            },
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Schema,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if there is any.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// {
//   "error": {
//     "code": 400,
//     "message": "API key not valid. Please pass a valid API key.",
//     "status": "INVALID_ARGUMENT",
//     "details": [{"@type": "...ErrorInfo", "reason": "API_KEY_INVALID", ...}]
//   }
// }
#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    details: Vec<Value>,
}

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Gemini API returned {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        reason: Option<String>,
    },

    #[error("Request to Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode Gemini API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GeminiError {
    /// Whether the API rejected the credential itself.
    pub fn is_invalid_api_key(&self) -> bool {
        match self {
            GeminiError::Api {
                status,
                message,
                reason,
            } => {
                *status == StatusCode::UNAUTHORIZED
                    || message.contains("API key not valid")
                    || reason.as_deref() == Some("API_KEY_INVALID")
            }
            _ => false,
        }
    }
}

fn api_error(status: StatusCode, body: &str) -> GeminiError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) => {
            let reason = error
                .details
                .iter()
                .find_map(|d| d["reason"].as_str())
                .map(String::from);
            GeminiError::Api {
                status,
                message: error.message,
                reason,
            }
        }
        Err(_) => GeminiError::Api {
            status,
            message: body.trim().to_string(),
            reason: None,
        },
    }
}

/// A Gemini API client holding its own credential.
#[derive(Clone)]
pub struct GeminiClient {
    api_hostname: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_hostname, self.model
        );
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Gemini API error {}: {}", status, body);
            return Err(api_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(GenerateContentResponse::default());
        }

        let parsed = serde_json::from_str::<GenerateContentResponse>(&body).inspect_err(|e| {
            tracing::error!("Parsing Gemini response failed for {}\nError:{}", body, e)
        })?;
        Ok(parsed)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Never print the key
        f.debug_struct("GeminiClient")
            .field("api_hostname", &self.api_hostname)
            .field("model", &self.model)
            .finish()
    }
}
