//! Turns booking screenshots into an `AppointmentRecord` with a single
//! structured-output call to Gemini.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use chrono_tz::Tz;
use thiserror::Error;

use super::prompt::{ExtractionUserContext, Prompt, templates};
use crate::appointment::{AppointmentRecord, Field};
use crate::core::AppConfig;
use crate::gemini::{
    Content, GeminiClient, GeminiError, GenerateContentRequest, GenerationConfig, Part, Role,
    Schema, SchemaType,
};
use crate::images::ImageFile;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Screenshot extraction is unavailable: no Gemini API key is configured (set GEMINI_API_KEY).")]
    MissingCredential,

    #[error("The Gemini API key was rejected. Check GEMINI_API_KEY and try again. ({0})")]
    Authentication(String),

    #[error("The model returned no usable content. Try clearer screenshots or fill in the form manually.")]
    EmptyResponse,

    #[error("Failed to extract booking details: {0}")]
    Generic(String),
}

impl From<GeminiError> for ExtractionError {
    fn from(err: GeminiError) -> Self {
        match err {
            // The call succeeded but the body is unreadable
            GeminiError::Decode(_) => ExtractionError::EmptyResponse,
            err if err.is_invalid_api_key() => ExtractionError::Authentication(err.to_string()),
            err => ExtractionError::Generic(err.to_string()),
        }
    }
}

/// Anything that can read an appointment out of a set of images.
#[async_trait]
pub trait Extractor {
    async fn extract(&self, images: &[ImageFile]) -> Result<AppointmentRecord, ExtractionError>;
}

pub type BoxedExtractor = Box<dyn Extractor + Send + Sync + 'static>;

fn field_description(field: Field) -> &'static str {
    match field {
        Field::Area => {
            "The district or service area of the booking, for example 中山區. Empty string if not found."
        }
        Field::CustomerName => "The customer's name. Empty string if not found.",
        Field::Phone => {
            "The customer's phone number exactly as written. Empty string if not found."
        }
        Field::Date => {
            "The appointment date normalized to YYYY-MM-DD, e.g. 2025-03-01. Empty string if not found."
        }
        Field::StartTime => {
            "The start time in 24-hour HH:MM format, e.g. 09:00 or 14:30. Empty string if not found."
        }
        Field::EndTime => {
            "The end time in 24-hour HH:MM format, e.g. 12:00 or 17:30. Empty string if not found."
        }
        Field::Address => "The full service address. Empty string if not found.",
        Field::Notes => {
            "Any other remarks such as special requests, pets, parking, access codes or cleaning items. Empty string if none."
        }
    }
}

/// The fixed structured-output schema: one required string per field.
pub fn extraction_schema() -> Schema {
    Field::ALL
        .iter()
        .fold(Schema::new(SchemaType::Object), |schema, field| {
            schema.required_property(field.key(), Schema::string(field_description(*field)))
        })
}

/// Parse the model's JSON text into a record. Absent fields are empty.
pub fn parse_record(text: &str) -> Result<AppointmentRecord, ExtractionError> {
    let text = text.trim();
    // Structured output should be bare JSON but tolerate a markdown fence
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|t| t.trim_end().strip_suffix("```"))
        .unwrap_or(text)
        .trim();

    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ExtractionError::Generic(format!("response is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ExtractionError::Generic(format!(
            "expected a JSON object but got: {}",
            value
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| ExtractionError::Generic(format!("unexpected response shape: {}", e)))
}

pub struct GeminiExtractor {
    client: GeminiClient,
    timezone: Tz,
}

impl GeminiExtractor {
    pub fn new(client: GeminiClient, timezone: Tz) -> Self {
        Self { client, timezone }
    }

    /// Build an extractor when an API key is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.as_deref()?;
        let client = GeminiClient::new(&config.gemini_api_hostname, api_key, &config.gemini_model);
        Some(Self::new(client, config.timezone))
    }

    pub fn request(&self, images: &[ImageFile]) -> Result<GenerateContentRequest, ExtractionError> {
        let registry = templates();
        let system_prompt = registry
            .render(&Prompt::ExtractionSystem.to_string(), &serde_json::json!({}))
            .map_err(|e| ExtractionError::Generic(e.to_string()))?;
        let today = Utc::now().with_timezone(&self.timezone);
        let user_prompt = registry
            .render(
                &Prompt::ExtractionUser.to_string(),
                &ExtractionUserContext {
                    image_count: images.len(),
                    today: today.format("%Y-%m-%d (%A)").to_string(),
                    timezone: self.timezone.name().to_string(),
                },
            )
            .map_err(|e| ExtractionError::Generic(e.to_string()))?;

        let mut parts: Vec<Part> = images
            .iter()
            .map(|image| Part::inline_data(&image.media_type, STANDARD.encode(&image.bytes)))
            .collect();
        parts.push(Part::text(user_prompt.trim()));

        Ok(GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(system_prompt.trim())],
            },
            contents: vec![Content {
                role: Some(Role::User),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: String::from("application/json"),
                response_schema: extraction_schema(),
            },
        })
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, images: &[ImageFile]) -> Result<AppointmentRecord, ExtractionError> {
        let request = self.request(images)?;
        tracing::info!(
            "Extracting appointment from {} image(s) with {}",
            images.len(),
            self.client.model()
        );

        let response = self.client.generate_content(&request).await?;
        let text = response.text().ok_or(ExtractionError::EmptyResponse)?;
        tracing::debug!("Extraction response: {}", text);

        parse_record(&text)
    }
}
