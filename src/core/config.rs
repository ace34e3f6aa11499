use std::env;

use chrono_tz::Tz;

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Taipei;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // Extraction is disabled when this is missing, manual links still work
    pub gemini_api_key: Option<String>,
    pub gemini_api_hostname: String,
    pub gemini_model: String,
    pub timezone: Tz,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let gemini_api_hostname =
            env::var("CLEANCAL_GEMINI_HOST").unwrap_or_else(|_| DEFAULT_GEMINI_HOST.to_string());
        let gemini_model =
            env::var("CLEANCAL_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let timezone = env::var("CLEANCAL_TIMEZONE")
            .map(|name| parse_timezone(&name))
            .unwrap_or(DEFAULT_TIMEZONE);

        Self {
            gemini_api_key,
            gemini_api_hostname,
            gemini_model,
            timezone,
        }
    }
}

/// Parse an IANA zone name, falling back to the default zone.
pub fn parse_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(
            "Unknown timezone {:?}, falling back to {}",
            name,
            DEFAULT_TIMEZONE.name()
        );
        DEFAULT_TIMEZONE
    })
}
