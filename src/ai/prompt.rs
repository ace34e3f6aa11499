//! Prompts for the extraction model, rendered with Handlebars in
//! strict mode so a missing variable is an error instead of an empty
//! hole in the instructions.

use std::fmt;

use handlebars::Handlebars;
use serde::Serialize;

#[derive(Debug)]
pub enum Prompt {
    ExtractionSystem,
    ExtractionUser,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const EXTRACTION_SYSTEM_PROMPT: &str = r"
You read screenshots of bookings for a home cleaning service (chat messages, booking apps, order confirmations) and extract the appointment details.

Rules:
- Only use information visible in the screenshots. Never invent values.
- Use an empty string for any field you cannot find.
- Dates are always YYYY-MM-DD. Times are always 24-hour HH:MM.
- Keep names, addresses and areas in their original language and script.
- If several screenshots show the same booking, merge them into one appointment.
";

const EXTRACTION_USER_PROMPT: &str = r"
Extract the cleaning appointment from the {{image_count}} screenshot(s) above.

Today is {{today}} in the {{timezone}} timezone. When a date has no year, use the next upcoming occurrence of that date. When only a start time and a duration are given, compute the end time.
";

#[derive(Serialize)]
pub struct ExtractionUserContext {
    pub image_count: usize,
    pub today: String,
    pub timezone: String,
}

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Plain text for a model, not HTML
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(
            &Prompt::ExtractionSystem.to_string(),
            EXTRACTION_SYSTEM_PROMPT,
        )
        .expect("Failed to register template");
    registry
        .register_template_string(&Prompt::ExtractionUser.to_string(), EXTRACTION_USER_PROMPT)
        .expect("Failed to register template");
    registry
}
