//! The form's state and the commands that change it.
//!
//! The controller owns the editable record, the selected screenshots
//! and their previews. Each command returns a typed result and leaves
//! exactly one status message behind for the user (or none, for
//! commands that aren't submissions).

use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::watch;

use super::models::{Command, FormError, Outcome, Phase, StatusMessage};
use crate::ai::{BoxedExtractor, ExtractionError, GeminiExtractor};
use crate::appointment::{AppointmentRecord, Field};
use crate::calendar::{CalendarLink, LinkMode, build_calendar_link};
use crate::core::AppConfig;
use crate::images::{DataUrlPreviewStore, ImageFile, PreviewHandle, SharedPreviewStore};

const EXTRACTED_MESSAGE: &str = "Booking details extracted and calendar link created.";
const LINKED_MESSAGE: &str = "Calendar link created from the form.";

// Puts the phase back to `Idle` however the extraction ends
struct ExtractingGuard<'a>(&'a watch::Sender<Phase>);

impl<'a> ExtractingGuard<'a> {
    fn enter(phase: &'a watch::Sender<Phase>) -> Self {
        phase.send_replace(Phase::Extracting);
        Self(phase)
    }
}

impl Drop for ExtractingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(Phase::Idle);
    }
}

pub struct FormController {
    record: AppointmentRecord,
    selection: Vec<ImageFile>,
    previews: Vec<PreviewHandle>,
    phase: watch::Sender<Phase>,
    status: Option<StatusMessage>,
    last_link: Option<CalendarLink>,
    extractor: Option<BoxedExtractor>,
    preview_store: SharedPreviewStore,
    timezone: Tz,
}

impl FormController {
    /// `extractor` is `None` when no credential is available, which
    /// only disables extraction.
    pub fn new(
        extractor: Option<BoxedExtractor>,
        preview_store: SharedPreviewStore,
        timezone: Tz,
    ) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            record: AppointmentRecord::default(),
            selection: Vec::new(),
            previews: Vec::new(),
            phase,
            status: None,
            last_link: None,
            extractor,
            preview_store,
            timezone,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let extractor = GeminiExtractor::from_config(config)
            .map(|extractor| Box::new(extractor) as BoxedExtractor);
        if extractor.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set, screenshot extraction is disabled");
        }
        Self::new(
            extractor,
            Arc::new(DataUrlPreviewStore::new()),
            config.timezone,
        )
    }

    pub fn record(&self) -> &AppointmentRecord {
        &self.record
    }

    pub fn selection(&self) -> &[ImageFile] {
        &self.selection
    }

    pub fn previews(&self) -> &[PreviewHandle] {
        &self.previews
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Watch the submission lifecycle, e.g. to show progress.
    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.phase() == Phase::Idle
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn last_link(&self) -> Option<&CalendarLink> {
        self.last_link.as_ref()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn extraction_available(&self) -> bool {
        self.extractor.is_some()
    }

    pub async fn handle(&mut self, command: Command) -> Result<Outcome, FormError> {
        match command {
            Command::SelectFiles(files) => Ok(Outcome::Selected(self.select_files(files))),
            Command::EditField(field, value) => {
                self.edit_field(field, &value);
                Ok(Outcome::Edited(field))
            }
            Command::ExtractImages => self.extract_images().await,
            Command::SubmitManual => self.submit_manual().map(Outcome::Linked),
            Command::Reset => {
                self.reset();
                Ok(Outcome::Reset)
            }
        }
    }

    /// Replace the selection. Every preview of the previous selection
    /// is released before any new one is created.
    pub fn select_files(&mut self, files: Vec<ImageFile>) -> usize {
        self.begin_submission();

        let released = self.previews.len();
        self.previews.clear();
        tracing::debug!("Released {} preview(s)", released);

        self.previews = files
            .iter()
            .map(|file| PreviewHandle::acquire(&self.preview_store, file))
            .collect();
        self.selection = files;

        tracing::info!("Selected {} screenshot(s)", self.selection.len());
        self.selection.len()
    }

    pub fn edit_field(&mut self, field: Field, value: &str) {
        self.record.set(field, value);
    }

    pub fn reset(&mut self) {
        self.record = AppointmentRecord::default();
        self.begin_submission();
    }

    pub async fn extract_images(&mut self) -> Result<Outcome, FormError> {
        self.begin_submission();

        let result = self.run_extraction().await;
        self.finish(result, EXTRACTED_MESSAGE)
    }

    pub fn submit_manual(&mut self) -> Result<CalendarLink, FormError> {
        self.begin_submission();

        let result = build_calendar_link(&self.record, LinkMode::Manual, &self.timezone)
            .map(|link| {
                self.last_link = Some(link.clone());
                link
            })
            .map_err(FormError::from);
        self.finish(result, LINKED_MESSAGE)
    }

    async fn run_extraction(&mut self) -> Result<Outcome, FormError> {
        if self.selection.is_empty() {
            return Err(FormError::NoImages);
        }
        let extractor = self
            .extractor
            .as_ref()
            .ok_or(ExtractionError::MissingCredential)?;

        let extracted = {
            let _extracting = ExtractingGuard::enter(&self.phase);
            extractor.extract(&self.selection).await?
        };

        // The whole record is replaced even if it can't be linked
        self.record = extracted.clone();

        let link = build_calendar_link(&self.record, LinkMode::Automatic, &self.timezone)?;
        self.last_link = Some(link.clone());

        Ok(Outcome::Extracted {
            record: extracted,
            link,
        })
    }

    fn begin_submission(&mut self) {
        self.status = None;
        self.last_link = None;
    }

    fn finish<T>(&mut self, result: Result<T, FormError>, success: &str) -> Result<T, FormError> {
        self.status = Some(match &result {
            Ok(_) => StatusMessage::Success(success.to_string()),
            Err(e) => {
                tracing::warn!("{}", e);
                StatusMessage::Error(e.to_string())
            }
        });
        result
    }
}
