use thiserror::Error;

use crate::ai::ExtractionError;
use crate::appointment::{AppointmentRecord, Field};
use crate::calendar::{CalendarLink, InvalidScheduleError};
use crate::images::ImageFile;

/// Everything the form can be asked to do.
#[derive(Debug)]
pub enum Command {
    /// Replace the selected screenshots
    SelectFiles(Vec<ImageFile>),
    EditField(Field, String),
    /// Send the selected screenshots to the model, then link the result
    ExtractImages,
    /// Link the fields exactly as they are in the form
    SubmitManual,
    Reset,
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Selected(usize),
    Edited(Field),
    Extracted {
        record: AppointmentRecord,
        link: CalendarLink,
    },
    Linked(CalendarLink),
    Reset,
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    InvalidSchedule(#[from] InvalidScheduleError),

    #[error("Select at least one screenshot before extracting.")]
    NoImages,
}

/// Submission lifecycle. The extract trigger is disabled while
/// `Extracting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Extracting,
}

/// The single message shown to the user after a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusMessage {
    Success(String),
    Error(String),
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Success(text) | StatusMessage::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusMessage::Error(_))
    }
}
