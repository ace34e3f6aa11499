//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::{Value, json};
use tokio::sync::Notify;

use cleancal::ai::{BoxedExtractor, ExtractionError, Extractor};
use cleancal::appointment::AppointmentRecord;
use cleancal::form::FormController;
use cleancal::images::{ImageFile, PreviewStore, SharedPreviewStore};

pub const TAIPEI: Tz = chrono_tz::Asia::Taipei;

/// A fully populated record as the model would return it.
pub fn sample_record() -> AppointmentRecord {
    AppointmentRecord {
        area: String::from("中山區"),
        customer_name: String::from("王小明"),
        phone: String::from("0912-345-678"),
        date: String::from("2025-03-01"),
        start_time: String::from("09:00"),
        end_time: String::from("12:00"),
        address: String::from("台北市中山區南京東路一段1號5樓"),
        notes: String::from("家中有貓，請勿開窗"),
    }
}

pub fn images(count: usize) -> Vec<ImageFile> {
    (0..count)
        .map(|i| ImageFile::new(&format!("shot-{}.png", i), "image/png", vec![i as u8; 8]))
        .collect()
}

/// Wrap model output text in a `generateContent` response body.
pub fn gemini_response(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
            "index": 0
        }],
        "modelVersion": "gemini-test"
    })
    .to_string()
}

pub fn gemini_error(code: u16, message: &str, status: &str, reason: Option<&str>) -> String {
    let mut error = json!({
        "error": {
            "code": code,
            "message": message,
            "status": status
        }
    });
    if let Some(reason) = reason {
        error["error"]["details"] = json!([{
            "@type": "type.googleapis.com/google.rpc.ErrorInfo",
            "reason": reason,
            "domain": "googleapis.com"
        }]);
    }
    error.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    Created(String),
    Released(String),
}

/// Records every preview it hands out and every release, in order.
#[derive(Default)]
pub struct CountingPreviewStore {
    next_id: AtomicUsize,
    events: Mutex<Vec<PreviewEvent>>,
}

impl CountingPreviewStore {
    pub fn events(&self) -> Vec<PreviewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PreviewEvent::Created(reference) => Some(reference),
                PreviewEvent::Released(_) => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PreviewEvent::Released(reference) => Some(reference),
                PreviewEvent::Created(_) => None,
            })
            .collect()
    }
}

impl PreviewStore for CountingPreviewStore {
    fn create(&self, image: &ImageFile) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let reference = format!("test-preview-{}-{}", id, image.name);
        self.events
            .lock()
            .unwrap()
            .push(PreviewEvent::Created(reference.clone()));
        reference
    }

    fn release(&self, reference: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PreviewEvent::Released(reference.to_string()));
    }
}

/// Returns a canned result and counts how it was called.
pub struct MockExtractor {
    respond: Box<dyn Fn() -> Result<AppointmentRecord, ExtractionError> + Send + Sync>,
    pub calls: Arc<AtomicUsize>,
    pub image_counts: Arc<Mutex<Vec<usize>>>,
}

impl MockExtractor {
    pub fn new(
        respond: impl Fn() -> Result<AppointmentRecord, ExtractionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Arc::new(AtomicUsize::new(0)),
            image_counts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, images: &[ImageFile]) -> Result<AppointmentRecord, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.image_counts.lock().unwrap().push(images.len());
        (self.respond)()
    }
}

/// Blocks inside `extract` until the gate is opened.
pub struct GatedExtractor {
    pub gate: Arc<Notify>,
    pub record: AppointmentRecord,
}

#[async_trait]
impl Extractor for GatedExtractor {
    async fn extract(&self, _images: &[ImageFile]) -> Result<AppointmentRecord, ExtractionError> {
        self.gate.notified().await;
        Ok(self.record.clone())
    }
}

pub fn test_form(extractor: Option<BoxedExtractor>) -> (FormController, Arc<CountingPreviewStore>) {
    let store = Arc::new(CountingPreviewStore::default());
    let shared: SharedPreviewStore = store.clone();
    (FormController::new(extractor, shared, TAIPEI), store)
}

pub fn query_value(url: &str, key: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn record_json(record: &AppointmentRecord) -> Value {
    serde_json::to_value(record).unwrap()
}
