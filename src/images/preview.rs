//! Preview handles are ephemeral references to the bytes of a selected
//! image. A handle is registered with a `PreviewStore` when created and
//! released from it when dropped, so replacing a selection or dropping
//! the form never leaks previews.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use uuid::Uuid;

use super::ImageFile;

pub trait PreviewStore {
    /// Register a preview for the image and return its reference.
    fn create(&self, image: &ImageFile) -> String;
    /// Forget a reference returned by `create`.
    fn release(&self, reference: &str);
}

pub type SharedPreviewStore = Arc<dyn PreviewStore + Send + Sync + 'static>;

/// A live preview. Dropping it releases the reference.
pub struct PreviewHandle {
    reference: String,
    name: String,
    store: SharedPreviewStore,
}

impl PreviewHandle {
    pub fn acquire(store: &SharedPreviewStore, image: &ImageFile) -> Self {
        let reference = store.create(image);
        Self {
            reference,
            name: image.name.clone(),
            store: Arc::clone(store),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        tracing::trace!("Releasing preview {}", self.reference);
        self.store.release(&self.reference);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("reference", &self.reference)
            .field("name", &self.name)
            .finish()
    }
}

/// Keeps a `data:` URL for every live preview in memory.
#[derive(Default)]
pub struct DataUrlPreviewStore {
    previews: Mutex<HashMap<String, String>>,
}

impl DataUrlPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_url(&self, reference: &str) -> Option<String> {
        self.entries().get(reference).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    // A panic elsewhere must not stop releases from happening
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.previews.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewStore for DataUrlPreviewStore {
    fn create(&self, image: &ImageFile) -> String {
        let reference = format!("preview:{}", Uuid::new_v4());
        let data_url = format!(
            "data:{};base64,{}",
            image.media_type,
            STANDARD.encode(&image.bytes)
        );
        self.entries().insert(reference.clone(), data_url);
        reference
    }

    fn release(&self, reference: &str) {
        self.entries().remove(reference);
    }
}
