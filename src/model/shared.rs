use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{AnswerCapability, InferenceError};

/// A lock standing for one accelerator shared by several handles.
pub fn device_lock() -> Arc<Mutex<()>> {
    Arc::new(Mutex::new(()))
}

/// Wraps a capability so every call holds the device lock for its duration.
pub struct Serialized<M> {
    inner: M,
    device: Arc<Mutex<()>>,
}

impl<M> Serialized<M> {
    pub fn new(inner: M, device: Arc<Mutex<()>>) -> Self {
        Self { inner, device }
    }
}

impl<M: AnswerCapability> AnswerCapability for Serialized<M> {
    fn infer(
        &self,
        prompt: &str,
        image: Option<&Path>,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        let _guard = self
            .device
            .lock()
            .map_err(|_| InferenceError::Unavailable("device lock poisoned".to_string()))?;
        self.inner.infer(prompt, image, max_new_tokens)
    }
}
