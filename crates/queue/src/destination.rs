use std::sync::{Arc, RwLock};

/// Process-wide upload destination, changeable at runtime by an admin.
///
/// The value is passed through to the transfer client untouched; an empty
/// string means "no destination".
#[derive(Debug, Clone, Default)]
pub struct Destination {
    inner: Arc<RwLock<String>>,
}

impl Destination {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn get(&self) -> Option<String> {
        let value = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if value.is_empty() {
            None
        } else {
            Some(value.clone())
        }
    }

    /// Replace the destination and return the previous one.
    pub fn set(&self, value: impl Into<String>) -> Option<String> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, value.into());
        (!previous.is_empty()).then_some(previous)
    }
}
