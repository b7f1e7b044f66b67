//! Shared helpers for pipeline integration tests.

use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initialize test logging once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An event log shared between interceptors and the test body.
#[derive(Clone, Default)]
pub struct Events {
    inner: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.inner.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }
}
