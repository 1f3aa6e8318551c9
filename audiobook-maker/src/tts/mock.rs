//! Mock synthesizer for testing
//!
//! Echoes the text back as its "audio" so tests can check what was spoken
//! and in which order.

use super::Synthesizer;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct MockSynthesizer {
    /// Number of calls to fail before succeeding
    fail_count: usize,
    call_count: AtomicUsize,
    delay: Option<Duration>,
    /// Texts that always fail
    fail_text: Option<String>,
    spoken: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    fn with_failures(fail_count: usize) -> Self {
        Self {
            fail_count,
            call_count: AtomicUsize::new(0),
            delay: None,
            fail_text: None,
            spoken: Mutex::new(Vec::new()),
        }
    }

    pub fn always_succeeds() -> Self {
        Self::with_failures(0)
    }

    pub fn always_fails() -> Self {
        Self::with_failures(usize::MAX)
    }

    pub fn fails_then_succeeds(n: usize) -> Self {
        Self::with_failures(n)
    }

    /// Succeeds except for calls on exactly `text`
    pub fn fails_on(text: &str) -> Self {
        let mut mock = Self::with_failures(0);
        mock.fail_text = Some(text.to_string());
        mock
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts of successful calls, in completion order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if call_num < self.fail_count || self.fail_text.as_deref() == Some(text) {
            return Err(PipelineError::Synthesis {
                segment: "mock".to_string(),
                message: "mock failure".to_string(),
            });
        }

        self.spoken.lock().unwrap().push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
