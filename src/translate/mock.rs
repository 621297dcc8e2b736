//! Mock translator for testing
//!
//! Returns `"[<code>] <text>"` without making real API calls, and records
//! every request so tests can count provider calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;

use super::Translator;

/// Mock translator with optional failure simulation
#[derive(Debug, Default)]
pub struct MockTranslator {
    /// Fail every call
    always_fail: bool,
    /// Source texts that fail
    failing: HashSet<String>,
    /// Track all requests made (for assertions)
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A translator whose every call fails
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// Make calls for one specific source text fail
    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// All `(text, target)` requests made to this translator
    pub fn get_requests(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear_requests(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        self.lock().push((text.to_string(), target.to_string()));

        if self.always_fail || self.failing.contains(text) {
            anyhow::bail!("mock translation failure for '{}'", text);
        }
        Ok(format!("[{}] {}", target, text))
    }
}
