//! Per-test phase logging.
#![allow(dead_code)]
//!
//! Output goes to stderr (shown by `cargo test -- --nocapture`) and is
//! silenced unless `TEST_LOG` is set. `TEST_LOG=json` emits one JSON object
//! per line.
//!
//! ```rust,ignore
//! let log = TestLogger::new("batch_reports_every_task");
//! log.phase("setup");
//! // ...
//! log.finish_ok();
//! ```

use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Off,
    Text,
    Json,
}

fn mode() -> Mode {
    match std::env::var("TEST_LOG").as_deref() {
        Ok("json") => Mode::Json,
        Ok("") | Err(_) => Mode::Off,
        Ok(_) => Mode::Text,
    }
}

/// Per-test logger with phase and duration tracking.
pub struct TestLogger {
    test_name: String,
    start_time: Instant,
    phase: Mutex<String>,
    mode: Mode,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
            phase: Mutex::new("init".to_string()),
            mode: mode(),
        };
        logger.info("Test starting");
        logger
    }

    /// Set the current phase (setup, execute, verify).
    pub fn phase(&self, phase: &str) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase.to_string();
        }
        self.emit("DEBUG", &format!("Phase: {phase}"));
    }

    pub fn info(&self, message: &str) {
        self.emit("INFO", message);
    }

    pub fn debug(&self, message: &str) {
        self.emit("DEBUG", message);
    }

    pub fn http_request(&self, method: &str, url: &str) {
        self.debug(&format!("HTTP {method} {url}"));
    }

    pub fn finish_ok(&self) {
        self.emit("INFO", &format!("Test passed ({}ms)", self.elapsed_ms()));
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    fn emit(&self, level: &str, message: &str) {
        let phase = self
            .phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default();
        match self.mode {
            Mode::Off => {}
            Mode::Text => eprintln!(
                "[{}] {level:<5} {} [{phase}] {message}",
                Utc::now().format("%H:%M:%S%.3f"),
                self.test_name
            ),
            Mode::Json => eprintln!(
                "{}",
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "level": level,
                    "test": self.test_name,
                    "phase": phase,
                    "message": message,
                    "elapsedMs": self.elapsed_ms(),
                })
            ),
        }
    }
}
