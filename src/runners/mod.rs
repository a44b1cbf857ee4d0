//! Runners: execution backends at the end of the pipeline.

mod bash;
mod echo;
mod web;

pub use bash::BashRunner;
pub use echo::EchoRunner;
pub use web::WebRunner;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to create output pipe: {source}")]
    Pipe {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Why a run was stopped before the command finished on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TimedOut(Duration),
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TimedOut(limit) => write!(f, "Command timed out after {}s", limit.as_secs()),
            StopReason::Interrupted => f.write_str("Command interrupted"),
        }
    }
}

/// Captured output of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub output: String,
    /// Set when the command was terminated; `output` is then partial.
    pub stopped: Option<StopReason>,
}

impl RunOutcome {
    pub fn completed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            stopped: None,
        }
    }
}

/// Per-run settings shared by every runner.
#[derive(Debug, Clone)]
pub struct RunContext {
    interrupt: Arc<AtomicBool>,
    /// How often a running process is checked for completion and deadlines.
    pub poll_interval: Duration,
    /// How long a terminated process group gets before it is killed, and how
    /// long output is still collected after the process is gone.
    pub kill_grace: Duration,
}

impl RunContext {
    pub fn new(poll_interval: Duration, kill_grace: Duration) -> Self {
        Self {
            interrupt: Arc::new(AtomicBool::new(false)),
            poll_interval,
            kill_grace,
        }
    }

    /// The flag a signal handler sets to interrupt the running command.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    /// Clear a pending interrupt, e.g. one raised while idle at the prompt.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::SeqCst);
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_millis(500))
    }
}
