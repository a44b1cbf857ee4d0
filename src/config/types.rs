use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runners::RunContext;

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub repl: ReplConfig,
}

/// Execution defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Runner a fresh session starts with (default: "bash").
    #[serde(default = "default_runner")]
    pub runner: String,
    /// Process poll interval in milliseconds (default: 200).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Grace period between SIGTERM and SIGKILL in milliseconds (default: 500).
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
}

/// Interactive loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt shown while reading a here-document.
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// Marker that turns a line into a session command (default: "$").
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Print every encoding step before the output.
    #[serde(default = "default_show_stages")]
    pub show_stages: bool,
}

fn default_runner() -> String {
    "bash".to_string()
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_kill_grace_ms() -> u64 {
    500
}

fn default_prompt() -> String {
    ">>> ".to_string()
}

fn default_continuation_prompt() -> String {
    "... ".to_string()
}

fn default_command_prefix() -> String {
    "$".to_string()
}

fn default_show_stages() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            runner: default_runner(),
            poll_interval_ms: default_poll_interval_ms(),
            kill_grace_ms: default_kill_grace_ms(),
        }
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            command_prefix: default_command_prefix(),
            show_stages: default_show_stages(),
        }
    }
}

impl Defaults {
    pub fn run_context(&self) -> RunContext {
        RunContext::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_millis(self.kill_grace_ms),
        )
    }
}
