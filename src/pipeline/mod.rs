//! Pipeline executor: encoders → runner → decoders.
//!
//! ```text
//! prepare(0..n)                  every encoder sees its index and the chain
//! encode(n-1) … encode(0)        last index wraps the raw command first
//! runner.encode → runner.run     index 0's output goes to the runner
//! decode(m-1) … decode(0)        decoders unwind the captured output
//! ```
//!
//! The prepare pass completes for the whole chain before any encoding.

mod session;

pub use session::{Session, SessionError, SessionRecord};

use thiserror::Error;
use tracing::{debug, warn};

use crate::decoders::DecodeError;
use crate::runners::{RunContext, RunError};
use crate::stage::{DecoderStage, EncoderStage, Preparation, RunnerStage};

/// Session record field holding a stage's registered type name.
pub const TYPE_TAG: &str = "__classname__";

/// Errors that abort an execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Run(#[from] RunError),

    #[error("{decoder}: {source}")]
    Decode {
        decoder: String,
        #[source]
        source: DecodeError,
    },
}

/// Result of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Decoded output.
    pub output: String,
    /// The command after each encoder, in fold order, then after the
    /// runner's own encoding.
    pub trace: Vec<String>,
    /// Non-fatal problems, e.g. a timeout that cut the output short.
    pub warnings: Vec<String>,
}

/// Phase 1: compute every encoder's position-dependent annotations.
pub fn prepare(encoders: &[EncoderStage]) -> Vec<Preparation> {
    encoders
        .iter()
        .enumerate()
        .map(|(index, encoder)| encoder.prepare(index, encoders))
        .collect()
}

/// Phases 1 and 2: the fully wrapped command and its intermediate forms.
pub fn encode(command: &str, encoders: &[EncoderStage]) -> (String, Vec<String>) {
    let preparations = prepare(encoders);
    let mut current = command.to_string();
    let mut trace = Vec::with_capacity(encoders.len());

    for (encoder, prep) in encoders.iter().zip(&preparations).rev() {
        current = encoder.encode(&current, prep);
        debug!(encoder = encoder.name(), len = current.len(), "Encoded");
        trace.push(current.clone());
    }
    (current, trace)
}

/// Run `command` through the whole pipeline.
pub fn execute(
    command: &str,
    runner: &RunnerStage,
    encoders: &[EncoderStage],
    decoders: &[DecoderStage],
    ctx: &RunContext,
) -> Result<Execution, PipelineError> {
    let (encoded, mut trace) = encode(command, encoders);

    let final_command = runner.encode(&encoded);
    trace.push(final_command.clone());
    debug!(runner = runner.name(), "Dispatching command");

    let outcome = runner.run(&final_command, ctx)?;
    let mut warnings = Vec::new();
    if let Some(reason) = outcome.stopped {
        warn!(runner = runner.name(), "{}", reason);
        warnings.push(format!("{}, output may be incomplete", reason));
    }

    let mut output = outcome.output;
    for decoder in decoders.iter().rev() {
        output = decoder.decode(&output).map_err(|source| PipelineError::Decode {
            decoder: decoder.name().to_string(),
            source,
        })?;
    }

    Ok(Execution {
        output,
        trace,
        warnings,
    })
}
