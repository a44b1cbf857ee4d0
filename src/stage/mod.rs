//! Stages: encoders, decoders and runners.
//!
//! Every stage type declares an ordered, typed parameter schema and is built
//! from parsed arguments through the process-wide [`Registry`]. A built stage
//! is a [`Stage`]: the registered type name, its resolved [`Params`] and the
//! concrete implementation behind one of the three traits below.

mod error;
mod instance;
mod registry;
mod schema;

pub use error::StageError;
pub use instance::{DecoderStage, EncoderStage, RunnerStage, Stage};
pub use registry::{Catalog, Registry, StageDef};
pub use schema::{bind, ParamDefault, ParamSpec, ParamType, Params};

use std::fmt;

use crate::decoders::DecodeError;
use crate::runners::{RunContext, RunError, RunOutcome};

/// Stage category. Doubles as the lookup suffix (`ssh` → `SSHEncoder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Encoder,
    Decoder,
    Runner,
}

impl StageKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            StageKind::Encoder => "Encoder",
            StageKind::Decoder => "Decoder",
            StageKind::Runner => "Runner",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Encoder => f.write_str("encoder"),
            StageKind::Decoder => f.write_str("decoder"),
            StageKind::Runner => f.write_str("runner"),
        }
    }
}

/// Static description of a concrete stage type.
pub trait StageType: Sized {
    /// Registered type name, also the session record type tag.
    const NAME: &'static str;
    /// One-paragraph help text.
    const HELP: &'static str;
    /// Ordered parameter schema.
    const SCHEMA: &'static [ParamSpec];

    /// Build the stage from already bound and type-checked values.
    fn from_params(params: &Params) -> Result<Self, StageError>;
}

/// Chain-position-dependent annotations computed in the prepare pass.
///
/// Recomputed for every execution and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preparation {
    /// Own delay plus the delay of every later stage in the chain.
    pub total_delay: Option<u64>,
    /// This is the first instance of its type in chain order, i.e. the one
    /// whose output is not re-wrapped by another instance of the same type.
    pub first_of_type: bool,
}

impl Default for Preparation {
    fn default() -> Self {
        Self {
            total_delay: None,
            first_of_type: true,
        }
    }
}

/// Wraps a command for the next hop.
pub trait Encoder: fmt::Debug {
    /// Phase 1 hook, called for every encoder before any encoding happens.
    fn prepare(&self, _index: usize, _chain: &[EncoderStage]) -> Preparation {
        Preparation::default()
    }

    /// Phase 2: wrap `command`.
    fn encode(&self, command: &str, prep: &Preparation) -> String;

    /// Seconds this stage delays before its results are ready, if any.
    fn delay(&self) -> Option<u64> {
        None
    }
}

/// Post-processes captured output.
pub trait Decoder: fmt::Debug {
    fn decode(&self, output: &str) -> Result<String, DecodeError>;
}

/// Execution backend.
pub trait Runner: fmt::Debug {
    /// Runner-specific escaping, applied once after the encoder chain.
    fn encode(&self, command: &str) -> String {
        command.to_string()
    }

    /// Execute the fully encoded command and capture its output.
    fn run(&self, command: &str, ctx: &RunContext) -> Result<RunOutcome, RunError>;
}
