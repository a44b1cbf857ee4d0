//! Session: the runner and both chains, plus their JSON record form.
//!
//! A session is replaced as a whole: loading builds every stage first and
//! only then swaps the new session in, so a bad record never leaves a
//! half-loaded pipeline behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::args::{ArgList, Value};
use crate::pipeline::{execute, Execution, PipelineError, TYPE_TAG};
use crate::runners::RunContext;
use crate::stage::{
    Catalog, DecoderStage, EncoderStage, Registry, RunnerStage, Stage, StageError, StageKind,
};

type Record = serde_json::Map<String, serde_json::Value>;

/// Errors from chain edits and session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("{index} is not a valid {kind} index (chain length {len})")]
    InvalidIndex {
        kind: StageKind,
        index: usize,
        len: usize,
    },

    #[error("Cannot pop from an empty {kind} list")]
    EmptyChain { kind: StageKind },

    #[error("Invalid session: {message}")]
    Format { message: String },

    #[error("Session file '{path}' does not exist")]
    NotFound { path: PathBuf },

    #[error("Failed to read session file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse session file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write session file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub runner: Record,
    #[serde(default)]
    pub encoders: Vec<Record>,
    #[serde(default)]
    pub decoders: Vec<Record>,
}

/// The pipeline being edited: one runner, an encoder chain, a decoder chain.
#[derive(Debug)]
pub struct Session {
    runner: RunnerStage,
    encoders: Vec<EncoderStage>,
    decoders: Vec<DecoderStage>,
}

impl Session {
    /// A session with the given runner and empty chains.
    pub fn new(runner: RunnerStage) -> Self {
        Self {
            runner,
            encoders: Vec::new(),
            decoders: Vec::new(),
        }
    }

    /// A session whose runner is `name` built with no arguments.
    pub fn with_runner_named(registry: &Registry, name: &str) -> Result<Self, StageError> {
        Ok(Self::new(registry.runners.build(name, "")?))
    }

    pub fn runner(&self) -> &RunnerStage {
        &self.runner
    }

    pub fn encoders(&self) -> &[EncoderStage] {
        &self.encoders
    }

    pub fn decoders(&self) -> &[DecoderStage] {
        &self.decoders
    }

    pub fn set_runner(&mut self, runner: RunnerStage) {
        self.runner = runner;
    }

    /// Insert an encoder at `index` (default: append). Returns its index.
    pub fn push_encoder(&mut self, index: Option<usize>, stage: EncoderStage) -> Result<usize, SessionError> {
        insert_at(StageKind::Encoder, &mut self.encoders, index, stage)
    }

    /// Remove the encoder at `index` (default: the last one).
    pub fn pop_encoder(&mut self, index: Option<usize>) -> Result<EncoderStage, SessionError> {
        remove_at(StageKind::Encoder, &mut self.encoders, index)
    }

    /// Insert a decoder at `index` (default: append). Returns its index.
    pub fn push_decoder(&mut self, index: Option<usize>, stage: DecoderStage) -> Result<usize, SessionError> {
        insert_at(StageKind::Decoder, &mut self.decoders, index, stage)
    }

    /// Remove the decoder at `index` (default: the last one).
    pub fn pop_decoder(&mut self, index: Option<usize>) -> Result<DecoderStage, SessionError> {
        remove_at(StageKind::Decoder, &mut self.decoders, index)
    }

    pub fn execute(&self, command: &str, ctx: &RunContext) -> Result<Execution, PipelineError> {
        execute(command, &self.runner, &self.encoders, &self.decoders, ctx)
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            runner: self.runner.to_record(),
            encoders: self.encoders.iter().map(Stage::to_record).collect(),
            decoders: self.decoders.iter().map(Stage::to_record).collect(),
        }
    }

    /// Rebuild every stage of `record` through named-only construction.
    pub fn from_record(registry: &Registry, record: &SessionRecord) -> Result<Self, SessionError> {
        let runner = stage_from_record(&registry.runners, &record.runner)?;
        let encoders = record
            .encoders
            .iter()
            .map(|r| stage_from_record(&registry.encoders, r))
            .collect::<Result<Vec<_>, _>>()?;
        let decoders = record
            .decoders
            .iter()
            .map(|r| stage_from_record(&registry.decoders, r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            runner,
            encoders,
            decoders,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(&self.to_record())
            .map_err(|source| SessionError::Serialize { source })?;
        fs::write(path, json).map_err(|source| SessionError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Session saved");
        Ok(())
    }

    pub fn load(registry: &Registry, path: &Path) -> Result<Self, SessionError> {
        if !path.is_file() {
            return Err(SessionError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let record: SessionRecord =
            serde_json::from_str(&content).map_err(|source| SessionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let session = Self::from_record(registry, &record)?;
        info!(
            path = %path.display(),
            encoders = session.encoders.len(),
            decoders = session.decoders.len(),
            "Session loaded"
        );
        Ok(session)
    }
}

fn insert_at<T>(kind: StageKind, chain: &mut Vec<T>, index: Option<usize>, stage: T) -> Result<usize, SessionError> {
    let len = chain.len();
    let index = index.unwrap_or(len);
    if index > len {
        return Err(SessionError::InvalidIndex { kind, index, len });
    }
    chain.insert(index, stage);
    Ok(index)
}

fn remove_at<T>(kind: StageKind, chain: &mut Vec<T>, index: Option<usize>) -> Result<T, SessionError> {
    let len = chain.len();
    if len == 0 {
        return Err(SessionError::EmptyChain { kind });
    }
    let index = index.unwrap_or(len - 1);
    if index >= len {
        return Err(SessionError::InvalidIndex { kind, index, len });
    }
    Ok(chain.remove(index))
}

fn stage_from_record<T: ?Sized>(catalog: &Catalog<T>, record: &Record) -> Result<Stage<T>, SessionError> {
    let tag = match record.get(TYPE_TAG) {
        Some(serde_json::Value::String(tag)) => tag,
        Some(_) => {
            return Err(SessionError::Format {
                message: format!("{} of a {} must be a string", TYPE_TAG, catalog.kind()),
            })
        }
        None => {
            return Err(SessionError::Format {
                message: format!("{} record without {}", catalog.kind(), TYPE_TAG),
            })
        }
    };
    let def = catalog.find(tag).map_err(|_| SessionError::Format {
        message: format!("unknown {} type '{}'", catalog.kind(), tag),
    })?;

    let named = record
        .iter()
        .filter(|(key, _)| key.as_str() != TYPE_TAG)
        .map(|(key, value)| (key.clone(), Value::from_json(value.clone())))
        .collect();
    Ok(def.construct(ArgList::from_named(named))?)
}
