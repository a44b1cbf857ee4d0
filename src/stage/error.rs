use thiserror::Error;

use crate::args::ArgsError;
use crate::stage::{ParamType, StageKind};

/// Errors raised while looking up or constructing a stage.
#[derive(Debug, Error, PartialEq)]
pub enum StageError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error("'{name}' is not a valid {kind}")]
    Unknown { kind: StageKind, name: String },

    #[error("{stage}: missing required argument(s): {}", .names.join(", "))]
    MissingArguments { stage: String, names: Vec<String> },

    #[error("{stage}: takes at most {max} positional argument(s) but {given} were given")]
    TooManyArguments {
        stage: String,
        max: usize,
        given: usize,
    },

    #[error("{stage}: unexpected keyword argument '{name}'")]
    UnexpectedArgument { stage: String, name: String },

    #[error("{stage}: got multiple values for argument '{name}'")]
    DuplicateArgument { stage: String, name: String },

    #[error("{stage}: argument '{param}' expects {expected}, got {actual}")]
    ArgumentType {
        stage: String,
        param: String,
        expected: ParamType,
        actual: &'static str,
    },
}

impl StageError {
    /// True for errors caused by arguments not matching the stage schema,
    /// where showing the stage usage helps.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            StageError::MissingArguments { .. }
                | StageError::TooManyArguments { .. }
                | StageError::UnexpectedArgument { .. }
                | StageError::DuplicateArgument { .. }
                | StageError::ArgumentType { .. }
        )
    }
}
