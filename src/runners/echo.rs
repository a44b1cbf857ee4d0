use crate::runners::{RunContext, RunError, RunOutcome};
use crate::stage::{ParamSpec, Params, Runner, StageError, StageType};

/// Dry-run runner: returns the fully encoded command instead of running it.
#[derive(Debug, Clone, Default)]
pub struct EchoRunner;

impl StageType for EchoRunner {
    const NAME: &'static str = "EchoRunner";
    const HELP: &'static str = "Echoes the provided command without actually running it.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Runner for EchoRunner {
    fn run(&self, command: &str, _ctx: &RunContext) -> Result<RunOutcome, RunError> {
        Ok(RunOutcome::completed(command))
    }
}
