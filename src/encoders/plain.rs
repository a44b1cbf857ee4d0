use crate::stage::{Encoder, ParamSpec, Params, Preparation, StageError, StageType};

/// Pass-through encoder.
#[derive(Debug, Clone, Default)]
pub struct CmdEncoder;

impl StageType for CmdEncoder {
    const NAME: &'static str = "CmdEncoder";
    const HELP: &'static str = "Basic command encoder, returns the command as is.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Encoder for CmdEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        command.to_string()
    }
}
