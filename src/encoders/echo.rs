use crate::encoders::WinCmdEncoder;
use crate::stage::{Encoder, ParamSpec, Params, Preparation, StageError, StageType};

/// Echo the command through `cmd.exe` instead of running it.
///
/// Useful to preview what a chain produces on the far side.
#[derive(Debug, Clone, Default)]
pub struct EchoEncoder;

impl StageType for EchoEncoder {
    const NAME: &'static str = "EchoEncoder";
    const HELP: &'static str = "Echoes the command through cmd.exe instead of executing it.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Encoder for EchoEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        WinCmdEncoder::wrap(&format!("echo {}", command))
    }
}
