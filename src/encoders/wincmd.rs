use crate::encoders::escape::cmd_escape;
use crate::stage::{Encoder, ParamSpec, Params, Preparation, StageError, StageType};

/// Wrap a command for `cmd.exe /S /C`, caret-escaping metacharacters.
#[derive(Debug, Clone, Default)]
pub struct WinCmdEncoder;

impl WinCmdEncoder {
    pub fn wrap(command: &str) -> String {
        format!("cmd /S /C {}", cmd_escape(command))
    }
}

impl StageType for WinCmdEncoder {
    const NAME: &'static str = "WinCmdEncoder";
    const HELP: &'static str =
        "Runs the command through cmd.exe /S /C, escaping ^ & > ( ) | with a caret.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Encoder for WinCmdEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        Self::wrap(command)
    }
}
