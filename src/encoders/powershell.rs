use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::stage::{Encoder, ParamSpec, Params, Preparation, StageError, StageType};

/// Run the command as a PowerShell `-EncodedCommand`.
#[derive(Debug, Clone, Default)]
pub struct PowerShellEncoder;

impl PowerShellEncoder {
    /// Base64 of the UTF-16LE bytes, without a byte-order mark.
    pub fn encoded_command(command: &str) -> String {
        let bytes: Vec<u8> = command.encode_utf16().flat_map(u16::to_le_bytes).collect();
        STANDARD.encode(bytes)
    }
}

impl StageType for PowerShellEncoder {
    const NAME: &'static str = "PowerShellEncoder";
    const HELP: &'static str =
        "Runs the command in PowerShell, passed base64 encoded (UTF-16LE) via -EncodedCommand.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Encoder for PowerShellEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        format!(
            "powershell -NoProfile -ExecutionPolicy Bypass -EncodedCommand {}",
            Self::encoded_command(command)
        )
    }
}
