use crate::stage::{Encoder, ParamSpec, Params, Preparation, StageError, StageType};

/// Run the command through the SQL Server `xp_cmdshell` stored procedure.
#[derive(Debug, Clone, Default)]
pub struct XpCmdShellEncoder;

impl StageType for XpCmdShellEncoder {
    const NAME: &'static str = "XpCmdShellEncoder";
    const HELP: &'static str =
        "Runs the command in a Microsoft SQL Server xp_cmdshell stored procedure.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Encoder for XpCmdShellEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        format!("EXEC xp_cmdshell '{}';", command.replace('\'', "''"))
    }
}
