use crate::stage::{
    Encoder, ParamDefault, ParamSpec, ParamType, Params, Preparation, StageError, StageType,
};

/// Run the command on a remote host over `ssh`.
///
/// Host key checking is disabled and nothing is written to `known_hosts`, so
/// hops through throwaway hosts do not prompt.
#[derive(Debug, Clone)]
pub struct SshEncoder {
    username: String,
    host: String,
    identity: Option<String>,
}

impl SshEncoder {
    /// Escape for embedding inside a double-quoted remote command.
    fn escape(command: &str) -> String {
        command
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('|', "\\|")
    }
}

impl StageType for SshEncoder {
    const NAME: &'static str = "SSHEncoder";
    const HELP: &'static str = "Runs the command on a remote host over ssh.";
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("username", ParamType::Text, "Remote user name"),
        ParamSpec::required("host", ParamType::Text, "Remote host name or address"),
        ParamSpec::optional(
            "identity",
            ParamType::Text,
            ParamDefault::Null,
            "Private key file passed with -i",
        ),
    ];

    fn from_params(params: &Params) -> Result<Self, StageError> {
        Ok(Self {
            username: params.text("username")?,
            host: params.text("host")?,
            identity: params.opt_text("identity")?,
        })
    }
}

impl Encoder for SshEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        let mut options = Vec::new();
        if let Some(identity) = &self.identity {
            options.push(format!("-i {}", identity));
        }
        options.push("-o \"StrictHostKeyChecking no\"".to_string());
        options.push("-o \"UserKnownHostsFile /dev/null\"".to_string());

        format!(
            "ssh {} {}@{} \"{}\"",
            options.join(" "),
            self.username,
            self.host,
            Self::escape(command)
        )
    }
}
