//! WMIC remote process creation with output captured through an
//! administrative share.
//!
//! WMIC does not return the output of the process it creates, so with
//! `output` enabled the encoded command:
//!
//! ```text
//! mkdir \\host\C$\<dir>
//!   && wmic ... process call create "cmd /S /C (<cmd>) > C:\<dir>\<file>.log" >nul
//!   && ping -n <delay> 127.0.0.1 >nul
//!   && type \\host\C$\<dir>\<file>.log
//!   && rmdir /S /Q \\host\C$\<dir>
//! ```
//!
//! The wait must cover every WMIC hop nested inside this one, hence the
//! prepare pass sums the delays of all later stages.

use rand::Rng;

use crate::encoders::escape::escape_double_quotes;
use crate::encoders::WinCmdEncoder;
use crate::stage::{
    Encoder, EncoderStage, ParamDefault, ParamSpec, ParamType, Params, Preparation, StageError,
    StageType,
};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct WmicEncoder {
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    delay: u64,
    output: bool,
}

impl WmicEncoder {
    fn wmic_call(&self, remote: &str) -> String {
        let mut parts = vec!["wmic".to_string()];
        if let Some(host) = &self.host {
            parts.push(format!("/NODE:\"{}\"", host));
            if let Some(username) = &self.username {
                parts.push(format!("/User:\"{}\"", username));
            }
            if let Some(password) = &self.password {
                parts.push(format!("/Password:\"{}\"", password));
            }
        }
        parts.push(format!("process call create \"{}\"", remote));
        parts.join(" ")
    }

    fn capture(&self, command: &str, prep: &Preparation, tmp_dir: &str, tmp_file: &str) -> String {
        let host = self.host.as_deref().unwrap_or("localhost");
        let tmp_path = format!("{}\\{}.log", tmp_dir, tmp_file);
        let redirected = format!("({}) > C:\\{}", command, tmp_path);

        // Only two levels of nesting are handled: the first instance hands
        // its command to cmd unescaped, every later one caret-escapes it.
        let remote = if prep.first_of_type {
            format!("cmd /S /C {}", redirected)
        } else {
            WinCmdEncoder::wrap(&redirected)
        };
        let remote = escape_double_quotes(&remote);
        let delay = prep.total_delay.unwrap_or(self.delay);

        [
            format!("mkdir \\\\{}\\C$\\{}", host, tmp_dir),
            format!("{} >nul", self.wmic_call(&remote)),
            format!("ping -n {} 127.0.0.1 >nul", delay),
            format!("type \\\\{}\\C$\\{}", host, tmp_path),
            format!("rmdir /S /Q \\\\{}\\C$\\{}", host, tmp_dir),
        ]
        .join(" && ")
    }
}

fn random_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

impl StageType for WmicEncoder {
    const NAME: &'static str = "WmicEncoder";
    const HELP: &'static str = "Creates the command as a process through WMIC and, with output \
                                enabled, reads its output back over the C$ share.";
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::optional(
            "host",
            ParamType::Text,
            ParamDefault::Null,
            "Remote node; localhost without credentials when unset",
        ),
        ParamSpec::optional("username", ParamType::Text, ParamDefault::Null, "Remote user"),
        ParamSpec::optional("password", ParamType::Text, ParamDefault::Null, "Remote password"),
        ParamSpec::optional(
            "delay",
            ParamType::Integer,
            ParamDefault::Int(2),
            "Seconds to wait for the process before reading its output",
        ),
        ParamSpec::optional(
            "output",
            ParamType::Boolean,
            ParamDefault::Bool(true),
            "Capture the output through a temporary file",
        ),
    ];

    fn from_params(params: &Params) -> Result<Self, StageError> {
        Ok(Self {
            host: params.opt_text("host")?,
            username: params.opt_text("username")?,
            password: params.opt_text("password")?,
            delay: params.unsigned("delay")?,
            output: params.boolean("output")?,
        })
    }
}

impl Encoder for WmicEncoder {
    fn prepare(&self, index: usize, chain: &[EncoderStage]) -> Preparation {
        let later: u64 = chain.iter().skip(index + 1).filter_map(|s| s.delay()).sum();
        let name = chain.get(index).map_or(Self::NAME, |s| s.name());
        let same_type = chain.iter().take(index + 1).filter(|s| s.name() == name).count();

        Preparation {
            total_delay: Some(self.delay + later),
            first_of_type: same_type == 1,
        }
    }

    fn encode(&self, command: &str, prep: &Preparation) -> String {
        if !self.output {
            return self.wmic_call(&escape_double_quotes(command));
        }
        self.capture(command, prep, &random_id(), &random_id())
    }

    fn delay(&self) -> Option<u64> {
        Some(self.delay)
    }
}
