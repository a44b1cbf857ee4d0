//! Decoders: post-process captured output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::stage::{Decoder, ParamSpec, Params, StageError, StageType};

/// Errors raised while decoding output.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Output is not valid base64: {source}")]
    Base64 {
        #[source]
        source: base64::DecodeError,
    },
}

/// Pass-through decoder.
#[derive(Debug, Clone, Default)]
pub struct CmdDecoder;

impl StageType for CmdDecoder {
    const NAME: &'static str = "CmdDecoder";
    const HELP: &'static str = "Basic output decoder, returns the output as is.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Decoder for CmdDecoder {
    fn decode(&self, output: &str) -> Result<String, DecodeError> {
        Ok(output.to_string())
    }
}

/// Decode base64 output, e.g. from a command piped through `base64`.
#[derive(Debug, Clone, Default)]
pub struct Base64Decoder;

impl StageType for Base64Decoder {
    const NAME: &'static str = "Base64Decoder";
    const HELP: &'static str =
        "Decodes base64 output (whitespace ignored) and returns it as UTF-8 text.";
    const SCHEMA: &'static [ParamSpec] = &[];

    fn from_params(_params: &Params) -> Result<Self, StageError> {
        Ok(Self)
    }
}

impl Decoder for Base64Decoder {
    fn decode(&self, output: &str) -> Result<String, DecodeError> {
        let compact: String = output.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|source| DecodeError::Base64 { source })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
