use std::fmt;
use std::ops::Deref;

use crate::stage::{Decoder, Encoder, Params, Runner};

/// A stage type bound to one resolved set of parameter values.
#[derive(Debug)]
pub struct Stage<T: ?Sized> {
    name: &'static str,
    params: Params,
    inner: Box<T>,
}

pub type EncoderStage = Stage<dyn Encoder>;
pub type DecoderStage = Stage<dyn Decoder>;
pub type RunnerStage = Stage<dyn Runner>;

impl<T: ?Sized> Stage<T> {
    pub fn new(name: &'static str, params: Params, inner: Box<T>) -> Self {
        Self {
            name,
            params,
            inner,
        }
    }

    /// Registered type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Session record form: the type tag plus one field per parameter.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut record = serde_json::Map::new();
        record.insert(
            crate::pipeline::TYPE_TAG.to_string(),
            serde_json::Value::String(self.name.to_string()),
        );
        for (name, value) in self.params.iter() {
            record.insert(name.to_string(), value.to_json());
        }
        record
    }
}

impl<T: ?Sized> Deref for Stage<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> fmt::Display for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (name, value) in self.params.iter() {
            write!(f, "\n\t{}: {}", name, value)?;
        }
        Ok(())
    }
}
