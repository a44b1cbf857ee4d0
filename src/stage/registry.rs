//! Stage registry: single source of truth for all stage types.

use std::fmt;
use std::sync::OnceLock;

use crate::args::{self, ArgList};
use crate::decoders::{Base64Decoder, CmdDecoder};
use crate::encoders::{
    CmdEncoder, CurlEncoder, EchoEncoder, PowerShellEncoder, SshEncoder, WinCmdEncoder,
    WmicEncoder, XpCmdShellEncoder,
};
use crate::runners::{BashRunner, EchoRunner, WebRunner};
use crate::stage::{
    bind, Decoder, Encoder, ParamSpec, Params, Runner, Stage, StageError, StageKind, StageType,
};

/// A constructible stage type.
pub struct StageDef<T: ?Sized> {
    /// Registered type name (e.g. "SSHEncoder").
    pub name: &'static str,
    /// Human-readable description.
    pub help: &'static str,
    /// Ordered parameter schema.
    pub schema: &'static [ParamSpec],
    build: fn(&Params) -> Result<Box<T>, StageError>,
}

impl<T: ?Sized> fmt::Debug for StageDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDef")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> StageDef<T> {
    /// Bind `args` against the schema and build the stage.
    pub fn construct(&self, args: ArgList) -> Result<Stage<T>, StageError> {
        let params = bind(self.name, self.schema, args)?;
        let inner = (self.build)(&params)?;
        Ok(Stage::new(self.name, params, inner))
    }

    /// Help text followed by one line per parameter.
    pub fn usage(&self) -> String {
        let mut out = format!("{}\n\t{}", self.name, self.help);
        if self.schema.is_empty() {
            out.push_str("\n\t(no arguments)");
        }
        for spec in self.schema {
            let default = if spec.is_required() {
                "required".to_string()
            } else {
                format!("default {}", spec.default)
            };
            out.push_str(&format!(
                "\n\t{} ({}, {}): {}",
                spec.name, spec.ty, default, spec.description
            ));
        }
        out
    }
}

/// All registered stage types of one kind.
pub struct Catalog<T: ?Sized> {
    kind: StageKind,
    defs: Vec<StageDef<T>>,
}

impl<T: ?Sized> Catalog<T> {
    fn new(kind: StageKind, defs: Vec<StageDef<T>>) -> Self {
        Self { kind, defs }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Case-insensitive lookup of `name`, then `name` + kind suffix.
    pub fn find(&self, name: &str) -> Result<&StageDef<T>, StageError> {
        let wanted = name.to_lowercase();
        let suffixed = format!("{}{}", wanted, self.kind.suffix().to_lowercase());
        self.defs
            .iter()
            .find(|d| d.name.to_lowercase() == wanted)
            .or_else(|| self.defs.iter().find(|d| d.name.to_lowercase() == suffixed))
            .ok_or_else(|| StageError::Unknown {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Look up `name` and construct it from already parsed arguments.
    pub fn construct(&self, name: &str, args: ArgList) -> Result<Stage<T>, StageError> {
        self.find(name)?.construct(args)
    }

    /// Look up `name`, parse `arg_text` and construct the stage.
    pub fn build(&self, name: &str, arg_text: &str) -> Result<Stage<T>, StageError> {
        let def = self.find(name)?;
        let args = args::parse(arg_text)?;
        def.construct(args)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDef<T>> {
        self.defs.iter()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.defs.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names
    }
}

/// Process-wide registry of every encoder, decoder and runner type.
pub struct Registry {
    pub encoders: Catalog<dyn Encoder>,
    pub decoders: Catalog<dyn Decoder>,
    pub runners: Catalog<dyn Runner>,
}

impl Registry {
    /// The registry, built on first use and immutable afterwards.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::builtin)
    }

    fn builtin() -> Self {
        Self {
            encoders: Catalog::new(
                StageKind::Encoder,
                vec![
                    // === Plain / Windows shell ===
                    encoder::<CmdEncoder>(),
                    encoder::<WinCmdEncoder>(),
                    encoder::<EchoEncoder>(),
                    encoder::<PowerShellEncoder>(),
                    // === Remote hops ===
                    encoder::<SshEncoder>(),
                    encoder::<WmicEncoder>(),
                    encoder::<XpCmdShellEncoder>(),
                    // === Transports ===
                    encoder::<CurlEncoder>(),
                ],
            ),
            decoders: Catalog::new(
                StageKind::Decoder,
                vec![decoder::<CmdDecoder>(), decoder::<Base64Decoder>()],
            ),
            runners: Catalog::new(
                StageKind::Runner,
                vec![
                    runner::<BashRunner>(),
                    runner::<EchoRunner>(),
                    runner::<WebRunner>(),
                ],
            ),
        }
    }
}

fn encoder<E: StageType + Encoder + 'static>() -> StageDef<dyn Encoder> {
    StageDef {
        name: E::NAME,
        help: E::HELP,
        schema: E::SCHEMA,
        build: boxed_encoder::<E>,
    }
}

fn boxed_encoder<E: StageType + Encoder + 'static>(params: &Params) -> Result<Box<dyn Encoder>, StageError> {
    let stage: Box<dyn Encoder> = Box::new(E::from_params(params)?);
    Ok(stage)
}

fn decoder<D: StageType + Decoder + 'static>() -> StageDef<dyn Decoder> {
    StageDef {
        name: D::NAME,
        help: D::HELP,
        schema: D::SCHEMA,
        build: boxed_decoder::<D>,
    }
}

fn boxed_decoder<D: StageType + Decoder + 'static>(params: &Params) -> Result<Box<dyn Decoder>, StageError> {
    let stage: Box<dyn Decoder> = Box::new(D::from_params(params)?);
    Ok(stage)
}

fn runner<R: StageType + Runner + 'static>() -> StageDef<dyn Runner> {
    StageDef {
        name: R::NAME,
        help: R::HELP,
        schema: R::SCHEMA,
        build: boxed_runner::<R>,
    }
}

fn boxed_runner<R: StageType + Runner + 'static>(params: &Params) -> Result<Box<dyn Runner>, StageError> {
    let stage: Box<dyn Runner> = Box::new(R::from_params(params)?);
    Ok(stage)
}
