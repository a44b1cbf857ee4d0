//! Interactive loop.
//!
//! ```text
//! >>> $push ssh root 10.0.0.5        session command (marker + word + args)
//! >>> id                              anything else is executed
//! >>> <<EOF                           here-document, executed as one command
//! ... line one
//! ... EOF
//! ```
//!
//! Every error is reported as `[!] message` and leaves the session as it was.

pub mod command;
pub mod render;

use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::args;
use crate::config::ReplConfig;
use crate::pipeline::{PipelineError, Session, SessionError};
use crate::runners::RunContext;
use crate::stage::{Catalog, Registry, Stage, StageError};

use self::command::{resolve, Command};

/// Errors reported to the user by the interactive loop.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("Unknown command '{word}'")]
    UnknownCommand { word: String },

    #[error("Ambiguous command '{word}', candidates: {}", .candidates.join(", "))]
    AmbiguousCommand {
        word: String,
        candidates: Vec<&'static str>,
    },

    #[error("Usage: {synopsis}")]
    Usage { synopsis: String },

    #[error("'{value}' is not a valid index")]
    BadIndex { value: String },

    #[error("'{name}' is not a known stage")]
    UnknownStage { name: String },

    /// Stage lookup or construction failed; `usage` is shown when the
    /// arguments did not fit the stage.
    #[error("{source}")]
    Construct {
        #[source]
        source: StageError,
        usage: Option<String>,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-driven session editor and executor.
pub struct Repl {
    registry: &'static Registry,
    config: ReplConfig,
    ctx: RunContext,
    session: Session,
}

impl Repl {
    pub fn new(registry: &'static Registry, config: ReplConfig, ctx: RunContext, session: Session) -> Self {
        Self {
            registry,
            config,
            ctx,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read lines until EOF or a quit command.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        loop {
            write!(out, "{}", self.config.prompt)?;
            out.flush()?;

            let Some(line) = read_line(&mut input)? else {
                writeln!(out)?;
                return Ok(());
            };
            let line = line.trim();

            let flow = if let Some(tag) = line.strip_prefix("<<") {
                let body = self.read_here_doc(&mut input, out, tag.trim())?;
                self.report(out, |repl, out| repl.execute(&body, out))?
            } else {
                self.handle_line(line, out)?
            };

            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Handle one input line: a session command or a command to execute.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        if let Some(rest) = line.strip_prefix(self.config.command_prefix.as_str()) {
            let (word, args) = split_word(rest);
            return self.report(out, |repl, out| repl.dispatch(word, args, out));
        }

        let (word, args) = split_word(line);
        if matches!(word, "help" | "exit" | "quit") && (word == "help" || args.is_empty()) {
            return self.report(out, |repl, out| repl.dispatch(word, args, out));
        }

        self.report(out, |repl, out| repl.execute(line, out))
    }

    fn report<W: Write>(
        &mut self,
        out: &mut W,
        action: impl FnOnce(&mut Self, &mut W) -> Result<Flow, ReplError>,
    ) -> io::Result<Flow> {
        match action(self, out) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                writeln!(out, "[!] {}", e)?;
                if let ReplError::Construct { usage: Some(usage), .. } = &e {
                    writeln!(out, "{}", usage)?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn read_here_doc<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W, tag: &str) -> io::Result<String> {
        let mut lines = Vec::new();
        loop {
            write!(out, "{}", self.config.continuation_prompt)?;
            out.flush()?;
            match read_line(input)? {
                Some(line) if line.trim() != tag => lines.push(line),
                _ => break,
            }
        }
        Ok(lines.join("\n"))
    }

    fn execute<W: Write>(&mut self, command: &str, out: &mut W) -> Result<Flow, ReplError> {
        self.ctx.reset_interrupt();
        let execution = self.session.execute(command, &self.ctx)?;
        render::write_execution(out, command, &execution, self.config.show_stages)?;
        Ok(Flow::Continue)
    }

    fn dispatch<W: Write>(&mut self, word: &str, args: &str, out: &mut W) -> Result<Flow, ReplError> {
        let def = resolve(word)?;
        let registry = self.registry;
        let usage = || ReplError::Usage {
            synopsis: format!("{}{} {}", self.config.command_prefix, def.name, def.args),
        };
        debug!(command = def.name, "Session command");

        match def.command {
            Command::PushEncoder => {
                let (index, name, args) = split_push(args).ok_or_else(usage)??;
                let stage = build_stage(&registry.encoders, name, args)?;
                let index = self.session.push_encoder(index, stage)?;
                writeln!(out, "Encoder added at [{}]", index)?;
            }
            Command::PopEncoder => {
                let index = parse_index(args)?;
                let stage = self.session.pop_encoder(index)?;
                writeln!(out, "Removed {}", stage.name())?;
            }
            Command::PushDecoder => {
                let (index, name, args) = split_push(args).ok_or_else(usage)??;
                let stage = build_stage(&registry.decoders, name, args)?;
                let index = self.session.push_decoder(index, stage)?;
                writeln!(out, "Decoder added at [{}]", index)?;
            }
            Command::PopDecoder => {
                let index = parse_index(args)?;
                let stage = self.session.pop_decoder(index)?;
                writeln!(out, "Removed {}", stage.name())?;
            }
            Command::SetRunner => {
                let (name, args) = split_word(args);
                if name.is_empty() {
                    return Err(usage());
                }
                let stage = build_stage(&registry.runners, name, args)?;
                writeln!(out, "Runner set to {}", stage.name())?;
                self.session.set_runner(stage);
            }
            Command::ListRunners => render::write_catalog(out, "Runners", &registry.runners)?,
            Command::ListEncoders => render::write_catalog(out, "Encoders", &registry.encoders)?,
            Command::ListDecoders => render::write_catalog(out, "Decoders", &registry.decoders)?,
            Command::PrintSession => render::write_session(out, &self.session)?,
            Command::SaveSession => {
                let path = unquote(args).ok_or_else(usage)?;
                self.session.save(Path::new(path))?;
                writeln!(out, "Session saved to {}", path)?;
            }
            Command::LoadSession => {
                let path = unquote(args).ok_or_else(usage)?;
                self.session = Session::load(registry, Path::new(path))?;
                render::write_session(out, &self.session)?;
            }
            Command::Help => self.help(args, out)?,
            Command::Quit => {
                writeln!(out, "Quitting...")?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, stage: &str, out: &mut W) -> Result<(), ReplError> {
        let stage = stage.trim();
        if stage.is_empty() {
            render::write_help(out, &self.config.command_prefix)?;
            return Ok(());
        }

        let registry = self.registry;
        let usage = registry
            .encoders
            .find(stage)
            .map(|d| d.usage())
            .or_else(|_| registry.decoders.find(stage).map(|d| d.usage()))
            .or_else(|_| registry.runners.find(stage).map(|d| d.usage()))
            .map_err(|_| ReplError::UnknownStage {
                name: stage.to_string(),
            })?;
        writeln!(out, "{}", usage)?;
        Ok(())
    }
}

fn build_stage<T: ?Sized>(catalog: &Catalog<T>, name: &str, arg_text: &str) -> Result<Stage<T>, ReplError> {
    let def = catalog
        .find(name)
        .map_err(|source| ReplError::Construct { source, usage: None })?;
    let construct = |source: StageError| ReplError::Construct {
        source,
        usage: Some(def.usage()),
    };
    let args = args::parse(arg_text).map_err(|e| construct(e.into()))?;
    def.construct(args).map_err(construct)
}

fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// First whitespace-separated word and the trimmed remainder.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

type PushArgs<'a> = (Option<usize>, &'a str, &'a str);

/// `[index] <name> [args]`. `None` when the name is missing.
fn split_push(text: &str) -> Option<Result<PushArgs<'_>, ReplError>> {
    let (first, rest) = split_word(text);
    if first.is_empty() {
        return None;
    }
    if !first.chars().all(|c| c.is_ascii_digit()) {
        return Some(Ok((None, first, rest)));
    }

    let index = match first.parse() {
        Ok(index) => index,
        Err(_) => {
            return Some(Err(ReplError::BadIndex {
                value: first.to_string(),
            }))
        }
    };
    let (name, args) = split_word(rest);
    if name.is_empty() {
        return None;
    }
    Some(Ok((Some(index), name, args)))
}

fn parse_index(text: &str) -> Result<Option<usize>, ReplError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| ReplError::BadIndex {
        value: text.to_string(),
    })
}

/// A path argument, optionally wrapped in matching quotes.
fn unquote(text: &str) -> Option<&str> {
    let text = text.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| text.strip_prefix(*q).and_then(|t| t.strip_suffix(*q)))
        .unwrap_or(text);
    (!unquoted.is_empty()).then_some(unquoted)
}
