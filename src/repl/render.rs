//! Text rendering for listings, help and the session overview.

use std::io::{self, Write};

use crate::pipeline::{Execution, Session};
use crate::repl::command::commands;
use crate::stage::{Catalog, Stage};

/// Prefix of every captured output line.
pub const OUTPUT_MARKER: &str = "<<< ";

pub fn write_catalog<T: ?Sized>(out: &mut impl Write, title: &str, catalog: &Catalog<T>) -> io::Result<()> {
    writeln!(out, "{}:", title)?;
    for name in catalog.names() {
        writeln!(out, "\t{}", name)?;
    }
    Ok(())
}

pub fn write_session(out: &mut impl Write, session: &Session) -> io::Result<()> {
    writeln!(out, "Runner:")?;
    writeln!(out, "{}", indent(session.runner()))?;
    write_chain(out, "Encoders", session.encoders())?;
    write_chain(out, "Decoders", session.decoders())
}

fn write_chain<T: ?Sized>(out: &mut impl Write, title: &str, chain: &[Stage<T>]) -> io::Result<()> {
    if chain.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}:", title)?;
    for (index, stage) in chain.iter().enumerate() {
        writeln!(out, "[{}]: {}", index, indent(stage))?;
    }
    Ok(())
}

fn indent<T: ?Sized>(stage: &Stage<T>) -> String {
    stage
        .to_string()
        .lines()
        .map(|line| format!("\t{}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_help(out: &mut impl Write, prefix: &str) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    for def in commands() {
        let mut synopsis = format!("{}{}", prefix, def.name);
        if !def.args.is_empty() {
            synopsis.push(' ');
            synopsis.push_str(def.args);
        }
        write!(out, "\t{:<40} {}", synopsis, def.help)?;
        if !def.aliases.is_empty() {
            write!(out, " (aliases: {})", def.aliases.join(", "))?;
        }
        writeln!(out)?;
    }
    writeln!(out, "\t{:<40} Multi-line command, ended by a line with TAG", "<<TAG")?;
    writeln!(out, "Any other line is run through the encoders and the runner.")
}

/// The encoding trace (when `show_stages`), warnings, then the output.
pub fn write_execution(
    out: &mut impl Write,
    command: &str,
    execution: &Execution,
    show_stages: bool,
) -> io::Result<()> {
    if show_stages {
        writeln!(out, "{}", command)?;
        for step in &execution.trace {
            writeln!(out, "{}", step)?;
        }
    }
    for warning in &execution.warnings {
        writeln!(out, "[!] {}", warning)?;
    }
    for line in execution.output.lines() {
        writeln!(out, "{}{}", OUTPUT_MARKER, line)?;
    }
    Ok(())
}
