//! Session command table and command-word resolution.

use crate::repl::ReplError;

/// A session command understood by the interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PushEncoder,
    PopEncoder,
    PushDecoder,
    PopDecoder,
    SetRunner,
    ListRunners,
    ListEncoders,
    ListDecoders,
    PrintSession,
    SaveSession,
    LoadSession,
    Help,
    Quit,
}

/// One entry of the command table.
#[derive(Debug)]
pub struct CommandDef {
    pub command: Command,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Argument synopsis, empty when the command takes none.
    pub args: &'static str,
    pub help: &'static str,
}

const COMMANDS: &[CommandDef] = &[
    // === Encoder chain ===
    CommandDef {
        command: Command::PushEncoder,
        name: "push_encoder",
        aliases: &["push"],
        args: "[index] <name> [args]",
        help: "Insert an encoder (default: append as the innermost wrapper)",
    },
    CommandDef {
        command: Command::PopEncoder,
        name: "pop_encoder",
        aliases: &["pop"],
        args: "[index]",
        help: "Remove an encoder (default: the last one)",
    },
    // === Decoder chain ===
    CommandDef {
        command: Command::PushDecoder,
        name: "push_decoder",
        aliases: &[],
        args: "[index] <name> [args]",
        help: "Insert a decoder (default: append)",
    },
    CommandDef {
        command: Command::PopDecoder,
        name: "pop_decoder",
        aliases: &[],
        args: "[index]",
        help: "Remove a decoder (default: the last one)",
    },
    // === Runner ===
    CommandDef {
        command: Command::SetRunner,
        name: "set_runner",
        aliases: &[],
        args: "<name> [args]",
        help: "Replace the runner",
    },
    // === Listings ===
    CommandDef {
        command: Command::ListRunners,
        name: "list_runners",
        aliases: &[],
        args: "",
        help: "List available runners",
    },
    CommandDef {
        command: Command::ListEncoders,
        name: "list_encoders",
        aliases: &[],
        args: "",
        help: "List available encoders",
    },
    CommandDef {
        command: Command::ListDecoders,
        name: "list_decoders",
        aliases: &[],
        args: "",
        help: "List available decoders",
    },
    // === Session ===
    CommandDef {
        command: Command::PrintSession,
        name: "print_session",
        aliases: &[],
        args: "",
        help: "Show the runner and both chains",
    },
    CommandDef {
        command: Command::SaveSession,
        name: "save_session",
        aliases: &[],
        args: "<path>",
        help: "Write the session to a JSON file",
    },
    CommandDef {
        command: Command::LoadSession,
        name: "load_session",
        aliases: &[],
        args: "<path>",
        help: "Replace the session with one read from a JSON file",
    },
    // === Misc ===
    CommandDef {
        command: Command::Help,
        name: "help",
        aliases: &[],
        args: "[stage]",
        help: "Show this help, or the usage of a stage",
    },
    CommandDef {
        command: Command::Quit,
        name: "quit",
        aliases: &["exit", "q"],
        args: "",
        help: "Leave cmdrunner",
    },
];

pub fn commands() -> &'static [CommandDef] {
    COMMANDS
}

/// Resolve a command word: exact name or alias first, then a unique prefix
/// of a command name.
pub fn resolve(word: &str) -> Result<&'static CommandDef, ReplError> {
    let word = word.to_lowercase();

    if let Some(def) = COMMANDS
        .iter()
        .find(|d| d.name == word || d.aliases.iter().any(|alias| *alias == word))
    {
        return Ok(def);
    }

    let candidates: Vec<&'static CommandDef> = COMMANDS
        .iter()
        .filter(|d| d.name.starts_with(&word))
        .collect();

    match candidates.as_slice() {
        [def] => Ok(*def),
        [] => Err(ReplError::UnknownCommand { word }),
        _ => Err(ReplError::AmbiguousCommand {
            word,
            candidates: candidates.iter().map(|d| d.name).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_aliases() {
        assert_eq!(resolve("push_encoder").unwrap().command, Command::PushEncoder);
        assert_eq!(resolve("push").unwrap().command, Command::PushEncoder);
        assert_eq!(resolve("pop").unwrap().command, Command::PopEncoder);
        assert_eq!(resolve("exit").unwrap().command, Command::Quit);
        assert_eq!(resolve("q").unwrap().command, Command::Quit);
    }

    #[test]
    fn resolves_unique_prefix() {
        assert_eq!(resolve("push_d").unwrap().command, Command::PushDecoder);
        assert_eq!(resolve("print").unwrap().command, Command::PrintSession);
        assert_eq!(resolve("h").unwrap().command, Command::Help);
        assert_eq!(resolve("SET").unwrap().command, Command::SetRunner);
    }

    #[test]
    fn ambiguous_prefix_lists_candidates() {
        match resolve("list").unwrap_err() {
            ReplError::AmbiguousCommand { candidates, .. } => {
                assert_eq!(candidates, vec!["list_runners", "list_encoders", "list_decoders"]);
            }
            other => panic!("Expected AmbiguousCommand, got {other:?}"),
        }
    }

    #[test]
    fn unknown_word_is_rejected() {
        assert!(matches!(resolve("frobnicate"), Err(ReplError::UnknownCommand { .. })));
    }
}
