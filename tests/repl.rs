//! Integration tests for the interactive loop.

mod common;

use cmdrunner::config::ReplConfig;
use cmdrunner::pipeline::Session;
use cmdrunner::repl::{Flow, Repl};
use cmdrunner::stage::Registry;
use common::*;
use std::io::Cursor;
use tempfile::TempDir;

fn echo_repl() -> Repl {
    Repl::new(
        Registry::global(),
        ReplConfig::default(),
        fast_ctx(),
        Session::new(runner("echo", "")),
    )
}

/// Feed one line and return what was printed.
fn feed(repl: &mut Repl, line: &str) -> (Flow, String) {
    let mut out = Vec::new();
    let flow = repl.handle_line(line, &mut out).unwrap();
    (flow, String::from_utf8(out).unwrap())
}

// -- commands -----------------------------------------------------------------

/// Test that a pushed encoder wraps executed commands.
#[test]
fn push_then_execute() {
    let mut repl = echo_repl();

    let (_, out) = feed(&mut repl, "$push echo");
    assert!(out.contains("Encoder added at [0]"));

    let (flow, out) = feed(&mut repl, "whoami");
    assert_eq!(flow, Flow::Continue);
    assert!(out.contains("<<< cmd /S /C echo whoami"));
}

/// Test that the trace is printed only when enabled.
#[test]
fn show_stages_controls_trace() {
    let mut quiet = Repl::new(
        Registry::global(),
        ReplConfig {
            show_stages: false,
            ..ReplConfig::default()
        },
        fast_ctx(),
        Session::new(runner("echo", "")),
    );
    feed(&mut quiet, "$push wincmd");
    let (_, out) = feed(&mut quiet, "dir");
    assert_eq!(out, "<<< cmd /S /C dir\n");

    let mut verbose = echo_repl();
    feed(&mut verbose, "$push wincmd");
    let (_, out) = feed(&mut verbose, "dir");
    assert_eq!(out, "dir\ncmd /S /C dir\ncmd /S /C dir\n<<< cmd /S /C dir\n");
}

/// Test that errors are reported and leave the session unchanged.
#[test]
fn errors_keep_state() {
    let mut repl = echo_repl();
    feed(&mut repl, "$push ssh root host");

    let (flow, out) = feed(&mut repl, "$push nosuchencoder");
    assert_eq!(flow, Flow::Continue);
    assert!(out.starts_with("[!] 'nosuchencoder' is not a valid encoder"));

    let (_, out) = feed(&mut repl, "$pop 5");
    assert!(out.starts_with("[!] "));

    let (_, out) = feed(&mut repl, "$frobnicate");
    assert!(out.starts_with("[!] Unknown command"));

    assert_eq!(repl.session().encoders().len(), 1);
    assert_eq!(repl.session().encoders()[0].name(), "SSHEncoder");
}

/// Test that construction errors print the stage usage.
#[test]
fn construction_error_prints_usage() {
    let mut repl = echo_repl();
    let (_, out) = feed(&mut repl, "$push ssh onlyuser");

    assert!(out.starts_with("[!] SSHEncoder: missing required argument(s): host"));
    assert!(out.contains("\thost (text, required)"));
    assert!(repl.session().encoders().is_empty());
}

/// Test insertion by index and popping.
#[test]
fn push_at_index_and_pop() {
    let mut repl = echo_repl();
    feed(&mut repl, "$push_encoder wincmd");
    feed(&mut repl, "$push_encoder 0 xpcmdshell");

    let names: Vec<_> = repl.session().encoders().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["XpCmdShellEncoder", "WinCmdEncoder"]);

    let (_, out) = feed(&mut repl, "$pop 0");
    assert!(out.contains("Removed XpCmdShellEncoder"));
    feed(&mut repl, "$pop");
    assert!(repl.session().encoders().is_empty());

    let (_, out) = feed(&mut repl, "$pop");
    assert!(out.contains("[!] Cannot pop from an empty encoder list"));
}

/// Test decoder commands and runner replacement.
#[test]
fn decoders_and_runner() {
    let mut repl = echo_repl();
    feed(&mut repl, "$push_decoder base64");
    let (_, out) = feed(&mut repl, "aGVsbG8=");
    assert!(out.contains("<<< hello"));

    feed(&mut repl, "$pop_decoder");
    assert!(repl.session().decoders().is_empty());

    let (_, out) = feed(&mut repl, "$set_runner bash timeout=5");
    assert!(out.contains("Runner set to BashRunner"));
    assert_eq!(repl.session().runner().name(), "BashRunner");
}

/// Test that ambiguous prefixes list candidates.
#[test]
fn ambiguous_prefix() {
    let mut repl = echo_repl();
    let (_, out) = feed(&mut repl, "$list");
    assert!(out.contains("list_runners, list_encoders, list_decoders"));

    let (_, out) = feed(&mut repl, "$list_r");
    assert_eq!(out, "Runners:\n\tBashRunner\n\tEchoRunner\n\tWebRunner\n");
}

/// Test help output.
#[test]
fn help_output() {
    let mut repl = echo_repl();
    let (_, out) = feed(&mut repl, "help");
    assert!(out.contains("$push_encoder [index] <name> [args]"));
    assert!(out.contains("(aliases: exit, q)"));

    let (_, out) = feed(&mut repl, "$help wmic");
    assert!(out.starts_with("WmicEncoder\n"));

    let (_, out) = feed(&mut repl, "$help telnet");
    assert!(out.starts_with("[!] 'telnet' is not a known stage"));
}

/// Test quit with and without the marker.
#[test]
fn quit_variants() {
    for line in ["quit", "exit", "$q", "$exit", "$quit"] {
        let mut repl = echo_repl();
        let (flow, out) = feed(&mut repl, line);
        assert_eq!(flow, Flow::Quit, "{line}");
        assert_eq!(out, "Quitting...\n");
    }
}

/// Test saving and loading through commands.
#[test]
fn save_and_load_commands() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("s.json");
    let path_text = path.display().to_string();

    let mut repl = echo_repl();
    feed(&mut repl, "$push ssh root host");
    let (_, out) = feed(&mut repl, &format!("$save_session \"{}\"", path_text));
    assert!(out.contains("Session saved"));

    let mut other = echo_repl();
    let (_, out) = feed(&mut other, &format!("$load_session {}", path_text));
    assert!(out.starts_with("Runner:\n\tEchoRunner\n"));
    assert!(out.contains("Encoders:\n[0]: \tSSHEncoder\n\t\tusername: root"));
    assert_eq!(other.session().encoders()[0].name(), "SSHEncoder");

    let (_, out) = feed(&mut other, "$load_session");
    assert!(out.starts_with("[!] Usage: $load_session <path>"));
}

// -- loop ---------------------------------------------------------------------

/// Test a scripted loop with a here-document, ending at quit.
#[test]
fn run_loop_with_here_doc() {
    let mut repl = echo_repl();
    let input = Cursor::new("<<EOF\nline one\nline two\nEOF\n$quit\nnever executed\n");
    let mut out = Vec::new();

    repl.run(input, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("<<< line one\n<<< line two\n"));
    assert!(out.contains("... ... ... "));
    assert!(out.contains("Quitting..."));
    assert!(!out.contains("never executed"));
}

/// Test that the loop ends cleanly at EOF.
#[test]
fn run_loop_ends_at_eof() {
    let mut repl = echo_repl();
    let mut out = Vec::new();
    repl.run(Cursor::new("id\n"), &mut out).unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with(">>> "));
    assert!(out.contains("<<< id"));
}
