//! Integration tests for the pipeline executor and the runners.

mod common;

use cmdrunner::pipeline::{execute, PipelineError};
use cmdrunner::runners::RunError;
use common::*;
use std::time::{Duration, Instant};

// -- encoder fold order -------------------------------------------------------

/// Test that an empty chain with the echo runner returns the input unchanged.
#[test]
fn empty_chain_echo_is_identity() {
    let runner = runner("echo", "");
    for command in ["id", "ls -la | grep x", "", "multi\nline"] {
        let execution = execute(command, &runner, &[], &[], &fast_ctx()).unwrap();
        assert_eq!(execution.output, command);
        assert_eq!(execution.trace, vec![command.to_string()]);
        assert!(execution.warnings.is_empty());
    }
}

/// Test that the last pushed encoder wraps the command first.
#[test]
fn later_encoders_wrap_first() {
    let encoders = vec![encoder("xpcmdshell", ""), encoder("echo", "")];
    let execution = execute("whoami", &runner("echo", ""), &encoders, &[], &fast_ctx()).unwrap();

    assert_eq!(execution.trace[0], "cmd /S /C echo whoami");
    assert_eq!(execution.trace[1], "EXEC xp_cmdshell 'cmd /S /C echo whoami';");
    assert_eq!(execution.output, "EXEC xp_cmdshell 'cmd /S /C echo whoami';");
}

/// Test that the runner's own encoding is applied after the chain.
#[test]
fn runner_encoding_applies_last() {
    let (url, rx) = http_stub("ok");
    let runner = runner("web", &format!("'{}' 'c=***'", url));
    let encoders = vec![encoder("wincmd", "")];

    let execution = execute("a & b", &runner, &encoders, &[], &fast_ctx()).unwrap();

    assert_eq!(execution.trace, vec!["cmd /S /C a ^& b", "cmd+%2FS+%2FC+a+%5E%26+b"]);
    assert_eq!(execution.output, "ok");
    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(request.body, "c=cmd+%2FS+%2FC+a+%5E%26+b");
}

// -- decoders -----------------------------------------------------------------

/// Test that decoders unwind from the last index to the first.
#[test]
fn decoders_apply_in_reverse() {
    // "aGk=" is base64 for "hi"; "YUdrPQ==" is base64 for "aGk=".
    let decoders = vec![decoder("base64", ""), decoder("cmd", ""), decoder("base64", "")];
    let execution = execute("YUdrPQ==", &runner("echo", ""), &[], &decoders, &fast_ctx()).unwrap();
    assert_eq!(execution.output, "hi");
}

/// Test that a decoder failure aborts the execution.
#[test]
fn decoder_failure_is_an_error() {
    let decoders = vec![decoder("base64", "")];
    let err = execute("not base64!", &runner("echo", ""), &[], &decoders, &fast_ctx()).unwrap_err();
    assert!(matches!(err, PipelineError::Decode { ref decoder, .. } if decoder == "Base64Decoder"));
}

// -- bash runner --------------------------------------------------------------

/// Test that stdout and stderr are both captured.
#[cfg(unix)]
#[test]
fn bash_captures_stdout_and_stderr() {
    let runner = runner("bash", "");
    let execution = execute("echo out; echo err >&2", &runner, &[], &[], &fast_ctx()).unwrap();

    assert!(execution.output.contains("out\n"));
    assert!(execution.output.contains("err\n"));
    assert!(execution.warnings.is_empty());
}

/// Test that a long command is stopped at the timeout with a warning.
#[cfg(unix)]
#[test]
fn bash_timeout_returns_promptly() {
    let runner = runner("bash", "timeout=1");
    let started = Instant::now();

    let execution = execute("echo started; sleep 5; echo finished", &runner, &[], &[], &fast_ctx()).unwrap();

    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert!(execution.output.contains("started"));
    assert!(!execution.output.contains("finished"));
    assert_eq!(execution.warnings, vec!["Command timed out after 1s, output may be incomplete"]);
}

/// Test that background children are terminated with the group.
#[cfg(unix)]
#[test]
fn bash_timeout_kills_process_group() {
    let runner = runner("bash", "timeout=1");
    let started = Instant::now();

    let execution = execute("sleep 30 & sleep 30; echo never", &runner, &[], &[], &fast_ctx()).unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(!execution.output.contains("never"));
}

/// Test that a background process left holding the output pipe is
/// terminated once the shell exits.
#[cfg(target_os = "linux")]
#[test]
fn bash_background_process_released_after_exit() {
    let runner = runner("bash", "timeout=none");
    let started = Instant::now();

    let execution = execute("sleep 30 & echo $!; echo hi", &runner, &[], &[], &fast_ctx()).unwrap();

    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert!(execution.warnings.is_empty());
    let mut lines = execution.output.lines();
    let pid: u32 = lines.next().unwrap().trim().parse().unwrap();
    assert_eq!(lines.next(), Some("hi"));

    // Gone, or a zombie waiting for its new parent to reap it.
    let deadline = Instant::now() + Duration::from_secs(2);
    let alive = loop {
        let alive = match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => !stat.rsplit_once(") ").is_some_and(|(_, rest)| rest.starts_with('Z')),
            Err(_) => false,
        };
        if !alive || Instant::now() > deadline {
            break alive;
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(!alive, "background sleep {pid} survived the run");
}

/// Test that an interrupt stops the running command.
#[cfg(unix)]
#[test]
fn bash_interrupt_stops_command() {
    let runner = runner("bash", "timeout=none");
    let ctx = fast_ctx();
    let flag = ctx.interrupt_flag();
    let interrupter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    let started = Instant::now();
    let execution = execute("sleep 10", &runner, &[], &[], &ctx).unwrap();
    interrupter.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(execution.warnings, vec!["Command interrupted, output may be incomplete"]);
}

/// Test that a missing shell is a spawn error.
#[test]
fn bash_missing_shell_is_spawn_error() {
    let runner = runner("bash", "shell=/nonexistent/shell");
    let err = execute("id", &runner, &[], &[], &fast_ctx()).unwrap_err();
    assert!(matches!(err, PipelineError::Run(RunError::Spawn { .. })));
}

// -- web runner ---------------------------------------------------------------

/// Test the request the web runner sends.
#[test]
fn web_runner_posts_form_data() {
    let (url, rx) = http_stub("uid=0(root)\n");
    let runner = runner("web", &format!("url='{}' data='cmd=***&x=1'", url));

    let execution = execute("id -a", &runner, &[], &[], &fast_ctx()).unwrap();

    assert_eq!(execution.output, "uid=0(root)\n");
    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(request.head.starts_with("POST /exec HTTP/1.1"));
    assert!(request
        .head
        .to_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert_eq!(request.body, "cmd=id+-a&x=1");
}

/// Test that a refused connection is a run error.
#[test]
fn web_runner_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let runner = runner("web", &format!("'{}' '***' timeout=2", url));
    let err = execute("id", &runner, &[], &[], &fast_ctx()).unwrap_err();
    assert!(matches!(err, PipelineError::Run(RunError::Http { .. })));
}
