//! Local shell runner.
//!
//! The command runs in its own process group so a timeout can terminate
//! everything it spawned, not only the shell. Background processes still
//! holding the output pipe after the shell exits are terminated the same
//! way. stdout and stderr share one
//! pipe, drained by a reader thread so a chatty command never blocks on a
//! full pipe while we poll.

use std::io::{self, PipeReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::runners::{RunContext, RunError, RunOutcome, StopReason};
use crate::stage::{ParamDefault, ParamSpec, ParamType, Params, Runner, StageError, StageType};

const READ_CHUNK: usize = 4096;
const SETTLE_STEP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct BashRunner {
    timeout: Option<u64>,
    shell: String,
}

impl StageType for BashRunner {
    const NAME: &'static str = "BashRunner";
    const HELP: &'static str = "Executes the command locally with `<shell> -c` and captures \
                                stdout and stderr.";
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::optional(
            "timeout",
            ParamType::Integer,
            ParamDefault::Int(30),
            "Seconds before the whole process group is terminated; none disables",
        )
        .nullable(),
        ParamSpec::optional(
            "shell",
            ParamType::Text,
            ParamDefault::Text("/bin/bash"),
            "Shell used to interpret the command",
        ),
    ];

    fn from_params(params: &Params) -> Result<Self, StageError> {
        Ok(Self {
            timeout: params.opt_unsigned("timeout")?,
            shell: params.text("shell")?,
        })
    }
}

impl Runner for BashRunner {
    fn run(&self, command: &str, ctx: &RunContext) -> Result<RunOutcome, RunError> {
        let (reader, writer) = io::pipe().map_err(|source| RunError::Pipe { source })?;
        let writer_err = writer.try_clone().map_err(|source| RunError::Pipe { source })?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            program: self.shell.clone(),
            source,
        })?;
        // Drop our copies of the write end, or the reader never sees EOF.
        drop(cmd);
        let pgid = child.id();
        info!(pid = pgid, shell = %self.shell, "Command started");

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let reader_handle = spawn_reader(reader, Arc::clone(&buffer))
            .map_err(|source| RunError::Pipe { source })?;

        let started = Instant::now();
        let limit = self.timeout.map(Duration::from_secs);
        let mut stopped = None;

        loop {
            let status = child.try_wait().map_err(|source| RunError::Wait {
                program: self.shell.clone(),
                source,
            })?;
            if let Some(status) = status {
                debug!(?status, elapsed_ms = started.elapsed().as_millis() as u64, "Command finished");
                break;
            }

            if ctx.is_interrupted() {
                stopped = Some(StopReason::Interrupted);
            } else if let Some(limit) = limit.filter(|limit| started.elapsed() > *limit) {
                stopped = Some(StopReason::TimedOut(limit));
            }
            if let Some(reason) = stopped {
                warn!(pid = child.id(), "{}, terminating process group", reason);
                terminate_group(&mut child, ctx.kill_grace);
                break;
            }

            thread::sleep(ctx.poll_interval);
        }

        if let Err(e) = child.wait() {
            debug!(error = %e, "Failed to reap command");
        }
        if let Some(handle) = settle_reader(reader_handle, ctx.kill_grace) {
            release_pipe(pgid, handle, ctx.kill_grace);
        }

        let output = String::from_utf8_lossy(&buffer.lock()).into_owned();
        Ok(RunOutcome { output, stopped })
    }
}

fn spawn_reader(mut reader: PipeReader, buffer: Arc<Mutex<Vec<u8>>>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("bash-output".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => buffer.lock().extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        })
}

/// Give the reader up to `grace` to drain the pipe. Returns the handle when
/// the pipe is still open at the deadline.
fn settle_reader(handle: JoinHandle<()>, grace: Duration) -> Option<JoinHandle<()>> {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(SETTLE_STEP);
    }
    if handle.is_finished() {
        let _ = handle.join();
        None
    } else {
        Some(handle)
    }
}

/// The shell is gone but processes it left in its group still hold the
/// output pipe. Terminate the group so the reader sees EOF.
#[cfg(unix)]
fn release_pipe(pgid: u32, handle: JoinHandle<()>, grace: Duration) {
    debug!(pgid, "Output pipe held after exit, terminating process group");
    signal_group(pgid, libc::SIGTERM);
    let Some(handle) = settle_reader(handle, grace) else {
        return;
    };

    warn!(pgid, "Background processes ignored SIGTERM, sending SIGKILL");
    signal_group(pgid, libc::SIGKILL);
    if settle_reader(handle, grace).is_some() {
        debug!(pgid, "Output pipe still open, detaching reader");
    }
}

#[cfg(not(unix))]
fn release_pipe(_pgid: u32, _handle: JoinHandle<()>, _grace: Duration) {
    debug!("Output pipe held after exit, detaching reader");
}

/// Send `signal` to the process group `pgid`. False if nothing received it.
#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int) -> bool {
    // SAFETY: killpg only sends a signal to the group created for the child.
    unsafe { libc::killpg(pgid as libc::pid_t, signal) == 0 }
}

#[cfg(unix)]
fn terminate_group(child: &mut Child, grace: Duration) {
    let pgid = child.id();
    if !signal_group(pgid, libc::SIGTERM) {
        let _ = child.kill();
        return;
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if matches!(child.try_wait(), Ok(Some(_))) {
            return;
        }
        thread::sleep(SETTLE_STEP);
    }

    warn!(pid = pgid, "Process group ignored SIGTERM, sending SIGKILL");
    signal_group(pgid, libc::SIGKILL);
}

#[cfg(not(unix))]
fn terminate_group(child: &mut Child, _grace: Duration) {
    let _ = child.kill();
}
