//! Blocking subprocess execution with a deadline.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sealpost_core::{RegistryError, RegistryResult};
use tracing::{debug, warn};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of one invocation.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) code: Option<i32>,
    pub(crate) success: bool,
}

impl ToolOutput {
    /// Turn a non-zero exit into [`RegistryError::ToolFailed`].
    pub(crate) fn ok_or_failed(self, operation: &str) -> RegistryResult<Self> {
        if self.success {
            return Ok(self);
        }
        Err(RegistryError::ToolFailed {
            operation: operation.to_owned(),
            code: self.code,
            stderr: self.stderr.trim().to_owned(),
        })
    }
}

/// Run `program` with `args`, feeding `stdin`, killing it after `timeout`.
///
/// Output pipes are drained on helper threads so a chatty child never
/// blocks on a full pipe while we wait for it.
pub(crate) fn run(
    program: &str,
    args: &[OsString],
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> RegistryResult<ToolOutput> {
    debug!(program, ?args, "running");
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RegistryError::Spawn {
            program: program.to_owned(),
            source,
        })?;

    let writer = match (stdin, child.stdin.take()) {
        (Some(data), Some(mut pipe)) => {
            let data = data.to_vec();
            Some(thread::spawn(move || pipe.write_all(&data)))
        },
        _ => None,
    };
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout, program)?;

    if let Some(handle) = writer {
        match handle.join() {
            Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(RegistryError::Io(e));
            },
            Ok(_) => {},
            Err(_) => return Err(RegistryError::Io(std::io::Error::other("stdin writer panicked"))),
        }
    }

    let stdout = collect(stdout)?;
    let stderr = collect(stderr)?;
    debug!(program, code = ?status.code(), "finished");

    Ok(ToolOutput {
        stdout,
        stderr,
        code: status.code(),
        success: status.success(),
    })
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
    program: &str,
) -> RegistryResult<std::process::ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= timeout {
            warn!(program, timeout_secs = timeout.as_secs(), "timed out, killing");
            // The child may have exited between try_wait and kill.
            let _ = child.kill();
            let _ = child.wait();
            return Err(RegistryError::ToolFailed {
                operation: program.to_owned(),
                code: None,
                stderr: format!("timed out after {}s", timeout.as_secs()),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> RegistryResult<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| RegistryError::Io(std::io::Error::other("output reader panicked")))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_captures_output_and_stdin() {
        let out = run("cat", &[], Some(b"hello"), Duration::from_secs(5)).unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "hello");
    }

    #[test]
    fn test_nonzero_exit_becomes_tool_failed() {
        let out = run("sh", &args(&["-c", "echo oops >&2; exit 3"]), None, Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.code, Some(3));
        match out.ok_or_failed("list") {
            Err(RegistryError::ToolFailed { operation, code, stderr }) => {
                assert_eq!(operation, "list");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let result = run("sleep", &args(&["5"]), None, Duration::from_millis(100));
        assert!(matches!(result, Err(RegistryError::ToolFailed { code: None, .. })));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = run("/nonexistent/gpg", &[], None, Duration::from_secs(1));
        assert!(matches!(result, Err(RegistryError::Spawn { .. })));
    }
}
