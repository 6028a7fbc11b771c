//! Backend process.
//!
//! Spawns the backend with piped standard streams and turns them into one
//! ordered stream of [`BackendEvent`]s:
//!
//! - stdout is forwarded in raw chunks; line framing is the session's job
//! - stderr is forwarded line by line for the console pane
//! - the exit code is sent once stdout has been drained, so no output is
//!   ever reported after the exit
//!
//! Writes to stdin come from an unbounded channel of encoded lines.

use std::process::Stdio;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    process::{Child, Command},
    sync::mpsc,
    task::AbortHandle,
};

use crate::RuntimeError;

/// Read size for backend stdout.
const READ_CHUNK: usize = 4096;

/// Exit code reported when the backend died without one (killed by a
/// signal, or its status could not be read).
const ABNORMAL_EXIT_CODE: i32 = 1;

/// How to start the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Executable path.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

/// Something the backend did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Bytes read from stdout.
    Output(Vec<u8>),
    /// One line written to stderr.
    Stderr(String),
    /// Process exited.
    Exited {
        /// Exit code.
        code: i32,
    },
}

/// Handle to a running backend.
///
/// Dropping the handle (or calling [`BackendHandle::stop`]) kills the
/// process.
#[derive(Debug)]
pub struct BackendHandle {
    /// Backend activity, in the order it happened.
    pub events: mpsc::UnboundedReceiver<BackendEvent>,
    abort_handles: Vec<AbortHandle>,
}

impl BackendHandle {
    /// Kill the backend and stop its I/O tasks.
    pub fn stop(&self) {
        for handle in &self.abort_handles {
            handle.abort();
        }
    }
}

impl Drop for BackendHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the backend.
///
/// `stdin` carries encoded protocol lines to write to the backend.
pub fn spawn(
    config: &BackendConfig,
    stdin: mpsc::UnboundedReceiver<String>,
) -> Result<BackendHandle, RuntimeError> {
    let mut child = Command::new(&config.program)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RuntimeError::Spawn { program: config.program.clone(), source })?;

    tracing::info!(program = %config.program, pid = child.id(), "backend started");

    let child_stdin = child.stdin.take().ok_or(RuntimeError::MissingPipe { stream: "stdin" })?;
    let child_stdout = child.stdout.take().ok_or(RuntimeError::MissingPipe { stream: "stdout" })?;
    let child_stderr = child.stderr.take().ok_or(RuntimeError::MissingPipe { stream: "stderr" })?;

    let (tx, events) = mpsc::unbounded_channel();

    let writer = tokio::spawn(write_stdin(child_stdin, stdin));
    let stderr = tokio::spawn(read_stderr(child_stderr, tx.clone()));
    let supervisor = tokio::spawn(supervise(child, child_stdout, tx));

    Ok(BackendHandle {
        events,
        abort_handles: vec![writer.abort_handle(), stderr.abort_handle(), supervisor.abort_handle()],
    })
}

/// Forward stdout until EOF, then report the exit code.
///
/// Owns the child: aborting this task drops it, which kills the process.
async fn supervise(
    mut child: Child,
    stdout: impl AsyncRead + Unpin,
    tx: mpsc::UnboundedSender<BackendEvent>,
) {
    read_stdout(stdout, &tx).await;

    let code = match child.wait().await {
        Ok(status) => status.code().unwrap_or(ABNORMAL_EXIT_CODE),
        Err(error) => {
            tracing::warn!(%error, "failed to read backend exit status");
            ABNORMAL_EXIT_CODE
        },
    };
    tracing::info!(code, "backend process ended");
    let _ = tx.send(BackendEvent::Exited { code });
}

async fn read_stdout(mut stdout: impl AsyncRead + Unpin, tx: &mpsc::UnboundedSender<BackendEvent>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(BackendEvent::Output(buf[..n].to_vec())).is_err() {
                    break;
                }
            },
            Err(error) => {
                tracing::warn!(%error, "backend stdout read failed");
                break;
            },
        }
    }
}

async fn read_stderr(stderr: impl AsyncRead + Unpin, tx: mpsc::UnboundedSender<BackendEvent>) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::debug!(target: "pqchat::backend", "{line}");
                if tx.send(BackendEvent::Stderr(line)).is_err() {
                    break;
                }
            },
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(%error, "backend stderr read failed");
                break;
            },
        }
    }
}

async fn write_stdin(mut stdin: impl AsyncWrite + Unpin, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        };
        if let Err(error) = written.await {
            tracing::warn!(%error, "backend stdin closed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> BackendConfig {
        BackendConfig { program: "sh".into(), args: vec!["-c".into(), script.into()] }
    }

    async fn collect(handle: &mut BackendHandle) -> (Vec<u8>, Vec<String>, Option<i32>) {
        let mut output = Vec::new();
        let mut stderr = Vec::new();
        while let Some(event) = handle.events.recv().await {
            match event {
                BackendEvent::Output(chunk) => output.extend(chunk),
                BackendEvent::Stderr(line) => stderr.push(line),
                BackendEvent::Exited { code } => return (output, stderr, Some(code)),
            }
        }
        (output, stderr, None)
    }

    #[tokio::test]
    async fn output_precedes_exit_code() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut handle = spawn(&shell("printf 'a\\nb\\n'; echo oops >&2; exit 7"), rx).unwrap();

        let (output, _, code) = collect(&mut handle).await;
        assert_eq!(output, b"a\nb\n");
        assert_eq!(code, Some(7));
    }

    #[tokio::test]
    async fn stdin_lines_reach_the_process() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handle = spawn(&shell("read line; echo \"got $line\""), rx).unwrap();

        tx.send("{\"type\":\"connect\",\"value\":\"\"}\n".to_string()).unwrap();
        let (output, _, code) = collect(&mut handle).await;

        assert_eq!(String::from_utf8_lossy(&output), "got {\"type\":\"connect\",\"value\":\"\"}\n");
        assert_eq!(code, Some(0));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let config = BackendConfig { program: "/nonexistent/pqchat-backend".into(), args: vec![] };
        assert!(matches!(spawn(&config, rx), Err(RuntimeError::Spawn { .. })));
    }
}
