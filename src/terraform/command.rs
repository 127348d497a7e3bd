//! Low-level execution of the provisioning tool

use shell_escape::escape;
use std::borrow::Cow;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

use crate::error::{Error, Result};

/// Timeout for collecting output from child process pipes after exit
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured size per stream (10MB)
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Longest line echoed to the debug log
const MAX_LOGGED_LINE: usize = 4096;

/// Lines of output quoted in a failure message
const MAX_ERROR_OUTPUT_LINES: usize = 50;

/// Environment every invocation runs with. Keeps the tool from prompting.
const AUTOMATION_ENV: &[(&str, &str)] = &[("TF_IN_AUTOMATION", "1"), ("TF_INPUT", "0")];

/// Captured result of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Convert a failed invocation into [`Error::ToolInvocation`].
    pub fn into_checked(self) -> Result<ToolOutput> {
        if self.success() {
            return Ok(self);
        }
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let mut stderr = tail_lines(source, MAX_ERROR_OUTPUT_LINES);
        if self.timed_out {
            stderr.push_str(&format!(
                "\n[process killed after {}s timeout]",
                self.duration.as_secs()
            ));
        }
        Err(Error::ToolInvocation {
            command: self.command,
            exit_code: self.exit_code,
            stderr,
        })
    }
}

/// Render a command line the way it could be pasted into a shell.
pub fn render_command(binary: &Path, args: &[String]) -> String {
    std::iter::once(binary.to_string_lossy().into_owned())
        .chain(args.iter().cloned())
        .map(|part| escape(Cow::Owned(part)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the tool with `args` in `working_dir`, killing it after `timeout`.
///
/// Spawn failures are returned as errors. Non-zero exits and timeouts are
/// not; callers decide via [`ToolOutput::into_checked`].
pub fn run_tool(
    binary: &Path,
    args: &[String],
    working_dir: &Path,
    timeout: Duration,
) -> Result<ToolOutput> {
    let command = render_command(binary, args);
    tracing::info!(dir = %working_dir.display(), "running {command}");

    let start = Instant::now();
    let mut child = spawn(binary, args, working_dir).map_err(|e| Error::ToolInvocation {
        command: command.clone(),
        exit_code: None,
        stderr: format!("failed to spawn: {e}"),
    })?;

    // Drain both pipes while waiting. Waiting first deadlocks once the
    // child fills the pipe buffer.
    let stdout_rx = drain(child.stdout.take(), "stdout");
    let stderr_rx = drain(child.stderr.take(), "stderr");

    let wait_result = child
        .wait_timeout(timeout)
        .map_err(|e| Error::ToolInvocation {
            command: command.clone(),
            exit_code: None,
            stderr: format!("failed to wait for process: {e}"),
        })?;

    let (exit_code, timed_out) = match wait_result {
        Some(status) => (status.code(), false),
        None => {
            tracing::warn!("{command} timed out after {}s, killing", timeout.as_secs());
            kill_child_process(&mut child);
            (None, true)
        }
    };
    let duration = start.elapsed();

    let stdout = stdout_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());
    let stderr = stderr_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());

    tracing::debug!(
        exit_code = ?exit_code,
        elapsed_ms = duration.as_millis() as u64,
        "{command} finished"
    );

    Ok(ToolOutput {
        command,
        exit_code,
        stdout,
        stderr,
        duration,
        timed_out,
    })
}

fn spawn(binary: &Path, args: &[String], working_dir: &Path) -> std::io::Result<Child> {
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .current_dir(working_dir)
        .envs(AUTOMATION_ENV.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd.spawn()
}

/// Read a pipe on its own thread, echoing each line to the debug log.
fn drain<R: Read + Send + 'static>(
    stream: Option<R>,
    label: &'static str,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_stream_to_string(stream, label));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

fn read_stream_to_string<R: Read>(mut stream: R, label: &str) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut lines = LineLogger::new(label);
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let data = &chunk[..n];
                lines.feed(data);
                // Past the limit the stream is still drained so the child never blocks
                if truncated {
                    continue;
                }
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&data[..to_copy]);
                if to_copy < n {
                    buf.extend_from_slice(b"\n[output truncated at 10MB]");
                    truncated = true;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => {
                if buf.is_empty() {
                    return "[error reading output]".to_string();
                }
                break;
            }
        }
    }
    lines.flush();

    String::from_utf8_lossy(&buf).to_string()
}

/// Echoes complete lines to the debug log, holding at most
/// `MAX_LOGGED_LINE` bytes of the current line.
struct LineLogger<'a> {
    label: &'a str,
    line: Vec<u8>,
    clipped: bool,
}

impl<'a> LineLogger<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            line: Vec::new(),
            clipped: false,
        }
    }

    fn feed(&mut self, mut data: &[u8]) {
        while let Some(pos) = data.iter().position(|&b| b == b'\n') {
            self.push(&data[..pos]);
            self.emit();
            data = &data[pos + 1..];
        }
        self.push(data);
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = MAX_LOGGED_LINE.saturating_sub(self.line.len());
        if bytes.len() > room {
            self.clipped = true;
        }
        self.line.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn emit(&mut self) {
        tracing::debug!(
            target: "infracheck::tool",
            "[{}] {}{}",
            self.label,
            String::from_utf8_lossy(&self.line).trim_end(),
            if self.clipped { " [line clipped]" } else { "" }
        );
        self.line.clear();
        self.clipped = false;
    }

    fn flush(&mut self) {
        if !self.line.is_empty() || self.clipped {
            self.emit();
        }
    }
}

fn kill_child_process(child: &mut Child) {
    // The process may already have exited
    let _ = child.kill();
    let _ = child.wait();
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
