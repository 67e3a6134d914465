// Viewer process supervision: spawn, forward output, observe exit, kill on shutdown.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ERROR_LABEL, OUTPUT_DRAIN_GRACE_MS, STDERR_LABEL, STDOUT_LABEL};
use crate::error::{LaunchError, Result};

/// How supervision of the viewer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisionOutcome {
    /// The process exited on its own. `code` is `None` when it died from a signal.
    Exited { code: Option<i32> },
    /// A shutdown was requested; `kill_requested` tells whether a kill was sent.
    Shutdown { kill_requested: bool },
}

/// Full argument list for the runtime: `-jar <file>` then the descriptor arguments.
pub fn launch_args(file: &Path, arguments: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(arguments.len() + 2);
    args.push("-jar".into());
    args.push(file.as_os_str().to_os_string());
    args.extend(arguments.iter().map(OsString::from));
    args
}

/// Prefix `text` with `label`, aligning continuation lines under the label.
pub fn wrap_with_label(label: &str, text: &str) -> String {
    let indent = format!("\n{}", " ".repeat(label.len()));
    let body = text.trim_end_matches(['\r', '\n']).replace('\n', &indent);
    format!("{}{}", label, body)
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

pub struct SupervisedProcess {
    child: Child,
    running: Arc<AtomicBool>,
    last_output: Arc<Mutex<Option<String>>>,
    exit_code: Option<i32>,
    forwarders: Vec<JoinHandle<()>>,
    kill_requests: u32,
}

impl SupervisedProcess {
    /// Spawn `executable -jar <file> <arguments...>` with piped output.
    pub fn start(executable: &Path, file: &Path, arguments: &[String]) -> Result<Self> {
        info!("Starting Viewer...");
        let args = launch_args(file, arguments);
        debug!("spawning {} {:?}", executable.display(), args);

        let mut child = Command::new(executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: executable.to_path_buf(),
                source,
            })?;

        let running = Arc::new(AtomicBool::new(false));
        let last_output = Arc::new(Mutex::new(None));
        let mut forwarders = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            forwarders.push(tokio::spawn(forward_output(
                stdout,
                Stream::Stdout,
                Arc::clone(&running),
                Arc::clone(&last_output),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(tokio::spawn(forward_output(
                stderr,
                Stream::Stderr,
                Arc::clone(&running),
                Arc::clone(&last_output),
            )));
        }

        Ok(Self {
            child,
            running,
            last_output,
            exit_code: None,
            forwarders,
            kill_requests: 0,
        })
    }

    /// Whether the viewer has shown signs of life and not yet exited.
    ///
    /// Output or a process error sets the flag; a silent but alive viewer
    /// stays "not running".
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Most recent chunk of stdout or stderr text.
    pub fn last_output(&self) -> Option<String> {
        self.last_output.lock().clone()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Number of kill signals sent so far.
    pub fn kill_requests(&self) -> u32 {
        self.kill_requests
    }

    /// Send a kill to the viewer if it is marked running. Does not wait for exit.
    ///
    /// Returns whether a kill was issued.
    pub fn terminate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("Killing viewer process...");
        self.kill_requests += 1;
        if let Err(e) = self.child.start_kill() {
            warn!("kill viewer process failed: {}", e);
        }
        true
    }

    /// Observe the viewer until it exits or `cancel` fires.
    pub async fn supervise(&mut self, cancel: &CancellationToken) -> SupervisionOutcome {
        tokio::select! {
            status = self.child.wait() => match status {
                Ok(status) => {
                    self.drain_output(cancel).await;
                    let code = status.code();
                    self.exit_code = code;
                    self.running.store(false, Ordering::SeqCst);
                    match code {
                        Some(code) => info!("Viewer process exited with code {}", code),
                        None => info!("Viewer process exited by signal ({})", status),
                    }
                    SupervisionOutcome::Exited { code }
                }
                Err(e) => {
                    error!("{}", wrap_with_label(ERROR_LABEL, &e.to_string()));
                    self.running.store(true, Ordering::SeqCst);
                    // Exit can no longer be observed; only a shutdown ends supervision.
                    cancel.cancelled().await;
                    self.shutdown()
                }
            },
            _ = cancel.cancelled() => self.shutdown(),
        }
    }

    /// Let the forwarders flush what the viewer wrote before exiting.
    ///
    /// Bounded by [`OUTPUT_DRAIN_GRACE_MS`] and by `cancel`; forwarders still
    /// reading after that are aborted.
    async fn drain_output(&mut self, cancel: &CancellationToken) {
        let forwarders = std::mem::take(&mut self.forwarders);
        let aborts: Vec<_> = forwarders.iter().map(|f| f.abort_handle()).collect();
        let drain = async move {
            for forwarder in forwarders {
                let _ = forwarder.await;
            }
        };

        tokio::select! {
            res = tokio::time::timeout(Duration::from_millis(OUTPUT_DRAIN_GRACE_MS), drain) => {
                if res.is_err() {
                    debug!("viewer output still open after exit, detaching");
                }
            }
            _ = cancel.cancelled() => debug!("shutdown while draining viewer output"),
        }
        for abort in aborts {
            abort.abort();
        }
    }

    fn shutdown(&mut self) -> SupervisionOutcome {
        info!("Quitting!");
        let kill_requested = self.terminate();
        SupervisionOutcome::Shutdown { kill_requested }
    }
}

async fn forward_output<R>(
    mut pipe: R,
    stream: Stream,
    running: Arc<AtomicBool>,
    last_output: Arc<Mutex<Option<String>>>,
) where
    R: AsyncRead + Unpin,
{
    let emit = |text: String| {
        match stream {
            Stream::Stdout => info!("{}", wrap_with_label(STDOUT_LABEL, &text)),
            Stream::Stderr => warn!("{}", wrap_with_label(STDERR_LABEL, &text)),
        }
        *last_output.lock() = Some(text);
    };

    let mut buf = vec![0u8; 8 * 1024];
    let mut pending = Vec::new();
    loop {
        let n = match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!("viewer output pipe closed: {}", e);
                break;
            }
        };
        running.store(true, Ordering::SeqCst);
        pending.extend_from_slice(&buf[..n]);
        let text = decode_complete(&mut pending);
        if !text.is_empty() {
            emit(text);
        }
    }
    if !pending.is_empty() {
        emit(String::from_utf8_lossy(&pending).into_owned());
    }
}

/// Decode the longest complete UTF-8 prefix of `pending` and remove it.
///
/// A multibyte sequence cut off at the end stays in `pending` for the next
/// read. Invalid bytes become U+FFFD.
fn decode_complete(pending: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut start = 0;
    while start < pending.len() {
        match std::str::from_utf8(&pending[start..]) {
            Ok(valid) => {
                text.push_str(valid);
                start = pending.len();
            }
            Err(e) => {
                let end = start + e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[start..end]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        start = end + len;
                    }
                    None => {
                        start = end;
                        break;
                    }
                }
            }
        }
    }
    pending.drain(..start);
    text
}
