//! Evidence sources
//!
//! Every probe reads the host through the `Evidence` trait: pseudo-files
//! under /proc and /sys, existence checks, and short helper commands.
//! `HostEvidence` reads the real system (optionally below another root,
//! e.g. a mounted image); `MemoryEvidence` replays a captured snapshot.

use crate::error::EvidenceError;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default bound on helper commands
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a running helper is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read-only view of the system being inspected.
///
/// Paths are absolute as seen from inside the inspected system.
pub trait Evidence {
    /// Read a whole file
    fn read_to_string(&self, path: &str) -> Result<String, EvidenceError>;

    /// Whether anything exists at `path`
    fn exists(&self, path: &str) -> bool;

    fn is_file(&self, path: &str) -> bool;

    fn is_dir(&self, path: &str) -> bool;

    /// Whether the directory at `path` has no entries
    fn dir_is_empty(&self, path: &str) -> Result<bool, EvidenceError>;

    /// Run a helper and capture stdout. Non-zero exit is an error.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError>;
}

/// Evidence from the live system
#[derive(Debug, Clone)]
pub struct HostEvidence {
    root: PathBuf,
    command_timeout: Duration,
    allow_commands: bool,
}

impl Default for HostEvidence {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEvidence {
    /// Inspect the running system
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            allow_commands: true,
        }
    }

    /// Inspect a filesystem tree mounted at `root`.
    ///
    /// Helper commands would describe the running host rather than the
    /// tree, so they are disabled unless `root` is `/`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let allow_commands = root == Path::new("/");
        Self {
            root,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            allow_commands,
        }
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn allow_commands(mut self, allow: bool) -> Self {
        self.allow_commands = allow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Evidence for HostEvidence {
    fn read_to_string(&self, path: &str) -> Result<String, EvidenceError> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|e| EvidenceError::from_io(path, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn is_file(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn dir_is_empty(&self, path: &str) -> Result<bool, EvidenceError> {
        let mut entries =
            std::fs::read_dir(self.resolve(path)).map_err(|e| EvidenceError::from_io(path, e))?;
        Ok(entries.next().is_none())
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError> {
        if !self.allow_commands {
            debug!("Skipping {} while inspecting {}", program, self.root.display());
            return Err(EvidenceError::CommandNotFound {
                program: program.to_string(),
            });
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EvidenceError::CommandNotFound {
                    program: program.to_string(),
                },
                _ => EvidenceError::from_io(program, e),
            })?;

        // Drain stdout on its own thread so a chatty helper cannot block on a full pipe
        let stdout = child.stdout.take();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(drain(stdout));
        });

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() >= self.command_timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EvidenceError::Timeout {
                        program: program.to_string(),
                        timeout: self.command_timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(EvidenceError::from_io(program, e)),
            }
        };

        debug!(
            "{} exited with {} after {}ms",
            program,
            status,
            start.elapsed().as_millis()
        );

        if !status.success() {
            return Err(EvidenceError::CommandFailed {
                program: program.to_string(),
                code: status.code(),
            });
        }

        // A background grandchild can hold stdout open after the helper exits
        let remaining = self.command_timeout.saturating_sub(start.elapsed());
        let output = match rx.recv_timeout(remaining) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(EvidenceError::from_io(program, e)),
            Err(RecvTimeoutError::Timeout) => {
                return Err(EvidenceError::Timeout {
                    program: program.to_string(),
                    timeout: self.command_timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Vec::new(),
        };

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

/// Read a helper's stdout to the end
fn drain<R: Read>(stdout: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut out) = stdout {
        out.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Captured command outcome for `MemoryEvidence`
#[derive(Debug, Clone)]
enum CommandOutcome {
    Output(String),
    Failed(Option<i32>),
    TimedOut,
}

/// Snapshot of system evidence held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryEvidence {
    files: BTreeMap<String, String>,
    unreadable: BTreeSet<String>,
    dirs: BTreeSet<String>,
    commands: BTreeMap<String, CommandOutcome>,
}

impl MemoryEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; its parent directories come into existence with it
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.add_parents(path);
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// Add a file that exists but cannot be read
    pub fn unreadable(mut self, path: &str) -> Self {
        self.add_parents(path);
        self.unreadable.insert(path.to_string());
        self
    }

    /// Add an empty directory
    pub fn dir(mut self, path: &str) -> Self {
        self.add_parents(path);
        self.dirs.insert(path.trim_end_matches('/').to_string());
        self
    }

    /// Register the stdout of `program args...`
    pub fn command(mut self, command_line: &str, stdout: &str) -> Self {
        self.commands
            .insert(command_line.to_string(), CommandOutcome::Output(stdout.to_string()));
        self
    }

    /// Register a command that exits with `code`
    pub fn failing_command(mut self, command_line: &str, code: i32) -> Self {
        self.commands
            .insert(command_line.to_string(), CommandOutcome::Failed(Some(code)));
        self
    }

    /// Register a command that never finishes in time
    pub fn hanging_command(mut self, command_line: &str) -> Self {
        self.commands
            .insert(command_line.to_string(), CommandOutcome::TimedOut);
        self
    }

    fn add_parents(&mut self, path: &str) {
        let mut current = Path::new(path).parent();
        while let Some(parent) = current {
            let text = parent.to_string_lossy();
            if text.is_empty() || text == "/" {
                break;
            }
            self.dirs.insert(text.into_owned());
            current = parent.parent();
        }
    }
}

impl Evidence for MemoryEvidence {
    fn read_to_string(&self, path: &str) -> Result<String, EvidenceError> {
        if self.unreadable.contains(path) {
            return Err(EvidenceError::PermissionDenied { path: path.into() });
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| EvidenceError::NotFound { path: path.into() })
    }

    fn exists(&self, path: &str) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.unreadable.contains(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path.trim_end_matches('/'))
    }

    fn dir_is_empty(&self, path: &str) -> Result<bool, EvidenceError> {
        let dir = path.trim_end_matches('/');
        if !self.dirs.contains(dir) {
            return Err(EvidenceError::NotFound { path: path.into() });
        }
        let prefix = format!("{}/", dir);
        let has_child = self
            .files
            .keys()
            .chain(self.unreadable.iter())
            .chain(self.dirs.iter())
            .any(|p| p.starts_with(&prefix));
        Ok(!has_child)
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        match self.commands.get(&command_line) {
            Some(CommandOutcome::Output(stdout)) => Ok(stdout.clone()),
            Some(CommandOutcome::Failed(code)) => Err(EvidenceError::CommandFailed {
                program: program.to_string(),
                code: *code,
            }),
            Some(CommandOutcome::TimedOut) => Err(EvidenceError::Timeout {
                program: program.to_string(),
                timeout: DEFAULT_COMMAND_TIMEOUT,
            }),
            None => Err(EvidenceError::CommandNotFound {
                program: program.to_string(),
            }),
        }
    }
}
